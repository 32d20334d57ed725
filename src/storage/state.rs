use super::atomic::{load_json, write_json_atomic};
use crate::config::TaskCategory;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub const MAX_RECENT_ERRORS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Everything the agent remembers between heartbeats.
///
/// The only source of truth for "has category X run recently". Sets and maps
/// are ordered so the persisted file is stable across saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default)]
    pub last_run_by_category: BTreeMap<TaskCategory, Option<DateTime<Utc>>>,
    #[serde(default)]
    pub current_strategy: String,
    #[serde(default)]
    pub cycle_count: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub counters_by_kind: BTreeMap<String, u64>,
    #[serde(default)]
    pub dedupe_keys: BTreeSet<String>,
    #[serde(default)]
    pub recent_errors: VecDeque<ErrorEntry>,
}

impl AgentState {
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut state = Self {
            last_run_by_category: BTreeMap::new(),
            current_strategy: String::new(),
            cycle_count: 0,
            started_at: now,
            counters_by_kind: BTreeMap::new(),
            dedupe_keys: BTreeSet::new(),
            recent_errors: VecDeque::new(),
        };
        state.fill_categories();
        state
    }

    fn fill_categories(&mut self) {
        for category in TaskCategory::iter() {
            self.last_run_by_category.entry(category).or_insert(None);
        }
    }

    pub fn last_run(&self, category: TaskCategory) -> Option<DateTime<Utc>> {
        self.last_run_by_category.get(&category).copied().flatten()
    }

    pub fn mark_ran(&mut self, category: TaskCategory, at: DateTime<Utc>) {
        self.last_run_by_category.insert(category, Some(at));
    }

    pub fn increment_counter(&mut self, kind: &str) {
        *self.counters_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn counter(&self, kind: &str) -> u64 {
        self.counters_by_kind.get(kind).copied().unwrap_or(0)
    }

    /// Append to the bounded error log, evicting the oldest entries.
    pub fn record_error(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.recent_errors.push_back(ErrorEntry {
            timestamp: at,
            message: message.into(),
        });
        while self.recent_errors.len() > MAX_RECENT_ERRORS {
            self.recent_errors.pop_front();
        }
    }

    /// Pick the first candidate not yet consumed under `namespace` and mark it.
    ///
    /// Once every candidate is consumed the namespace is cleared and rotation
    /// starts over from the first one.
    pub fn take_unconsumed(&mut self, namespace: &str, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        let key_for = |candidate: &str| format!("{namespace}:{candidate}");

        let next = candidates
            .iter()
            .find(|candidate| !self.dedupe_keys.contains(&key_for(candidate)));

        let chosen = if let Some(candidate) = next {
            candidate.clone()
        } else {
            let prefix = format!("{namespace}:");
            self.dedupe_keys.retain(|key| !key.starts_with(&prefix));
            candidates[0].clone()
        };

        self.dedupe_keys.insert(key_for(&chosen));
        Some(chosen)
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("agent_state.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: an absent or corrupt file yields fresh defaults.
    pub fn load(&self, now: DateTime<Utc>) -> AgentState {
        match load_json::<AgentState>(&self.path) {
            Ok(Some(mut state)) => {
                state.fill_categories();
                state
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no agent state yet, starting fresh");
                AgentState::new(now)
            }
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "agent state unreadable, resetting to defaults: {error:#}"
                );
                AgentState::new(now)
            }
        }
    }

    pub fn save(&self, state: &AgentState) -> Result<()> {
        write_json_atomic(&self.path, state)
    }
}
