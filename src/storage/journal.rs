use super::atomic::{load_json_or_default, write_json_atomic};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub const MAX_ACTION_LOG: usize = 100;
pub const MAX_LEARNINGS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action_type: String,
    pub reasoning: String,
    pub result: String,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LearningSource {
    /// Proposed alongside a decision.
    Oracle,
    Reflection,
    ActivitySnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub posts_24h: usize,
    pub engagements_24h: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningEntry {
    pub timestamp: DateTime<Utc>,
    pub source: LearningSource,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ActivitySnapshot>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GoalPriority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub priority: GoalPriority,
    /// Percentage, 0..=100.
    pub progress: u8,
    #[serde(default)]
    pub subtasks: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        description: impl Into<String>,
        priority: GoalPriority,
        subtasks: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            priority,
            progress: 0,
            subtasks,
            created_at,
        }
    }
}

/// Decision outcomes, learnings and goals.
///
/// Loaded with the agent state and written back at the end of each heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    pub action_log: VecDeque<ActionLogEntry>,
    pub learnings: VecDeque<LearningEntry>,
    pub goals: Vec<Goal>,
}

impl Journal {
    pub fn log_action(&mut self, entry: ActionLogEntry) {
        self.action_log.push_back(entry);
        while self.action_log.len() > MAX_ACTION_LOG {
            self.action_log.pop_front();
        }
    }

    pub fn add_learning(&mut self, entry: LearningEntry) {
        self.learnings.push_back(entry);
        while self.learnings.len() > MAX_LEARNINGS {
            self.learnings.pop_front();
        }
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    pub fn recent_actions(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.action_log
            .iter()
            .skip(self.action_log.len().saturating_sub(count))
    }
}

pub struct JournalStore {
    dir: PathBuf,
}

impl JournalStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.to_path_buf(),
        }
    }

    fn action_log_path(&self) -> PathBuf {
        self.dir.join("action_log.json")
    }

    fn learnings_path(&self) -> PathBuf {
        self.dir.join("learnings.json")
    }

    fn goals_path(&self) -> PathBuf {
        self.dir.join("goals.json")
    }

    pub fn load(&self) -> Journal {
        let mut journal = Journal {
            action_log: load_json_or_default(&self.action_log_path()),
            learnings: load_json_or_default(&self.learnings_path()),
            goals: load_json_or_default(&self.goals_path()),
        };
        // Files edited by hand may exceed the caps.
        while journal.action_log.len() > MAX_ACTION_LOG {
            journal.action_log.pop_front();
        }
        while journal.learnings.len() > MAX_LEARNINGS {
            journal.learnings.pop_front();
        }
        journal
    }

    pub fn save(&self, journal: &Journal) -> Result<()> {
        write_json_atomic(&self.action_log_path(), &journal.action_log)?;
        write_json_atomic(&self.learnings_path(), &journal.learnings)?;
        write_json_atomic(&self.goals_path(), &journal.goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap()
    }

    fn action(index: usize) -> ActionLogEntry {
        ActionLogEntry {
            timestamp: now(),
            action_type: "engage".into(),
            reasoning: String::new(),
            result: format!("result {index}"),
            success: true,
        }
    }

    fn learning(index: usize) -> LearningEntry {
        LearningEntry {
            timestamp: now(),
            source: LearningSource::Oracle,
            text: format!("learning {index}"),
            snapshot: None,
        }
    }

    #[test]
    fn action_log_keeps_most_recent_hundred() {
        let mut journal = Journal::default();
        for index in 0..130 {
            journal.log_action(action(index));
        }

        assert_eq!(journal.action_log.len(), MAX_ACTION_LOG);
        assert_eq!(journal.action_log.front().unwrap().result, "result 30");
        assert_eq!(journal.action_log.back().unwrap().result, "result 129");
    }

    #[test]
    fn learnings_keep_most_recent_fifty() {
        let mut journal = Journal::default();
        for index in 0..75 {
            journal.add_learning(learning(index));
        }

        assert_eq!(journal.learnings.len(), MAX_LEARNINGS);
        assert_eq!(journal.learnings.front().unwrap().text, "learning 25");
    }

    #[test]
    fn recent_actions_returns_tail_in_order() {
        let mut journal = Journal::default();
        for index in 0..5 {
            journal.log_action(action(index));
        }

        let tail: Vec<_> = journal.recent_actions(2).map(|a| a.result.as_str()).collect();
        assert_eq!(tail, vec!["result 3", "result 4"]);
    }

    #[test]
    fn journal_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let store = JournalStore::new(tmp.path());
        let mut journal = Journal::default();
        journal.log_action(action(1));
        journal.add_learning(LearningEntry {
            snapshot: Some(ActivitySnapshot {
                posts_24h: 1,
                engagements_24h: 4,
            }),
            source: LearningSource::ActivitySnapshot,
            ..learning(1)
        });
        journal.add_goal(Goal::new(
            "Grow the reading list audience",
            GoalPriority::High,
            vec!["post weekly".into()],
            now(),
        ));

        store.save(&journal).unwrap();
        assert_eq!(store.load(), journal);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<GoalPriority>().unwrap(), GoalPriority::High);
        assert!("urgent".parse::<GoalPriority>().is_err());
    }
}
