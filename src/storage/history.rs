use super::atomic::{load_json, load_json_or_default, write_json_atomic};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One successful outbound action, as the platform confirmed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHistoryRecord {
    pub id: String,
    pub channel: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Post the engagement replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryKind {
    Posts,
    Engagements,
}

impl HistoryKind {
    fn file_name(self) -> &'static str {
        match self {
            Self::Posts => "post_history.json",
            Self::Engagements => "engagement_history.json",
        }
    }
}

/// Append-only history files, read whole for every guard check.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.to_path_buf(),
        }
    }

    pub fn path(&self, kind: HistoryKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn load(&self, kind: HistoryKind) -> Vec<ActionHistoryRecord> {
        load_json_or_default(&self.path(kind))
    }

    /// Strict read for write paths. Unlike [`Self::load`], a corrupt file is
    /// an error and stays on disk untouched.
    pub fn load_checked(&self, kind: HistoryKind) -> Result<Vec<ActionHistoryRecord>> {
        Ok(load_json(&self.path(kind))?.unwrap_or_default())
    }

    pub fn append(&self, kind: HistoryKind, record: ActionHistoryRecord) -> Result<()> {
        let mut records = self.load_checked(kind)?;
        records.push(record);
        write_json_atomic(&self.path(kind), &records)
    }

    /// Records in `kind` newer than `since`, across every channel.
    pub fn count_since(&self, kind: HistoryKind, since: DateTime<Utc>) -> usize {
        self.load(kind)
            .iter()
            .filter(|record| record.timestamp > since)
            .count()
    }
}
