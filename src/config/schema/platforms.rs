use crate::error::ConfigError;
use crate::storage::atomic::{load_json, write_json_atomic};
use anyhow::Context;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::schedule::minutes_to_delta;

/// Outbound actions that carry a per-channel quota.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    Post,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub count: u32,
    pub window_minutes: u64,
}

impl RateLimit {
    pub const fn new(count: u32, window_minutes: u64) -> Self {
        Self {
            count,
            window_minutes,
        }
    }

    pub fn window(&self) -> TimeDelta {
        minutes_to_delta(self.window_minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default = "default_post_limit")]
    pub post: RateLimit,
    #[serde(default = "default_comment_limit")]
    pub comment: RateLimit,
}

fn default_post_limit() -> RateLimit {
    RateLimit::new(1, 30)
}

fn default_comment_limit() -> RateLimit {
    RateLimit::new(50, 60)
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            post: default_post_limit(),
            comment: default_comment_limit(),
        }
    }
}

impl RateLimits {
    pub fn for_kind(&self, kind: ActionKind) -> RateLimit {
        match kind {
            ActionKind::Post => self.post,
            ActionKind::Comment => self.comment,
        }
    }
}

/// One external channel the agent can publish to or read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The agent's own account name, used to skip self-authored feed items.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub rate_limits: RateLimits,
}

fn default_enabled() -> bool {
    true
}

impl PlatformConfig {
    pub fn new(name: &str, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            enabled: true,
            username: None,
            rate_limits: RateLimits::default(),
        }
    }
}

/// The on-disk platform registry written by `herald init`.
///
/// Read fresh on every gateway call so edits apply without a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformsFile {
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
}

impl PlatformsFile {
    /// Strict load for startup gating: parse errors are reported.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Ok(load_json::<Self>(path)?.unwrap_or_default())
    }

    /// Soft load for the gateway: any failure means "no channels".
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(file) => file,
            Err(error) => {
                tracing::warn!(path = %path.display(), "platform config unreadable: {error:#}");
                Self::default()
            }
        }
    }

    /// Startup gate for `run` and `once`: the registry must parse and hold at
    /// least one enabled platform.
    pub fn require_enabled(path: &Path) -> anyhow::Result<Self> {
        let file = Self::load(path)
            .with_context(|| format!("failed reading platform config {}", path.display()))?;
        if !file.has_enabled() {
            return Err(ConfigError::NoPlatform(path.display().to_string()).into());
        }
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        write_json_atomic(path, self)
    }

    pub fn enabled(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms
            .iter()
            .find(|platform| platform.enabled && platform.name.eq_ignore_ascii_case(name))
    }

    pub fn first_enabled(&self) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|platform| platform.enabled)
    }

    pub fn has_enabled(&self) -> bool {
        self.first_enabled().is_some()
    }

    /// Insert or replace the entry with the same name.
    pub fn upsert(&mut self, platform: PlatformConfig) {
        if let Some(existing) = self
            .platforms
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&platform.name))
        {
            *existing = platform;
        } else {
            self.platforms.push(platform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn startup_gate_needs_an_enabled_platform() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("platforms.json");

        let missing = PlatformsFile::require_enabled(&path).unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoPlatform(_))
        ));

        let mut file = PlatformsFile::default();
        let mut disabled = PlatformConfig::new("moltbook", "http://a", None);
        disabled.enabled = false;
        file.upsert(disabled);
        file.save(&path).unwrap();
        assert!(PlatformsFile::require_enabled(&path).is_err());

        file.upsert(PlatformConfig::new("moltbook", "http://a", None));
        file.save(&path).unwrap();
        assert_eq!(PlatformsFile::require_enabled(&path).unwrap(), file);
    }

    #[test]
    fn startup_gate_reports_corrupt_registry() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("platforms.json");
        std::fs::write(&path, "{ platforms: ").unwrap();

        assert!(PlatformsFile::require_enabled(&path).is_err());
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let file = PlatformsFile::load(&tmp.path().join("platforms.json")).unwrap();
        assert!(file.platforms.is_empty());
        assert!(!file.has_enabled());
    }

    #[test]
    fn corrupt_file_fails_strict_but_not_soft_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("platforms.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(PlatformsFile::load(&path).is_err());
        assert!(PlatformsFile::load_or_empty(&path).platforms.is_empty());
    }

    #[test]
    fn upsert_replaces_by_name() {
        let mut file = PlatformsFile::default();
        file.upsert(PlatformConfig::new("moltbook", "https://a.example/", None));
        file.upsert(PlatformConfig::new(
            "Moltbook",
            "https://b.example",
            Some("key".into()),
        ));

        assert_eq!(file.platforms.len(), 1);
        assert_eq!(file.platforms[0].base_url, "https://b.example");
        assert_eq!(file.platforms[0].api_key.as_deref(), Some("key"));
    }

    #[test]
    fn disabled_platforms_are_not_resolved() {
        let mut platform = PlatformConfig::new("moltbook", "https://a.example", None);
        platform.enabled = false;
        let file = PlatformsFile {
            platforms: vec![platform],
        };

        assert!(file.enabled("moltbook").is_none());
        assert!(!file.has_enabled());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state").join("platforms.json");
        let mut file = PlatformsFile::default();
        let mut platform = PlatformConfig::new("moltbook", "https://a.example", Some("k".into()));
        platform.rate_limits.post = RateLimit::new(2, 60);
        file.upsert(platform);

        file.save(&path).unwrap();
        assert_eq!(PlatformsFile::load(&path).unwrap(), file);
    }

    #[test]
    fn rate_limits_default_when_omitted() {
        let parsed: PlatformConfig =
            serde_json::from_str(r#"{"name":"m","base_url":"https://m.example"}"#).unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.rate_limits, RateLimits::default());
        assert_eq!(
            parsed.rate_limits.for_kind(ActionKind::Post).window(),
            TimeDelta::minutes(30)
        );
    }
}
