use super::super::{
    ContentConfig, EngagementConfig, ObservabilityConfig, ScheduleConfig, SelfImprovementConfig,
    ToolsConfig,
};
use anyhow::Result;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    pub api_key: Option<String>,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub default_temperature: f64,
    /// Overrides the provider's default chat-completions base URL.
    #[serde(default)]
    pub oracle_base_url: Option<String>,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub engagement: EngagementConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub self_improvement: SelfImprovementConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_oracle_retries")]
    pub oracle_retries: u32,
    #[serde(default = "default_oracle_backoff_ms")]
    pub oracle_backoff_ms: u64,
    /// Providers tried in order once the default one gives up.
    #[serde(default)]
    pub fallback_providers: Vec<String>,
    /// Applies to every outbound HTTP call, oracle and platforms alike.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_oracle_retries() -> u32 {
    2
}

fn default_oracle_backoff_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            oracle_retries: default_oracle_retries(),
            oracle_backoff_ms: default_oracle_backoff_ms(),
            fallback_providers: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    pub interval_minutes: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
        }
    }
}

impl HeartbeatConfig {
    pub fn period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let herald_dir = home.join(".herald");

        Self {
            workspace_dir: herald_dir.join("workspace"),
            config_path: herald_dir.join("config.toml"),
            api_key: None,
            default_provider: Some("openrouter".to_string()),
            default_model: Some("anthropic/claude-sonnet-4-20250514".to_string()),
            default_temperature: 0.7,
            oracle_base_url: None,
            heartbeat: HeartbeatConfig::default(),
            schedule: ScheduleConfig::default(),
            engagement: EngagementConfig::default(),
            content: ContentConfig::default(),
            reliability: ReliabilityConfig::default(),
            self_improvement: SelfImprovementConfig::default(),
            tools: ToolsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Directory holding every persisted JSON file.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace_dir.join("state")
    }

    pub fn platforms_path(&self) -> PathBuf {
        self.state_dir().join("platforms.json")
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            anyhow::bail!(
                "default_temperature must be within 0.0..=2.0, got {}",
                self.default_temperature
            );
        }
        if self.heartbeat.interval_minutes == 0 {
            anyhow::bail!("heartbeat.interval_minutes must be greater than zero");
        }
        self.schedule.validate()
    }
}
