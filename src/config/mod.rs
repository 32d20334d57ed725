pub mod schema;

pub use schema::{
    ActionKind, Config, ContentConfig, EngagementConfig, HeartbeatConfig, ObservabilityConfig,
    PlatformConfig, PlatformsFile, RateLimit, RateLimits, ReliabilityConfig, ScheduleConfig,
    ScriptEntry, SelfImprovementConfig, TaskCategory, ToolsConfig,
};
