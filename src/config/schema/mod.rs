mod core;
mod engagement;
mod observability;
mod platforms;
mod schedule;
mod tools;

pub use core::{Config, HeartbeatConfig, ReliabilityConfig};
pub use engagement::{ContentConfig, EngagementConfig, SelfImprovementConfig};
pub use observability::ObservabilityConfig;
pub use platforms::{ActionKind, PlatformConfig, PlatformsFile, RateLimit, RateLimits};
pub(crate) use schedule::minutes_to_delta;
pub use schedule::{ScheduleConfig, TaskCategory};
pub use tools::{ScriptEntry, ToolsConfig};
