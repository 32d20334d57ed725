use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Recurring task types, each gated by its own interval.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskCategory {
    /// Research post on the next content topic.
    Post,
    /// Feed scan plus proactive comments.
    Engagement,
    /// Collaboration invite post.
    Collaboration,
    /// Reflection that rewrites the current strategy.
    Strategy,
    /// External analysis scripts.
    Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_post_interval_minutes")]
    pub post_interval_minutes: u64,
    #[serde(default = "default_engagement_interval_minutes")]
    pub engagement_interval_minutes: u64,
    #[serde(default = "default_collaboration_interval_minutes")]
    pub collaboration_interval_minutes: u64,
    #[serde(default = "default_strategy_interval_minutes")]
    pub strategy_interval_minutes: u64,
    #[serde(default = "default_analysis_interval_minutes")]
    pub analysis_interval_minutes: u64,
    /// Run the self-improvement snapshot every N heartbeats.
    #[serde(default = "default_self_improvement_every")]
    pub self_improvement_every: u64,
    /// Emit a status report every M heartbeats.
    #[serde(default = "default_report_every")]
    pub report_every: u64,
}

fn default_post_interval_minutes() -> u64 {
    4 * 60
}

fn default_engagement_interval_minutes() -> u64 {
    60
}

fn default_collaboration_interval_minutes() -> u64 {
    24 * 60
}

fn default_strategy_interval_minutes() -> u64 {
    24 * 60
}

fn default_analysis_interval_minutes() -> u64 {
    12 * 60
}

fn default_self_improvement_every() -> u64 {
    6
}

fn default_report_every() -> u64 {
    12
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            post_interval_minutes: default_post_interval_minutes(),
            engagement_interval_minutes: default_engagement_interval_minutes(),
            collaboration_interval_minutes: default_collaboration_interval_minutes(),
            strategy_interval_minutes: default_strategy_interval_minutes(),
            analysis_interval_minutes: default_analysis_interval_minutes(),
            self_improvement_every: default_self_improvement_every(),
            report_every: default_report_every(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval_minutes(&self, category: TaskCategory) -> u64 {
        match category {
            TaskCategory::Post => self.post_interval_minutes,
            TaskCategory::Engagement => self.engagement_interval_minutes,
            TaskCategory::Collaboration => self.collaboration_interval_minutes,
            TaskCategory::Strategy => self.strategy_interval_minutes,
            TaskCategory::Analysis => self.analysis_interval_minutes,
        }
    }

    pub fn interval(&self, category: TaskCategory) -> TimeDelta {
        minutes_to_delta(self.interval_minutes(category))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.self_improvement_every == 0 {
            anyhow::bail!("schedule.self_improvement_every must be at least 1");
        }
        if self.report_every == 0 {
            anyhow::bail!("schedule.report_every must be at least 1");
        }
        Ok(())
    }
}

pub(crate) fn minutes_to_delta(minutes: u64) -> TimeDelta {
    i64::try_from(minutes)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .unwrap_or(TimeDelta::MAX)
}
