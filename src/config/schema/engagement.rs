use serde::{Deserialize, Serialize};

/// Feed scan and proactive commenting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Lowercase keywords an item must mention to be worth a comment.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: u32,
    #[serde(default = "default_max_per_scan")]
    pub max_per_scan: usize,
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    #[serde(default = "default_target_cooldown_days")]
    pub target_cooldown_days: i64,
}

fn default_topics() -> Vec<String> {
    ["writing", "books", "fiction", "author", "publishing", "ai"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_feed_limit() -> u32 {
    25
}

fn default_max_per_scan() -> usize {
    3
}

fn default_pause_secs() -> u64 {
    20
}

fn default_target_cooldown_days() -> i64 {
    7
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            feed_limit: default_feed_limit(),
            max_per_scan: default_max_per_scan(),
            pause_secs: default_pause_secs(),
            target_cooldown_days: default_target_cooldown_days(),
        }
    }
}

/// What the agent publishes and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Channel used for posts and scans; first enabled platform when unset.
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    /// Research topics, rotated so each is used once before any repeats.
    #[serde(default = "default_research_topics")]
    pub research_topics: Vec<String>,
}

fn default_category() -> String {
    "general".into()
}

fn default_research_topics() -> Vec<String> {
    [
        "how autonomous agents decide what to post",
        "what readers want from science fiction about AI",
        "lessons from running a daily publishing schedule",
        "building community around independent books",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            channel: None,
            category: default_category(),
            research_topics: default_research_topics(),
        }
    }
}

/// Activity floors checked by the self-improvement pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfImprovementConfig {
    #[serde(default = "default_min_posts_per_day")]
    pub min_posts_per_day: usize,
    #[serde(default = "default_min_engagements_per_day")]
    pub min_engagements_per_day: usize,
}

fn default_min_posts_per_day() -> usize {
    1
}

fn default_min_engagements_per_day() -> usize {
    3
}

impl Default for SelfImprovementConfig {
    fn default() -> Self {
        Self {
            min_posts_per_day: default_min_posts_per_day(),
            min_engagements_per_day: default_min_engagements_per_day(),
        }
    }
}
