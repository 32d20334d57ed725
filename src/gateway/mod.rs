//! Every outbound platform action goes through [`ActionGateway`].
//!
//! The gateway resolves the channel, consults the guard, performs the call,
//! and appends history only after the platform confirmed the action.

pub mod http;
pub mod platform;
pub mod scan;
pub mod verification;

use crate::config::{ActionKind, PlatformConfig, PlatformsFile};
use crate::error::PlatformError;
use crate::guard::{check_rate_limit, fingerprint, is_duplicate, recently_engaged};
use crate::llm::http_client::build_client_with_timeout;
use crate::storage::{ActionHistoryRecord, HistoryKind, HistoryStore};
use chrono::{DateTime, TimeDelta, Utc};
use http::HttpPlatform;
use std::path::{Path, PathBuf};

pub use platform::{CreatedItem, FeedItem, Platform, PostDraft, VerificationChallenge};
pub use scan::{CommentWriter, ScanSettings, scan_and_engage};

const HISTORY_UNREADABLE: &str = "history unreadable, action blocked";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SkipReason {
    #[strum(serialize = "channel unavailable")]
    ChannelUnavailable,
    #[strum(serialize = "rate limited")]
    RateLimited,
    #[strum(serialize = "duplicate content")]
    Duplicate,
    #[strum(serialize = "already engaged")]
    AlreadyEngaged,
}

/// Result of a gateway call. Skips are policy outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    Completed(T),
    Skipped(SkipReason),
    Failed(String),
}

impl<T> ActionOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

pub struct ActionGateway {
    platforms_path: PathBuf,
    history: HistoryStore,
    client: reqwest::Client,
    target_cooldown: TimeDelta,
}

impl ActionGateway {
    pub fn new(state_dir: &Path, timeout_secs: u64, target_cooldown_days: i64) -> Self {
        Self {
            platforms_path: state_dir.join("platforms.json"),
            history: HistoryStore::new(state_dir),
            client: build_client_with_timeout(timeout_secs),
            target_cooldown: TimeDelta::try_days(target_cooldown_days).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn target_cooldown(&self) -> TimeDelta {
        self.target_cooldown
    }

    /// Fresh read of the platform file; edits apply on the next call.
    fn resolve(&self, channel: &str) -> Option<PlatformConfig> {
        let resolved = PlatformsFile::load_or_empty(&self.platforms_path)
            .enabled(channel)
            .cloned();
        if resolved.is_none() {
            tracing::info!(channel, "channel not configured or disabled, skipping");
        }
        resolved
    }

    /// `preferred` when it is enabled, otherwise the first enabled channel.
    pub fn default_channel(&self, preferred: Option<&str>) -> Option<String> {
        let file = PlatformsFile::load_or_empty(&self.platforms_path);
        preferred
            .and_then(|name| file.enabled(name))
            .or_else(|| file.first_enabled())
            .map(|platform| platform.name.clone())
    }

    /// The agent's own account name on `channel`.
    pub fn username(&self, channel: &str) -> Option<String> {
        PlatformsFile::load_or_empty(&self.platforms_path)
            .enabled(channel)
            .and_then(|platform| platform.username.clone())
    }

    fn connect(&self, config: &PlatformConfig) -> HttpPlatform {
        HttpPlatform::new(config, self.client.clone())
    }

    pub async fn publish(
        &self,
        channel: &str,
        draft: &PostDraft,
        now: DateTime<Utc>,
    ) -> ActionOutcome<ActionHistoryRecord> {
        let Some(config) = self.resolve(channel) else {
            return ActionOutcome::Skipped(SkipReason::ChannelUnavailable);
        };

        let Some(posts) = self.checked_history(channel, HistoryKind::Posts) else {
            return ActionOutcome::Failed(HISTORY_UNREADABLE.to_string());
        };
        let limit = config.rate_limits.for_kind(ActionKind::Post);
        if !check_rate_limit(limit, &posts, &config.name, now) {
            tracing::info!(channel, quota = limit.count, "post rate limit reached, skipping");
            return ActionOutcome::Skipped(SkipReason::RateLimited);
        }
        if is_duplicate(&posts, &config.name, &draft.title, &draft.content, now) {
            tracing::info!(channel, title = draft.title.as_str(), "duplicate post, skipping");
            return ActionOutcome::Skipped(SkipReason::Duplicate);
        }

        let platform = self.connect(&config);
        let created = match platform.create_post(draft).await {
            Ok(created) => created,
            Err(error) => return failed(channel, "publish", &error),
        };
        if let Err(error) = verify(&platform, &created).await {
            return failed(channel, "publish verification", &error);
        }

        let record = ActionHistoryRecord {
            id: created.id,
            channel: config.name.clone(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            fingerprint: fingerprint(&draft.content),
            timestamp: now,
            url: created.url,
            target_id: None,
        };
        self.record(HistoryKind::Posts, &record);
        tracing::info!(channel, id = record.id.as_str(), "published post");
        ActionOutcome::Completed(record)
    }

    pub async fn comment(
        &self,
        channel: &str,
        target: &FeedItem,
        body: &str,
        now: DateTime<Utc>,
    ) -> ActionOutcome<ActionHistoryRecord> {
        let Some(config) = self.resolve(channel) else {
            return ActionOutcome::Skipped(SkipReason::ChannelUnavailable);
        };

        let Some(engagements) = self.checked_history(channel, HistoryKind::Engagements) else {
            return ActionOutcome::Failed(HISTORY_UNREADABLE.to_string());
        };
        let limit = config.rate_limits.for_kind(ActionKind::Comment);
        if !check_rate_limit(limit, &engagements, &config.name, now) {
            tracing::info!(channel, quota = limit.count, "comment rate limit reached, skipping");
            return ActionOutcome::Skipped(SkipReason::RateLimited);
        }
        if recently_engaged(
            &engagements,
            &config.name,
            &target.id,
            self.target_cooldown,
            now,
        ) {
            tracing::info!(channel, target = target.id.as_str(), "already engaged, skipping");
            return ActionOutcome::Skipped(SkipReason::AlreadyEngaged);
        }
        if is_duplicate(&engagements, &config.name, "", body, now) {
            tracing::info!(channel, target = target.id.as_str(), "duplicate comment, skipping");
            return ActionOutcome::Skipped(SkipReason::Duplicate);
        }

        let platform = self.connect(&config);
        let created = match platform.create_comment(&target.id, body).await {
            Ok(created) => created,
            Err(error) => return failed(channel, "comment", &error),
        };
        if let Err(error) = verify(&platform, &created).await {
            return failed(channel, "comment verification", &error);
        }

        let record = ActionHistoryRecord {
            id: created.id,
            channel: config.name.clone(),
            title: format!("Re: {}", target.title),
            content: body.to_string(),
            fingerprint: fingerprint(body),
            timestamp: now,
            url: created.url,
            target_id: Some(target.id.clone()),
        };
        self.record(HistoryKind::Engagements, &record);
        tracing::info!(channel, target = target.id.as_str(), "commented");
        ActionOutcome::Completed(record)
    }

    pub async fn fetch_feed(
        &self,
        channel: &str,
        sort: &str,
        limit: u32,
    ) -> ActionOutcome<Vec<FeedItem>> {
        let Some(config) = self.resolve(channel) else {
            return ActionOutcome::Skipped(SkipReason::ChannelUnavailable);
        };
        match self.connect(&config).list_posts(sort, limit).await {
            Ok(items) => ActionOutcome::Completed(items),
            Err(error) => failed(channel, "feed fetch", &error),
        }
    }

    /// History for the guard. Unreadable history blocks the write.
    fn checked_history(
        &self,
        channel: &str,
        kind: HistoryKind,
    ) -> Option<Vec<ActionHistoryRecord>> {
        match self.history.load_checked(kind) {
            Ok(records) => Some(records),
            Err(error) => {
                tracing::error!(
                    channel,
                    %kind,
                    path = %self.history.path(kind).display(),
                    "history unreadable, blocking write until repaired: {error:#}"
                );
                None
            }
        }
    }

    fn record(&self, kind: HistoryKind, record: &ActionHistoryRecord) {
        if let Err(error) = self.history.append(kind, record.clone()) {
            tracing::error!(%kind, id = record.id.as_str(), "history append failed: {error:#}");
        }
    }
}

async fn verify(platform: &HttpPlatform, created: &CreatedItem) -> Result<(), PlatformError> {
    let Some(challenge) = &created.verification else {
        return Ok(());
    };
    let answer = verification::solve_challenge(&challenge.challenge).ok_or_else(|| {
        PlatformError::Verification {
            platform: platform.name().to_string(),
            message: format!("could not solve challenge: {}", challenge.challenge),
        }
    })?;
    platform.submit_verification(&challenge.code, &answer).await
}

fn failed<T>(channel: &str, action: &str, error: &PlatformError) -> ActionOutcome<T> {
    match error.retry_after_secs() {
        Some(secs) => tracing::warn!(channel, retry_after_secs = secs, "{action} failed: {error}"),
        None => tracing::warn!(channel, "{action} failed: {error}"),
    }
    ActionOutcome::Failed(error.to_string())
}
