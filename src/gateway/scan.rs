use super::platform::FeedItem;
use super::{ActionGateway, ActionOutcome, SkipReason};
use crate::clock::{Clock, Sleeper};
use crate::guard::recently_engaged;
use crate::storage::HistoryKind;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Produces the reply body for a feed item; `None` skips the item.
pub trait CommentWriter: Send + Sync {
    fn write<'a>(
        &'a self,
        item: &'a FeedItem,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub channel: String,
    /// Our own account, so we never reply to ourselves.
    pub username: Option<String>,
    pub topics: Vec<String>,
    pub feed_limit: u32,
    pub max_per_scan: usize,
    pub pause: Duration,
}

fn mentions_topic(item: &FeedItem, topics: &[String]) -> bool {
    let haystack = format!("{} {}", item.title, item.content).to_lowercase();
    topics
        .iter()
        .map(|topic| topic.trim().to_lowercase())
        .any(|topic| !topic.is_empty() && contains_word(&haystack, &topic))
}

/// Whole-word match, allowing a plural `s`. `"ai"` matches "AI tools" but
/// not "again".
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let rest = &haystack[start + word.len()..];
        let rest = rest.strip_prefix('s').unwrap_or(rest);
        let after = rest.chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn is_own(item: &FeedItem, username: Option<&str>) -> bool {
    match (item.author.as_deref(), username) {
        (Some(author), Some(me)) => author.eq_ignore_ascii_case(me),
        _ => false,
    }
}

/// Fetch the newest page of the feed and reply to the relevant items.
///
/// Returns how many comments the platform accepted. Stops early once the
/// comment quota is exhausted.
pub async fn scan_and_engage(
    gateway: &ActionGateway,
    settings: &ScanSettings,
    writer: &dyn CommentWriter,
    sleeper: &dyn Sleeper,
    clock: &dyn Clock,
) -> usize {
    let items = match gateway
        .fetch_feed(&settings.channel, "new", settings.feed_limit)
        .await
    {
        ActionOutcome::Completed(items) => items,
        ActionOutcome::Skipped(_) | ActionOutcome::Failed(_) => return 0,
    };

    let history = gateway.history().load(HistoryKind::Engagements);
    let now = clock.now();
    let candidates: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| !is_own(item, settings.username.as_deref()))
        .filter(|item| mentions_topic(item, &settings.topics))
        .filter(|item| {
            !recently_engaged(
                &history,
                &settings.channel,
                &item.id,
                gateway.target_cooldown(),
                now,
            )
        })
        .take(settings.max_per_scan)
        .collect();

    tracing::debug!(
        channel = settings.channel.as_str(),
        candidates = candidates.len(),
        "feed scan filtered"
    );

    let mut engaged = 0;
    for (index, item) in candidates.iter().enumerate() {
        if index > 0 {
            sleeper.sleep(settings.pause).await;
        }
        let Some(body) = writer.write(item).await else {
            continue;
        };
        match gateway
            .comment(&settings.channel, item, &body, clock.now())
            .await
        {
            ActionOutcome::Completed(_) => engaged += 1,
            ActionOutcome::Skipped(SkipReason::RateLimited) => break,
            ActionOutcome::Skipped(_) | ActionOutcome::Failed(_) => {}
        }
    }
    engaged
}
