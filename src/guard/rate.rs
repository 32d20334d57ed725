use super::window_start;
use crate::config::RateLimit;
use crate::storage::ActionHistoryRecord;
use chrono::{DateTime, TimeDelta, Utc};

/// `true` when one more action on `channel` stays within `limit`.
pub fn check_rate_limit(
    limit: RateLimit,
    records: &[ActionHistoryRecord],
    channel: &str,
    now: DateTime<Utc>,
) -> bool {
    let since = window_start(now, limit.window());
    let used = records
        .iter()
        .filter(|record| record.channel == channel && record.timestamp > since)
        .count();
    used < limit.count as usize
}

/// `true` when `target_id` on `channel` already got a reply inside `window`.
pub fn recently_engaged(
    records: &[ActionHistoryRecord],
    channel: &str,
    target_id: &str,
    window: TimeDelta,
    now: DateTime<Utc>,
) -> bool {
    let since = window_start(now, window);
    records.iter().any(|record| {
        record.channel == channel
            && record.timestamp > since
            && record.target_id.as_deref() == Some(target_id)
    })
}
