use super::window_start;
use crate::storage::ActionHistoryRecord;
use crate::utils::text::normalize;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Write;

pub const DUPLICATE_WINDOW_DAYS: i64 = 30;

/// Content shorter than this is never matched by prefix.
pub const PREFIX_CHARS: usize = 50;

/// Stable 64-bit polynomial hash of the normalized text, as 16 hex digits.
pub fn fingerprint(text: &str) -> String {
    const BASE: u64 = 1_099_511_628_211;
    let hash = normalize(text)
        .bytes()
        .fold(14_695_981_039_346_656_037_u64, |acc, byte| {
            acc.wrapping_mul(BASE).wrapping_add(u64::from(byte))
        });
    let mut out = String::with_capacity(16);
    let _ = write!(out, "{hash:016x}");
    out
}

/// Whether a new `title`/`content` repeats something `channel` got in the
/// trailing 30 days.
///
/// A record matches on an equal non-empty normalized title, an equal content
/// fingerprint, or when its normalized content contains the first 50
/// characters of the new normalized content.
pub fn is_duplicate(
    records: &[ActionHistoryRecord],
    channel: &str,
    title: &str,
    content: &str,
    now: DateTime<Utc>,
) -> bool {
    let since = window_start(now, TimeDelta::days(DUPLICATE_WINDOW_DAYS));
    let title = normalize(title);
    let content_norm = normalize(content);
    let print = fingerprint(content);
    let prefix: Option<String> = (content_norm.chars().count() >= PREFIX_CHARS)
        .then(|| content_norm.chars().take(PREFIX_CHARS).collect());

    records
        .iter()
        .filter(|record| record.channel == channel && record.timestamp > since)
        .any(|record| {
            if !title.is_empty() && normalize(&record.title) == title {
                return true;
            }
            if !content_norm.is_empty() && record.fingerprint == print {
                return true;
            }
            prefix
                .as_deref()
                .is_some_and(|prefix| normalize(&record.content).contains(prefix))
        })
}
