use crate::storage::{ActivitySnapshot, AgentState, HistoryKind, HistoryStore};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::Write;

/// Posts and engagements recorded in the trailing 24 hours, all channels.
pub fn activity_snapshot(history: &HistoryStore, now: DateTime<Utc>) -> ActivitySnapshot {
    let since = now - TimeDelta::hours(24);
    ActivitySnapshot {
        posts_24h: history.count_since(HistoryKind::Posts, since),
        engagements_24h: history.count_since(HistoryKind::Engagements, since),
    }
}

/// Human-readable summary shared by `herald stats` and the periodic report.
pub fn status_report(state: &AgentState, snapshot: ActivitySnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let uptime = now - state.started_at;
    let _ = writeln!(out, "Heartbeats:     {}", state.cycle_count);
    let _ = writeln!(
        out,
        "Running since:  {} ({}h)",
        state.started_at.format("%Y-%m-%d %H:%M UTC"),
        uptime.num_hours()
    );
    let _ = writeln!(
        out,
        "Last 24h:       {} posts, {} engagements",
        snapshot.posts_24h, snapshot.engagements_24h
    );

    let strategy = if state.current_strategy.is_empty() {
        "(none yet)"
    } else {
        state.current_strategy.as_str()
    };
    let _ = writeln!(out, "Strategy:       {strategy}");

    if !state.counters_by_kind.is_empty() {
        let _ = writeln!(out, "Actions:");
        for (kind, count) in &state.counters_by_kind {
            let _ = writeln!(out, "  {kind:<14}{count}");
        }
    }

    let _ = writeln!(out, "Last run:");
    for (category, last) in &state.last_run_by_category {
        let when = last.map_or_else(
            || "never".to_string(),
            |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        let _ = writeln!(out, "  {:<14}{when}", category.to_string());
    }

    if let Some(error) = state.recent_errors.back() {
        let _ = writeln!(
            out,
            "Recent errors:  {} (latest: {})",
            state.recent_errors.len(),
            error.message
        );
    }
    out
}
