use chrono::{TimeDelta, TimeZone, Utc};
use tempfile::TempDir;

use herald::config::TaskCategory;
use herald::storage::{
    ActionLogEntry, AgentState, Goal, GoalPriority, Journal, JournalStore, StateStore,
};

fn populated_state() -> AgentState {
    let now = Utc.with_ymd_and_hms(2026, 4, 10, 7, 30, 0).unwrap();
    let mut state = AgentState::new(now - TimeDelta::days(3));
    state.cycle_count = 17;
    state.current_strategy = "Short posts, long replies.".into();
    state.mark_ran(TaskCategory::Post, now);
    state.mark_ran(TaskCategory::Strategy, now - TimeDelta::hours(20));
    state.increment_counter("publish");
    state.increment_counter("publish");
    state.increment_counter("engage");
    let topics = vec!["alpha".to_string(), "beta".to_string()];
    state.take_unconsumed("topic", &topics);
    state.record_error(now, "post: Publish failed: status 502");
    state
}

#[test]
fn state_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let store = StateStore::new(tmp.path());
    let state = populated_state();

    store.save(&state).unwrap();
    let loaded = store.load(Utc::now());

    assert_eq!(loaded, state);
}

#[test]
fn corrupt_state_resets_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let store = StateStore::new(tmp.path());
    std::fs::write(store.path(), "{ not json").unwrap();
    let now = Utc.with_ymd_and_hms(2026, 4, 10, 0, 0, 0).unwrap();

    let state = store.load(now);

    assert_eq!(state, AgentState::new(now));
}

#[test]
fn error_log_keeps_fifty_most_recent() {
    let mut state = populated_state();
    let base = Utc.with_ymd_and_hms(2026, 4, 11, 0, 0, 0).unwrap();
    for i in 0..60 {
        state.record_error(base + TimeDelta::minutes(i), format!("fault {i}"));
    }

    assert_eq!(state.recent_errors.len(), 50);
    assert_eq!(state.recent_errors.front().unwrap().message, "fault 10");
    assert_eq!(state.recent_errors.back().unwrap().message, "fault 59");
}

#[test]
fn oversized_journal_files_are_trimmed_on_load() {
    let tmp = TempDir::new().unwrap();
    let store = JournalStore::new(tmp.path());
    let at = Utc.with_ymd_and_hms(2026, 4, 10, 0, 0, 0).unwrap();
    let mut journal = Journal::default();
    for i in 0..120 {
        journal.action_log.push_back(ActionLogEntry {
            timestamp: at + TimeDelta::minutes(i),
            action_type: "rest".into(),
            reasoning: String::new(),
            result: format!("cycle {i}"),
            success: true,
        });
    }
    journal.add_goal(Goal::new("Finish draft", GoalPriority::Low, Vec::new(), at));
    store.save(&journal).unwrap();

    let loaded = store.load();

    assert_eq!(loaded.action_log.len(), 100);
    assert_eq!(loaded.action_log.front().unwrap().result, "cycle 20");
    assert_eq!(loaded.goals, journal.goals);
}
