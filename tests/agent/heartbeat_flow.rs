use chrono::TimeDelta;
use serde_json::json;
use strum::IntoEnumIterator;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use herald::config::TaskCategory;
use herald::storage::{HistoryKind, JournalStore, StateStore};

use crate::harness::{ScriptedOracle, Workspace, start};

async fn platform_accepting_one_post() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": { "id": "p-1", "url": "https://example.com/p-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "posts": [] })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn fresh_workspace_single_heartbeat_persists_everything() {
    let server = platform_accepting_one_post().await;
    let ws = Workspace::new().with_platform(&server.uri());
    let oracle = ScriptedOracle::new(
        &[
            "Posting has been quiet.\nNEW STRATEGY: Share one craft note each morning.",
            "Why outlines fail\nThey fail because the story changes under you.",
            "Let's co-write\nAnyone up for a shared anthology?",
            r#"{"reasoning": "see how we are doing", "action": "check_stats"}"#,
        ],
        r#"{"action": "rest"}"#,
    );
    let prompts = oracle.prompts();
    let mut heartbeat = ws.heartbeat(oracle);

    assert_eq!(heartbeat.run_cycle().await, 1);

    let states = StateStore::new(&ws.config.state_dir());
    assert!(states.path().exists());
    let state = states.load(start());
    assert_eq!(state.cycle_count, 1);
    for category in TaskCategory::iter() {
        assert_eq!(state.last_run(category), Some(start()), "{category}");
    }
    assert_eq!(state.current_strategy, "Share one craft note each morning.");
    assert!(state.recent_errors.is_empty(), "{:?}", state.recent_errors);

    let posts = ws.history().load(HistoryKind::Posts);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Why outlines fail");
    assert_eq!(posts[0].url.as_deref(), Some("https://example.com/p-1"));

    let journal = JournalStore::new(&ws.config.state_dir()).load();
    assert_eq!(journal.action_log.len(), 1);
    assert_eq!(journal.action_log[0].action_type, "check_stats");
    assert!(journal.action_log[0].success);

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[3].contains("Heartbeat #1."));
    assert!(prompts[3].contains("Share one craft note each morning."));
}

#[tokio::test]
async fn gated_tasks_wait_for_their_interval() {
    let server = platform_accepting_one_post().await;
    let ws = Workspace::new().with_platform(&server.uri());
    let mut heartbeat = ws.heartbeat(ScriptedOracle::always(r#"{"action": "rest"}"#));

    heartbeat.run_cycle().await;
    ws.clock.advance(TimeDelta::minutes(30));
    heartbeat.run_cycle().await;

    let state = &heartbeat.ledger().state;
    assert_eq!(state.cycle_count, 2);
    assert_eq!(state.last_run(TaskCategory::Post), Some(start()));
    assert_eq!(state.counter("rest"), 2);
}

#[tokio::test]
async fn platform_and_oracle_outages_are_recorded_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let ws = Workspace::new().with_platform(&server.uri());
    let mut heartbeat = ws.heartbeat(ScriptedOracle::offline());

    heartbeat.run_cycle().await;

    let state = StateStore::new(&ws.config.state_dir()).load(start());
    assert_eq!(state.cycle_count, 1);
    let errors: Vec<&str> = state
        .recent_errors
        .iter()
        .map(|entry| entry.message.as_str())
        .collect();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].starts_with("post: Publish failed"));
    assert!(errors[1].starts_with("collaboration: Publish failed"));
    assert!(ws.history().load(HistoryKind::Posts).is_empty());
}

#[tokio::test]
async fn self_improvement_snapshot_lands_in_learnings() {
    let ws = Workspace::new();
    let mut config = ws.config.clone();
    config.schedule.self_improvement_every = 1;
    let agent = herald::engine::Agent::new(
        config,
        Box::new(ScriptedOracle::always(r#"{"action": "rest"}"#)),
        ws.clock.clone(),
        ws.sleeper.clone(),
    )
    .unwrap();
    let mut heartbeat = herald::daemon::Heartbeat::new(agent);

    heartbeat.run_cycle().await;

    let learnings = &heartbeat.ledger().journal.learnings;
    let snapshot = learnings
        .iter()
        .find(|entry| entry.source == herald::storage::LearningSource::ActivitySnapshot)
        .expect("snapshot learning");
    assert_eq!(snapshot.text, "24h activity: 0 posts, 0 engagements");
}
