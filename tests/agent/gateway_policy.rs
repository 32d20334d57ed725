use chrono::TimeDelta;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use herald::config::RateLimit;
use herald::gateway::{ActionGateway, ActionOutcome, PostDraft, SkipReason};
use herald::storage::HistoryKind;

use crate::harness::{CHANNEL, Workspace, start};

async fn posts_endpoint(expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "post": { "id": "new" } })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn gateway(ws: &Workspace) -> ActionGateway {
    ActionGateway::new(&ws.config.state_dir(), 5, 7)
}

fn draft(title: &str, content: &str) -> PostDraft {
    PostDraft {
        title: title.into(),
        content: content.into(),
        category: "general".into(),
    }
}

#[tokio::test]
async fn rate_limited_publish_makes_no_call_and_no_append() {
    let server = posts_endpoint(0).await;
    let ws = Workspace::new().with_platform(&server.uri());
    ws.seed_post("old", "Earlier", "An earlier post.", start() - TimeDelta::minutes(10));

    let outcome = gateway(&ws)
        .publish(CHANNEL, &draft("Fresh", "Something new entirely."), start())
        .await;

    assert_eq!(outcome, ActionOutcome::Skipped(SkipReason::RateLimited));
    assert_eq!(ws.history().load(HistoryKind::Posts).len(), 1);
}

#[tokio::test]
async fn quota_boundary_allows_below_and_blocks_at_quota() {
    let server = posts_endpoint(1).await;
    let ws = Workspace::new().with_platform(&server.uri());
    ws.edit_platform(&server.uri(), |p| p.rate_limits.post = RateLimit::new(3, 60));
    ws.seed_post("1", "One", "First body.", start() - TimeDelta::minutes(50));
    ws.seed_post("2", "Two", "Second body.", start() - TimeDelta::minutes(20));
    let gateway = gateway(&ws);

    let third = gateway
        .publish(CHANNEL, &draft("Three", "Third body."), start())
        .await;
    let fourth = gateway
        .publish(CHANNEL, &draft("Four", "Fourth body."), start() + TimeDelta::minutes(1))
        .await;

    assert!(third.is_completed());
    assert_eq!(fourth, ActionOutcome::Skipped(SkipReason::RateLimited));
    assert_eq!(ws.history().load(HistoryKind::Posts).len(), 3);
}

#[tokio::test]
async fn duplicate_title_blocks_within_thirty_days_only() {
    let server = posts_endpoint(1).await;
    let ws = Workspace::new().with_platform(&server.uri());
    ws.seed_post("a", "Hello  World", "Original body.", start() - TimeDelta::days(29));
    let gateway = gateway(&ws);

    let recent = gateway
        .publish(CHANNEL, &draft("hello world", "A different body."), start())
        .await;
    assert_eq!(recent, ActionOutcome::Skipped(SkipReason::Duplicate));

    let later = gateway
        .publish(
            CHANNEL,
            &draft("hello world", "A different body."),
            start() + TimeDelta::days(2),
        )
        .await;
    assert!(later.is_completed());
}

#[tokio::test]
async fn disabled_channel_is_skipped_without_io() {
    let server = posts_endpoint(0).await;
    let ws = Workspace::new().with_platform(&server.uri());
    ws.edit_platform(&server.uri(), |p| p.enabled = false);

    let outcome = gateway(&ws)
        .publish(CHANNEL, &draft("Any", "Body."), start())
        .await;

    assert_eq!(outcome, ActionOutcome::Skipped(SkipReason::ChannelUnavailable));
    assert!(ws.history().load(HistoryKind::Posts).is_empty());
}

#[tokio::test]
async fn corrupt_history_blocks_publish_and_is_preserved() {
    let server = posts_endpoint(0).await;
    let ws = Workspace::new().with_platform(&server.uri());
    for i in 0..5 {
        ws.seed_post(
            &format!("p{i}"),
            &format!("Post {i}"),
            "Body.",
            start() - TimeDelta::minutes(10 - i),
        );
    }
    let history_path = ws.history().path(HistoryKind::Posts);
    let intact = std::fs::read_to_string(&history_path).unwrap();
    let truncated = &intact[..intact.len() - 40];
    std::fs::write(&history_path, truncated).unwrap();

    let outcome = gateway(&ws)
        .publish(CHANNEL, &draft("Fresh", "Something new entirely."), start())
        .await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)), "{outcome:?}");
    assert_eq!(std::fs::read_to_string(&history_path).unwrap(), truncated);
}

#[tokio::test]
async fn unbounded_rate_window_still_publishes() {
    let server = posts_endpoint(1).await;
    let ws = Workspace::new().with_platform(&server.uri());
    ws.edit_platform(&server.uri(), |p| p.rate_limits.post = RateLimit::new(5, u64::MAX));
    ws.seed_post("old", "Years ago", "An ancient post.", start() - TimeDelta::days(3650));

    let outcome = gateway(&ws)
        .publish(CHANNEL, &draft("Fresh", "Something new entirely."), start())
        .await;

    assert!(outcome.is_completed(), "{outcome:?}");
    assert_eq!(ws.history().load(HistoryKind::Posts).len(), 2);
}
