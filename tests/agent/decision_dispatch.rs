use std::time::Duration;

use chrono::TimeDelta;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use herald::config::TaskCategory;
use herald::storage::{GoalPriority, HistoryKind, JournalStore, LearningSource};

use crate::harness::{ScriptedOracle, Workspace, start};

#[tokio::test]
async fn reflect_json_runs_reflection_and_records_last_run() {
    let ws = Workspace::new();
    let agent = ws.agent(ScriptedOracle::new(
        &[
            r#"{"reasoning": "numbers are flat", "action": "reflect", "parameters": {}}"#,
            "Comments outperform posts.\nNEW STRATEGY: Comment more, post less.",
        ],
        "",
    ));
    let mut ledger = ws.fresh_ledger();

    let entry = agent.decide_and_act(&mut ledger).await.unwrap();

    assert_eq!(entry.action_type, "reflect");
    assert_eq!(entry.reasoning, "numbers are flat");
    assert!(entry.success);
    assert_eq!(ledger.state.last_run(TaskCategory::Strategy), Some(start()));
    assert_eq!(ledger.state.current_strategy, "Comment more, post less.");
    assert_eq!(ledger.state.counter("reflect"), 1);
    assert!(
        ledger
            .journal
            .learnings
            .iter()
            .any(|l| l.source == LearningSource::Reflection && l.text == "Comments outperform posts.")
    );
}

#[tokio::test]
async fn post_about_free_text_publishes_canned_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_partial_json(json!({ "title": "On Cozy mysteries" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;
    let ws = Workspace::new().with_platform(&server.uri());
    let agent = ws.agent(ScriptedOracle::always(
        "Honestly I think I should post about cozy mysteries. They are trending.",
    ));
    let mut ledger = ws.fresh_ledger();

    let entry = agent.decide_and_act(&mut ledger).await.unwrap();

    assert_eq!(entry.action_type, "publish");
    assert!(entry.success, "{}", entry.result);
    let posts = ws.history().load(HistoryKind::Posts);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "42");
    assert!(!posts[0].title.is_empty());
    assert!(posts[0].content.contains("cozy mysteries"));
    assert_eq!(ledger.state.last_run(TaskCategory::Post), Some(start()));
}

#[tokio::test]
async fn unknown_action_is_logged_as_failure() {
    let ws = Workspace::new();
    let agent = ws.agent(ScriptedOracle::always(r#"{"action": "dance", "reasoning": "why not"}"#));
    let mut ledger = ws.fresh_ledger();

    let entry = agent.decide_and_act(&mut ledger).await.unwrap();

    assert_eq!(entry.result, "Unknown action: dance");
    assert!(!entry.success);
    assert_eq!(ledger.state.counter("dance"), 1);
    assert_eq!(ledger.journal.action_log.len(), 1);
}

#[tokio::test]
async fn proposed_goals_and_learnings_are_kept() {
    let ws = Workspace::new();
    let agent = ws.agent(ScriptedOracle::always(
        r#"```json
{
  "reasoning": "plan ahead",
  "action": "rest",
  "newGoals": [{"description": "Reach 50 followers", "priority": "high"}, "Finish chapter 4"],
  "learnings": ["Mornings get more replies"]
}
```"#,
    ));
    let mut ledger = ws.fresh_ledger();

    agent.decide_and_act(&mut ledger).await.unwrap();

    let goals = &ledger.journal.goals;
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].priority, GoalPriority::High);
    assert_eq!(goals[1].description, "Finish chapter 4");
    assert_eq!(goals[1].priority, GoalPriority::Medium);
    assert_eq!(ledger.journal.learnings.len(), 1);
    assert_eq!(ledger.journal.learnings[0].source, LearningSource::Oracle);

    let store = JournalStore::new(&ws.config.state_dir());
    store.save(&ledger.journal).unwrap();
    assert_eq!(store.load(), ledger.journal);
}

#[tokio::test]
async fn logs_and_learnings_keep_only_the_most_recent() {
    let ws = Workspace::new();
    let replies: Vec<String> = (0..105)
        .map(|i| json!({ "action": "rest", "learnings": format!("lesson {i}") }).to_string())
        .collect();
    let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
    let agent = ws.agent(ScriptedOracle::new(&replies, r#"{"action": "rest"}"#));
    let mut ledger = ws.fresh_ledger();

    for _ in 0..105 {
        agent.decide_and_act(&mut ledger).await.unwrap();
        ws.clock.advance(TimeDelta::minutes(1));
    }

    assert_eq!(ledger.journal.action_log.len(), 100);
    assert_eq!(
        ledger.journal.action_log.front().unwrap().timestamp,
        start() + TimeDelta::minutes(5)
    );
    assert_eq!(ledger.journal.learnings.len(), 50);
    assert_eq!(ledger.journal.learnings.front().unwrap().text, "lesson 55");
    assert_eq!(ledger.journal.learnings.back().unwrap().text, "lesson 104");
    assert_eq!(ledger.state.counter("rest"), 105);
}

#[tokio::test]
async fn engage_comments_on_relevant_posts_with_pauses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a", "title": "My fiction workflow", "content": "Drafts in the morning", "author": { "name": "quill" } },
            { "id": "b", "title": "Publishing on a budget", "content": "", "author_name": "inkwell" },
            { "id": "c", "title": "Weekend hike photos", "content": "Great views", "author": "trail" },
            { "id": "d", "title": "A writing update", "content": "From me", "author": "Herald" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/posts/[ab]/comments$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "comment": { "id": "c-1" } })))
        .expect(2)
        .mount(&server)
        .await;
    let ws = Workspace::new().with_platform(&server.uri());
    let agent = ws.agent(ScriptedOracle::new(
        &[
            r#"{"action": "engage"}"#,
            "Morning drafts are underrated. Do you edit the same day?",
            "Which print-on-demand service have you had the best luck with?",
        ],
        "",
    ));
    let mut ledger = ws.fresh_ledger();

    let entry = agent.decide_and_act(&mut ledger).await.unwrap();

    assert_eq!(entry.result, "Engaged with 2 posts");
    assert_eq!(ws.sleeper.recorded(), vec![Duration::from_secs(20)]);
    let engagements = ws.history().load(HistoryKind::Engagements);
    let targets: Vec<_> = engagements
        .iter()
        .map(|r| r.target_id.as_deref().unwrap())
        .collect();
    assert_eq!(targets, vec!["a", "b"]);
    assert_eq!(engagements[0].title, "Re: My fiction workflow");
    assert_eq!(ledger.state.last_run(TaskCategory::Engagement), Some(start()));
}
