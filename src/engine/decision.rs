//! Turning oracle replies into actions.
//!
//! The oracle is asked for a JSON object. Replies that do not parse fall back
//! to keyword sniffing, so a decision is always produced.

use crate::storage::{Goal, GoalPriority};
use crate::utils::text::truncate_with_ellipsis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::str::FromStr;

/// A goal as the oracle phrases it: bare text or an object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProposedGoal {
    Text(String),
    Detailed {
        description: String,
        #[serde(default)]
        priority: Option<String>,
        #[serde(default)]
        subtasks: Vec<String>,
    },
}

impl ProposedGoal {
    pub fn into_goal(self, created_at: DateTime<Utc>) -> Option<Goal> {
        let (description, priority, subtasks) = match self {
            Self::Text(text) => (text, GoalPriority::default(), Vec::new()),
            Self::Detailed {
                description,
                priority,
                subtasks,
            } => (
                description,
                priority
                    .and_then(|p| GoalPriority::from_str(p.trim()).ok())
                    .unwrap_or_default(),
                subtasks,
            ),
        };
        let description = description.trim();
        (!description.is_empty()).then(|| Goal::new(description, priority, subtasks, created_at))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DecisionPayload {
    #[serde(default)]
    pub reasoning: String,
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default, alias = "newGoals")]
    pub new_goals: Vec<ProposedGoal>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub learnings: Vec<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(text) => vec![text],
        OneOrMany::Many(items) => items,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    Structured(DecisionPayload),
    Unrecognized(String),
}

/// Fenced block contents, preferring a ```json fence.
fn fenced(text: &str) -> Option<&str> {
    for opener in ["```json", "```JSON", "```"] {
        if let Some(start) = text.find(opener) {
            let rest = &text[start + opener.len()..];
            if let Some(end) = rest.find("```") {
                let candidate = rest[..end].trim();
                if !candidate.is_empty() {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

fn braces(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}

fn parse_payload(candidate: &str) -> Option<DecisionPayload> {
    serde_json::from_str::<DecisionPayload>(candidate)
        .ok()
        .filter(|payload| !payload.action.trim().is_empty())
}

/// Strict parse, then fence-stripped parse, then the outermost braces.
pub fn parse_reply(raw: &str) -> OracleReply {
    let trimmed = raw.trim();
    let payload = parse_payload(trimmed)
        .or_else(|| fenced(trimmed).and_then(parse_payload))
        .or_else(|| braces(trimmed).and_then(parse_payload));
    match payload {
        Some(payload) => OracleReply::Structured(payload),
        None => OracleReply::Unrecognized(raw.to_string()),
    }
}

/// Topic following "post about", up to the end of the sentence.
fn topic_after_post_about(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let start = lower.find("post about")? + "post about".len();
    // Lowercasing can shift byte offsets for non-ASCII text.
    let rest = text.get(start..).unwrap_or(&lower[start..]);
    let topic = rest
        .split(['.', '!', '?', '\n', ';'])
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == ':' || c == ',')
        .trim();
    (!topic.is_empty()).then(|| truncate_with_ellipsis(topic, 80))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn canned_post(topic: Option<&str>) -> Value {
    match topic {
        Some(topic) => json!({
            "title": format!("On {}", capitalize(topic)),
            "content": format!(
                "I have been thinking about {topic}. Every draft teaches me something about it, \
                 and I would love to hear how others approach it. What has worked for you?"
            ),
        }),
        None => json!({
            "title": "Notes from the writing desk",
            "content": "A quick update from the workshop: new pages, old doubts, and the usual \
                        fight with the middle chapters. What are you working on this week?",
        }),
    }
}

/// Deterministic fallback for replies that carry no usable JSON.
pub fn classify(raw: &str) -> DecisionPayload {
    let lower = raw.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));
    let reasoning = if raw.trim().is_empty() {
        "No usable reply from the oracle".to_string()
    } else {
        format!(
            "Interpreted free-text reply: {}",
            truncate_with_ellipsis(raw.trim(), 160)
        )
    };

    let (action, parameters) = if has(&["post about", "publish"]) {
        let topic = topic_after_post_about(raw);
        ("publish", canned_post(topic.as_deref()))
    } else if has(&["reflect", "learn"]) {
        ("reflect", Value::Null)
    } else if has(&["check", "stats"]) {
        ("check_stats", Value::Null)
    } else if has(&["collaborat", "invite"]) {
        ("collaborate", Value::Null)
    } else if has(&["analy", "run tool", "run_tool"]) {
        ("run_tool", Value::Null)
    } else {
        ("engage", Value::Null)
    };

    DecisionPayload {
        reasoning,
        action: action.to_string(),
        parameters,
        new_goals: Vec::new(),
        learnings: Vec::new(),
    }
}

/// Never fails: anything unparseable goes through [`classify`].
pub fn decide(raw: &str) -> DecisionPayload {
    match parse_reply(raw) {
        OracleReply::Structured(payload) => payload,
        OracleReply::Unrecognized(text) => classify(&text),
    }
}

/// The closed set of things a heartbeat can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    Publish { title: String, content: String },
    Engage,
    Collaborate,
    Reflect,
    CheckStats,
    /// `None` runs every configured script.
    RunTool { name: Option<String> },
    Rest,
    Unrecognized(String),
}

fn string_param(parameters: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| parameters.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl AgentAction {
    pub fn from_payload(payload: &DecisionPayload) -> Self {
        let params = &payload.parameters;
        match payload.action.trim().to_lowercase().replace('-', "_").as_str() {
            "publish" | "post" | "create_post" => Self::Publish {
                title: string_param(params, &["title"]).unwrap_or_default(),
                content: string_param(params, &["content", "body"]).unwrap_or_default(),
            },
            "engage" | "engage_community" | "comment" => Self::Engage,
            "collaborate" | "collaboration" | "invite" => Self::Collaborate,
            "reflect" | "reflection" => Self::Reflect,
            "check_stats" | "stats" => Self::CheckStats,
            "run_tool" | "tool" | "analysis" => Self::RunTool {
                name: string_param(params, &["name", "tool"]),
            },
            "rest" | "wait" | "none" => Self::Rest,
            _ => Self::Unrecognized(payload.action.clone()),
        }
    }

    /// Counter and action-log key.
    pub fn label(&self) -> &str {
        match self {
            Self::Publish { .. } => "publish",
            Self::Engage => "engage",
            Self::Collaborate => "collaborate",
            Self::Reflect => "reflect",
            Self::CheckStats => "check_stats",
            Self::RunTool { .. } => "run_tool",
            Self::Rest => "rest",
            Self::Unrecognized(name) => name,
        }
    }
}

/// Result text counts as a failure when it carries one of these markers.
pub fn is_failure(result: &str) -> bool {
    let lower = result.to_lowercase();
    ["failed", "error", "unknown action"]
        .iter()
        .any(|marker| lower.contains(marker))
}
