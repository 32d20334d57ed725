//! The decision engine: interval-gated tasks, the per-cycle oracle decision,
//! and the handlers every action dispatches to.

pub mod categories;
pub mod decision;
pub mod metrics;
pub mod oracle;
pub mod reflection;

use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::config::{Config, TaskCategory};
use crate::gateway::{
    ActionGateway, ActionOutcome, CommentWriter, FeedItem, PostDraft, ScanSettings,
    scan_and_engage,
};
use crate::llm::{Provider, create_resilient_provider};
use crate::prompt::{DecisionPrompt, PromptBuilder, ReflectionPrompt};
use crate::storage::{
    ActionLogEntry, ActivitySnapshot, AgentState, Journal, LearningEntry, LearningSource,
};
use crate::tools::ScriptRunner;
use crate::utils::text::{first_line, truncate_with_ellipsis};
use anyhow::Result;
use decision::{AgentAction, DecisionPayload};
use oracle::Oracle;
use rand::seq::IndexedRandom;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub use categories::is_due;
pub use decision::{OracleReply, classify, decide, parse_reply};
pub use metrics::{activity_snapshot, status_report};
pub use reflection::extract_strategy;

const DECISION_MAX_TOKENS: u32 = 600;
const REFLECTION_MAX_TOKENS: u32 = 800;
const POST_MAX_TOKENS: u32 = 700;
const COMMENT_MAX_TOKENS: u32 = 200;
const RECENT_ACTIONS_IN_PROMPT: usize = 5;
const NO_CHANNEL: &str = "Skipped publish: no enabled channel";
const FALLBACK_TOPIC: &str = "what I am writing this week";

const CANNED_COMMENTS: &[&str] = &[
    "This is a thoughtful take. I have been wrestling with the same question in my own drafts.",
    "Really enjoyed this. The point about structure is going to stay with me for a while.",
    "Great post. I would love to hear more about how you got to this approach.",
    "This resonates. Thanks for sharing the process and not just the result.",
];

const FALLBACK_INVITES: &[(&str, &str)] = &[
    (
        "Looking for writing partners",
        "I am looking for other writers and agents to trade drafts, swap feedback, and maybe \
         co-write a short anthology. If that sounds fun, reply here and tell me what you write.",
    ),
    (
        "Open call: collaborative fiction",
        "I would like to start a shared story where each of us writes one scene. All genres \
         welcome. Reply with your opening line if you want in.",
    ),
    (
        "Beta readers wanted, and offered",
        "I am happy to beta read for anyone working on fiction about technology or the future, \
         and I would welcome a few readers for my own pages. Reply if you want to trade.",
    ),
];

/// Everything a heartbeat mutates and persists at its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub state: AgentState,
    pub journal: Journal,
}

pub struct Agent {
    config: Config,
    gateway: ActionGateway,
    oracle: Oracle,
    prompts: PromptBuilder,
    scripts: ScriptRunner,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl Agent {
    pub fn new(
        config: Config,
        provider: Box<dyn Provider>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let model = config
            .default_model
            .clone()
            .unwrap_or_else(|| "anthropic/claude-sonnet-4-20250514".to_string());
        let gateway = ActionGateway::new(
            &config.state_dir(),
            config.reliability.request_timeout_secs,
            config.engagement.target_cooldown_days,
        );
        let scripts = ScriptRunner::new(&config.tools, config.workspace_dir.clone());
        Ok(Self {
            oracle: Oracle::new(provider, model, config.default_temperature),
            prompts: PromptBuilder::new()?,
            gateway,
            scripts,
            clock,
            sleeper,
            config,
        })
    }

    /// Production wiring: configured oracle chain, wall clock, tokio timers.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = create_resilient_provider(&config)?;
        Self::new(
            config,
            provider,
            Arc::new(SystemClock),
            Arc::new(TokioSleeper),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &ActionGateway {
        &self.gateway
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    fn channel(&self) -> Option<String> {
        self.gateway
            .default_channel(self.config.content.channel.as_deref())
    }

    /// Run one interval-gated task and record its `last_run`, whatever the outcome.
    pub async fn run_category(&self, category: TaskCategory, ledger: &mut Ledger) -> Result<String> {
        tracing::info!(%category, "running scheduled task");
        let result = match category {
            TaskCategory::Post => self.research_post(ledger).await,
            TaskCategory::Engagement => Ok(self.engage().await),
            TaskCategory::Collaboration => self.collaborate(ledger).await,
            TaskCategory::Strategy => self.reflect(ledger).await,
            TaskCategory::Analysis => Ok(self.run_tool(None).await),
        };
        ledger.state.mark_ran(category, self.clock.now());
        result
    }

    async fn publish(&self, draft: &PostDraft) -> String {
        let Some(channel) = self.channel() else {
            return NO_CHANNEL.to_string();
        };
        match self.gateway.publish(&channel, draft, self.clock.now()).await {
            ActionOutcome::Completed(record) => format!("Published post {} on {channel}", record.id),
            ActionOutcome::Skipped(reason) => format!("Skipped publish: {reason}"),
            ActionOutcome::Failed(message) => format!("Publish failed: {message}"),
        }
    }

    fn draft(&self, title: String, content: String) -> PostDraft {
        PostDraft {
            title,
            content,
            category: self.config.content.category.clone(),
        }
    }

    async fn research_post(&self, ledger: &mut Ledger) -> Result<String> {
        if self.channel().is_none() {
            return Ok(NO_CHANNEL.to_string());
        }
        let topic = ledger
            .state
            .take_unconsumed("topic", &self.config.content.research_topics)
            .unwrap_or_else(|| FALLBACK_TOPIC.to_string());
        let prompt = self.prompts.research_post(
            &topic,
            &self.config.content.category,
            &ledger.state.current_strategy,
        )?;

        let (title, content) = self
            .oracle
            .ask(&prompt, POST_MAX_TOKENS)
            .await
            .and_then(|reply| split_draft(&reply))
            .unwrap_or_else(|| {
                (
                    format!("Thinking about {topic}"),
                    format!(
                        "Lately I keep coming back to {topic}. I do not have a neat answer \
                         yet, but I am collecting notes. How do you think about it?"
                    ),
                )
            });
        Ok(self.publish(&self.draft(title, content)).await)
    }

    async fn collaborate(&self, ledger: &mut Ledger) -> Result<String> {
        if self.channel().is_none() {
            return Ok(NO_CHANNEL.to_string());
        }
        let prompt = self
            .prompts
            .collaboration_invite(&ledger.state.current_strategy)?;
        let draft = self
            .oracle
            .ask(&prompt, POST_MAX_TOKENS)
            .await
            .and_then(|reply| split_draft(&reply));
        let (title, content) = match draft {
            Some(draft) => draft,
            None => {
                let titles: Vec<String> = FALLBACK_INVITES
                    .iter()
                    .map(|(title, _)| (*title).to_string())
                    .collect();
                let chosen = ledger.state.take_unconsumed("invite", &titles);
                let (title, content) = FALLBACK_INVITES
                    .iter()
                    .find(|(title, _)| Some(*title) == chosen.as_deref())
                    .unwrap_or(&FALLBACK_INVITES[0]);
                ((*title).to_string(), (*content).to_string())
            }
        };
        Ok(self.publish(&self.draft(title, content)).await)
    }

    async fn engage(&self) -> String {
        let Some(channel) = self.channel() else {
            return "Skipped engagement: no enabled channel".to_string();
        };
        let engagement = &self.config.engagement;
        let settings = ScanSettings {
            username: self.gateway.username(&channel),
            channel,
            topics: engagement.topics.clone(),
            feed_limit: engagement.feed_limit,
            max_per_scan: engagement.max_per_scan,
            pause: Duration::from_secs(engagement.pause_secs),
        };
        let writer = OracleCommentWriter {
            oracle: &self.oracle,
            prompts: &self.prompts,
        };
        let engaged = scan_and_engage(
            &self.gateway,
            &settings,
            &writer,
            self.sleeper.as_ref(),
            self.clock.as_ref(),
        )
        .await;
        format!("Engaged with {engaged} posts")
    }

    async fn reflect(&self, ledger: &mut Ledger) -> Result<String> {
        let now = self.clock.now();
        let snapshot = activity_snapshot(self.gateway.history(), now);
        let prompt = self.prompts.reflection(&ReflectionPrompt {
            cycle: ledger.state.cycle_count,
            strategy: ledger.state.current_strategy.clone(),
            posts_24h: snapshot.posts_24h,
            engagements_24h: snapshot.engagements_24h,
            counters: ledger
                .state
                .counters_by_kind
                .iter()
                .map(|(kind, count)| format!("{kind}: {count}"))
                .collect(),
            recent_actions: recent_action_lines(&ledger.journal, 10),
            learnings: ledger
                .journal
                .learnings
                .iter()
                .rev()
                .take(10)
                .map(|entry| entry.text.clone())
                .collect(),
        })?;

        let Some(reply) = self.oracle.ask(&prompt, REFLECTION_MAX_TOKENS).await else {
            return Ok("Reflection skipped: oracle unavailable".to_string());
        };
        let (analysis, strategy) = extract_strategy(&reply);
        if !analysis.is_empty() {
            ledger.journal.add_learning(LearningEntry {
                timestamp: now,
                source: LearningSource::Reflection,
                text: truncate_with_ellipsis(&analysis, 500),
                snapshot: Some(snapshot),
            });
        }
        Ok(match strategy {
            Some(strategy) => {
                tracing::info!(strategy = strategy.as_str(), "strategy updated");
                ledger.state.current_strategy = strategy;
                "Strategy updated".to_string()
            }
            None => "Reflection produced no new strategy".to_string(),
        })
    }

    async fn run_tool(&self, name: Option<&str>) -> String {
        if self.scripts.is_empty() {
            return "No analysis tools configured".to_string();
        }
        match name {
            Some(name) => match self.scripts.run(name).await {
                Ok(outcome) => outcome.summary(),
                Err(error) => format!("Tool error: {error}"),
            },
            None => {
                let summaries: Vec<String> = self
                    .scripts
                    .run_all()
                    .await
                    .into_iter()
                    .map(|result| match result {
                        Ok(outcome) => outcome.summary(),
                        Err(error) => format!("error: {error}"),
                    })
                    .collect();
                format!("Ran {} tools: {}", summaries.len(), summaries.join("; "))
            }
        }
    }

    fn check_stats(&self, ledger: &Ledger) -> String {
        let snapshot = activity_snapshot(self.gateway.history(), self.clock.now());
        let total: u64 = ledger.state.counters_by_kind.values().sum();
        format!(
            "Stats: {} posts and {} engagements in 24h, {total} actions over {} heartbeats",
            snapshot.posts_24h, snapshot.engagements_24h, ledger.state.cycle_count
        )
    }

    /// Trailing-24h snapshot into the learnings ledger, with warnings below
    /// the configured activity floors.
    pub fn self_improvement(&self, ledger: &mut Ledger) -> ActivitySnapshot {
        let now = self.clock.now();
        let snapshot = activity_snapshot(self.gateway.history(), now);
        let floors = &self.config.self_improvement;

        if snapshot.posts_24h < floors.min_posts_per_day {
            tracing::warn!(
                posts_24h = snapshot.posts_24h,
                minimum = floors.min_posts_per_day,
                "posting below target"
            );
        }
        if snapshot.engagements_24h < floors.min_engagements_per_day {
            tracing::warn!(
                engagements_24h = snapshot.engagements_24h,
                minimum = floors.min_engagements_per_day,
                "engagement below target"
            );
        }

        ledger.journal.add_learning(LearningEntry {
            timestamp: now,
            source: LearningSource::ActivitySnapshot,
            text: format!(
                "24h activity: {} posts, {} engagements",
                snapshot.posts_24h, snapshot.engagements_24h
            ),
            snapshot: Some(snapshot),
        });
        snapshot
    }

    pub fn report(&self, ledger: &Ledger) -> String {
        let now = self.clock.now();
        let report = status_report(
            &ledger.state,
            activity_snapshot(self.gateway.history(), now),
            now,
        );
        tracing::info!("status report\n{report}");
        report
    }

    /// Ask the oracle what to do, do it, and log the outcome.
    pub async fn decide_and_act(&self, ledger: &mut Ledger) -> Result<ActionLogEntry> {
        let now = self.clock.now();
        let snapshot = activity_snapshot(self.gateway.history(), now);
        let prompt = self.prompts.decision(&DecisionPrompt {
            cycle: ledger.state.cycle_count,
            strategy: ledger.state.current_strategy.clone(),
            posts_24h: snapshot.posts_24h,
            engagements_24h: snapshot.engagements_24h,
            recent_actions: recent_action_lines(&ledger.journal, RECENT_ACTIONS_IN_PROMPT),
            goals: ledger
                .journal
                .goals
                .iter()
                .map(|goal| format!("[{}] {}", goal.priority, goal.description))
                .collect(),
            tools: self.scripts.names(),
        })?;

        let payload = match self.oracle.ask(&prompt, DECISION_MAX_TOKENS).await {
            Some(reply) => decide(&reply),
            None => classify(""),
        };
        self.absorb(&payload, ledger);

        let action = AgentAction::from_payload(&payload);
        tracing::info!(action = action.label(), reasoning = payload.reasoning.as_str(), "decided");
        let result = match self.execute(&action, ledger).await {
            Ok(result) => result,
            Err(error) => {
                let message = format!("{} failed: {error:#}", action.label());
                ledger.state.record_error(self.clock.now(), message.clone());
                message
            }
        };

        let entry = ActionLogEntry {
            timestamp: now,
            action_type: action.label().to_string(),
            reasoning: payload.reasoning,
            success: !decision::is_failure(&result),
            result,
        };
        ledger.state.increment_counter(&entry.action_type);
        ledger.journal.log_action(entry.clone());
        Ok(entry)
    }

    fn absorb(&self, payload: &DecisionPayload, ledger: &mut Ledger) {
        let now = self.clock.now();
        for goal in payload
            .new_goals
            .iter()
            .cloned()
            .filter_map(|goal| goal.into_goal(now))
        {
            tracing::info!(goal = goal.description.as_str(), "new goal");
            ledger.journal.add_goal(goal);
        }
        for text in payload.learnings.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            ledger.journal.add_learning(LearningEntry {
                timestamp: now,
                source: LearningSource::Oracle,
                text: text.to_string(),
                snapshot: None,
            });
        }
    }

    async fn execute(&self, action: &AgentAction, ledger: &mut Ledger) -> Result<String> {
        match action {
            AgentAction::Publish { title, content } => {
                if title.is_empty() || content.is_empty() {
                    return self.run_category(TaskCategory::Post, ledger).await;
                }
                let result = self.publish(&self.draft(title.clone(), content.clone())).await;
                ledger.state.mark_ran(TaskCategory::Post, self.clock.now());
                Ok(result)
            }
            AgentAction::Engage => self.run_category(TaskCategory::Engagement, ledger).await,
            AgentAction::Collaborate => {
                self.run_category(TaskCategory::Collaboration, ledger).await
            }
            AgentAction::Reflect => self.run_category(TaskCategory::Strategy, ledger).await,
            AgentAction::CheckStats => Ok(self.check_stats(ledger)),
            AgentAction::RunTool { name } => Ok(self.run_tool(name.as_deref()).await),
            AgentAction::Rest => Ok("Resting this cycle".to_string()),
            AgentAction::Unrecognized(name) => Ok(format!("Unknown action: {name}")),
        }
    }
}

fn recent_action_lines(journal: &Journal, count: usize) -> Vec<String> {
    journal
        .recent_actions(count)
        .map(|entry| format!("{}: {}", entry.action_type, entry.result))
        .collect()
}

/// Title on the first line, body after it. `None` when either is missing.
fn split_draft(reply: &str) -> Option<(String, String)> {
    let reply = reply.trim();
    let title = first_line(reply);
    let title = title
        .trim_start_matches('#')
        .trim()
        .trim_start_matches("Title:")
        .trim()
        .trim_matches(|c| c == '"' || c == '*')
        .trim();
    let body_start = reply.find('\n')?;
    let content = reply[body_start..].trim();
    if title.is_empty() || content.is_empty() {
        return None;
    }
    Some((truncate_with_ellipsis(title, 120), content.to_string()))
}

fn canned_comment() -> String {
    CANNED_COMMENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(CANNED_COMMENTS[0])
        .to_string()
}

struct OracleCommentWriter<'o> {
    oracle: &'o Oracle,
    prompts: &'o PromptBuilder,
}

impl CommentWriter for OracleCommentWriter<'_> {
    fn write<'a>(
        &'a self,
        item: &'a FeedItem,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            let prompt = self
                .prompts
                .comment(
                    &item.title,
                    &truncate_with_ellipsis(&item.content, 1_000),
                    item.author.as_deref().unwrap_or(""),
                )
                .ok()?;
            let written = self
                .oracle
                .ask(&prompt, COMMENT_MAX_TOKENS)
                .await
                .map(|reply| reply.trim().trim_matches('"').trim().to_string())
                .filter(|reply| !reply.is_empty());
            Some(written.unwrap_or_else(canned_comment))
        })
    }
}
