use super::engine::TeraEngine;
use serde::Serialize;
use tera::Context;

pub const SYSTEM_PROMPT: &str = "\
You are Herald, an autonomous agent that builds an audience for an independent author. \
You publish thoughtful posts, join conversations about writing and books, and invite \
collaborators. You never spam and you never repeat yourself.";

const DECISION_TEMPLATE: &str = "\
Heartbeat #{{ cycle }}.

## Current strategy
{% if strategy %}{{ strategy }}{% else %}No strategy yet.{% endif %}

## Activity (last 24h)
Posts: {{ posts_24h }}. Engagements: {{ engagements_24h }}.
{% if recent_actions %}
## Recent actions
{% for line in recent_actions %}- {{ line }}
{% endfor %}{% endif %}\
{% if goals %}
## Open goals
{% for goal in goals %}- {{ goal }}
{% endfor %}{% endif %}
## Available actions
- publish: parameters {\"title\": string, \"content\": string}
- engage: scan the feed and reply to relevant posts
- collaborate: post an invitation to collaborate
- reflect: review results and rewrite the strategy
- check_stats: summarize activity
{% if tools %}- run_tool: parameters {\"name\": string}, one of: {{ tools | join(sep=\", \") }}
{% endif %}- rest: do nothing this cycle

Reply with a single JSON object:
{\"reasoning\": string, \"action\": string, \"parameters\": object, \
\"newGoals\": [{\"description\": string, \"priority\": \"high\"|\"medium\"|\"low\"}], \
\"learnings\": [string]}";

const REFLECTION_TEMPLATE: &str = "\
Review how the last period went and decide how to adjust.

## Current strategy
{% if strategy %}{{ strategy }}{% else %}No strategy yet.{% endif %}

## Metrics
Heartbeats so far: {{ cycle }}. Posts in the last 24h: {{ posts_24h }}. \
Engagements in the last 24h: {{ engagements_24h }}.
{% for line in counters %}- {{ line }}
{% endfor %}
{% if recent_actions %}## Recent actions
{% for line in recent_actions %}- {{ line }}
{% endfor %}
{% endif %}\
{% if learnings %}## Learnings so far
{% for line in learnings %}- {{ line }}
{% endfor %}
{% endif %}\
Write a short analysis, then a line starting with \"NEW STRATEGY:\" followed by \
the strategy for the next period.";

const RESEARCH_POST_TEMPLATE: &str = "\
Write a short post for the \"{{ category }}\" community about: {{ topic }}.
{% if strategy %}Keep it consistent with this strategy: {{ strategy }}
{% endif %}\
Put the title alone on the first line, then the body. No hashtags.";

const COLLABORATION_TEMPLATE: &str = "\
Write a short, friendly post inviting other writers or agents to collaborate.
{% if strategy %}Current strategy: {{ strategy }}
{% endif %}\
Put the title alone on the first line, then the body.";

const COMMENT_TEMPLATE: &str = "\
Write a one or two sentence reply to this post{% if author %} by {{ author }}{% endif %}. \
Be specific to what it says; no generic praise.

Title: {{ title }}
{{ content }}";

const DECISION_NAME: &str = "decision";
const REFLECTION_NAME: &str = "reflection";
const RESEARCH_POST_NAME: &str = "research_post";
const COLLABORATION_NAME: &str = "collaboration";
const COMMENT_NAME: &str = "comment";

#[derive(Debug, Clone, Default, Serialize)]
pub struct DecisionPrompt {
    pub cycle: u64,
    pub strategy: String,
    pub posts_24h: usize,
    pub engagements_24h: usize,
    pub recent_actions: Vec<String>,
    pub goals: Vec<String>,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReflectionPrompt {
    pub cycle: u64,
    pub strategy: String,
    pub posts_24h: usize,
    pub engagements_24h: usize,
    pub counters: Vec<String>,
    pub recent_actions: Vec<String>,
    pub learnings: Vec<String>,
}

/// Every prompt the agent sends, rendered from inline templates.
pub struct PromptBuilder {
    engine: TeraEngine,
}

impl PromptBuilder {
    pub fn new() -> anyhow::Result<Self> {
        let mut engine = TeraEngine::new();
        engine.add_template(DECISION_NAME, DECISION_TEMPLATE)?;
        engine.add_template(REFLECTION_NAME, REFLECTION_TEMPLATE)?;
        engine.add_template(RESEARCH_POST_NAME, RESEARCH_POST_TEMPLATE)?;
        engine.add_template(COLLABORATION_NAME, COLLABORATION_TEMPLATE)?;
        engine.add_template(COMMENT_NAME, COMMENT_TEMPLATE)?;
        Ok(Self { engine })
    }

    pub fn decision(&self, prompt: &DecisionPrompt) -> anyhow::Result<String> {
        self.engine
            .render(DECISION_NAME, &Context::from_serialize(prompt)?)
    }

    pub fn reflection(&self, prompt: &ReflectionPrompt) -> anyhow::Result<String> {
        self.engine
            .render(REFLECTION_NAME, &Context::from_serialize(prompt)?)
    }

    pub fn research_post(
        &self,
        topic: &str,
        category: &str,
        strategy: &str,
    ) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("topic", topic);
        ctx.insert("category", category);
        ctx.insert("strategy", strategy);
        self.engine.render(RESEARCH_POST_NAME, &ctx)
    }

    pub fn collaboration_invite(&self, strategy: &str) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("strategy", strategy);
        self.engine.render(COLLABORATION_NAME, &ctx)
    }

    pub fn comment(&self, title: &str, content: &str, author: &str) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("title", title);
        ctx.insert("content", content);
        ctx.insert("author", author);
        self.engine.render(COMMENT_NAME, &ctx)
    }
}
