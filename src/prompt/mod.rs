mod builder;
mod engine;

pub use builder::{DecisionPrompt, PromptBuilder, ReflectionPrompt, SYSTEM_PROMPT};
pub use engine::TeraEngine;
