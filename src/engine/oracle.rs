use crate::llm::{OracleRequest, Provider};
use crate::prompt::SYSTEM_PROMPT;

/// The language model as the agent sees it: prompt in, text or nothing out.
///
/// Provider failures are logged and surface as `None`; callers fall back.
pub struct Oracle {
    provider: Box<dyn Provider>,
    model: String,
    temperature: f64,
}

impl Oracle {
    pub fn new(provider: Box<dyn Provider>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    pub async fn ask(&self, user_prompt: &str, max_tokens: u32) -> Option<String> {
        let request = OracleRequest::new(SYSTEM_PROMPT, user_prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(max_tokens);
        match self.provider.complete(&request, &self.model).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!(provider = self.provider.name(), "oracle returned an empty reply");
                None
            }
            Err(error) => {
                tracing::warn!(provider = self.provider.name(), "oracle call failed: {error:#}");
                None
            }
        }
    }
}
