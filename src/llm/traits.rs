use super::types::OracleRequest;
use std::future::Future;
use std::pin::Pin;

/// Prompt in, free text out.
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "openrouter", "openai").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: &'a OracleRequest,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}
