use super::compatible::OpenAiCompatibleProvider;
use super::reliable::ReliableProvider;
use super::traits::Provider;
use crate::config::Config;

/// Resolve the API key for a provider.
///
/// Resolution order:
/// 1. Explicit `api_key` (trimmed, ignored if empty)
/// 2. Provider-specific environment variable (e.g. `OPENROUTER_API_KEY`)
/// 3. Generic fallbacks `HERALD_API_KEY`, `API_KEY`
pub fn resolve_api_key(name: &str, explicit_api_key: Option<&str>) -> Option<String> {
    if let Some(key) = explicit_api_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    let provider_env: &[&str] = match name {
        "openrouter" => &["OPENROUTER_API_KEY"],
        "openai" => &["OPENAI_API_KEY"],
        "groq" => &["GROQ_API_KEY"],
        "mistral" => &["MISTRAL_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY"],
        "together" | "together-ai" => &["TOGETHER_API_KEY"],
        _ => &[],
    };

    provider_env
        .iter()
        .chain(["HERALD_API_KEY", "API_KEY"].iter())
        .find_map(|var| {
            std::env::var(var)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

/// Default chat-completions base URL for well-known providers.
pub fn provider_base_url(name: &str) -> Option<&'static str> {
    let url = match name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "mistral" => "https://api.mistral.ai/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "together" | "together-ai" => "https://api.together.xyz/v1",
        "ollama" => "http://localhost:11434/v1",
        _ => return None,
    };
    Some(url)
}

/// Create a boxed [`Provider`] by name.
///
/// `custom:<url>` targets any OpenAI-compatible endpoint. `base_url_override`
/// wins over the provider's default address.
pub fn create_provider(
    name: &str,
    api_key: Option<&str>,
    base_url_override: Option<&str>,
    timeout_secs: u64,
) -> anyhow::Result<Box<dyn Provider>> {
    let base_url = if let Some(url) = base_url_override.filter(|url| !url.trim().is_empty()) {
        url.to_string()
    } else if let Some(url) = name.strip_prefix("custom:") {
        if url.is_empty() {
            anyhow::bail!("Custom provider requires a URL. Format: custom:https://your-api.com");
        }
        url.to_string()
    } else if let Some(url) = provider_base_url(name) {
        url.to_string()
    } else {
        anyhow::bail!("Unknown provider: {name}. Use custom:<url> for other endpoints.");
    };

    let display_name = if name.starts_with("custom:") {
        "custom"
    } else {
        name
    };
    let key = resolve_api_key(display_name, api_key);
    Ok(Box::new(OpenAiCompatibleProvider::new(
        display_name,
        &base_url,
        key.as_deref(),
        timeout_secs,
    )))
}

/// The configured provider plus fallbacks, wrapped in retry/backoff.
pub fn create_resilient_provider(config: &Config) -> anyhow::Result<Box<dyn Provider>> {
    let reliability = &config.reliability;
    let primary_name = config.default_provider.as_deref().unwrap_or("openrouter");
    let timeout = reliability.request_timeout_secs;

    let mut providers: Vec<(String, Box<dyn Provider>)> = vec![(
        primary_name.to_string(),
        create_provider(
            primary_name,
            config.api_key.as_deref(),
            config.oracle_base_url.as_deref(),
            timeout,
        )?,
    )];

    for fallback in &reliability.fallback_providers {
        if fallback == primary_name || providers.iter().any(|(name, _)| name == fallback) {
            continue;
        }
        // Fallbacks use their own env keys; the primary key targets another service.
        match create_provider(fallback, None, None, timeout) {
            Ok(provider) => providers.push((fallback.clone(), provider)),
            Err(e) => {
                tracing::warn!(fallback_provider = fallback.as_str(), "Ignoring invalid fallback provider: {e}");
            }
        }
    }

    Ok(Box::new(ReliableProvider::new(
        providers,
        reliability.oracle_retries,
        reliability.oracle_backoff_ms,
    )))
}
