const STRATEGY_MARKER: &str = "new strategy:";

/// Split a reflection reply into its analysis and the new strategy, if the
/// reply carries the `NEW STRATEGY:` marker (any case).
pub fn extract_strategy(reply: &str) -> (String, Option<String>) {
    let lower = reply.to_ascii_lowercase();
    let Some(start) = lower.find(STRATEGY_MARKER) else {
        return (reply.trim().to_string(), None);
    };
    let analysis = reply[..start].trim().to_string();
    let strategy = reply[start + STRATEGY_MARKER.len()..]
        .trim()
        .trim_matches('*')
        .trim()
        .to_string();
    (analysis, (!strategy.is_empty()).then_some(strategy))
}
