// Helper functions shared by advisors and backends

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::AdvisorError;

lazy_static! {
    static ref FENCED_JSON_RE: Regex =
        Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap();
}

/// Trim and lowercase a format token for comparisons
pub fn normalize_token(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}

/// Build an HTTP client with timeout and optional proxy
pub fn build_http_client(
    timeout_secs: u64,
    proxy: Option<&str>,
) -> Result<reqwest::Client, AdvisorError> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| AdvisorError::Config(format!("invalid proxy '{}': {}", proxy_url, e)))?;
        tracing::debug!(proxy = proxy_url, "using proxy for completion requests");
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| AdvisorError::Config(format!("failed to build HTTP client: {}", e)))
}

/// Pull the JSON object out of a model reply.
///
/// Models asked for JSON mostly comply, but some wrap the object in a
/// Markdown fence or add a sentence around it.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    if let Some(caps) = FENCED_JSON_RE.captures(trimmed) {
        return caps.get(1).map(|m| m.as_str());
    }

    // Last resort: outermost braces
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  WebM "), "webm");
        assert_eq!(normalize_token("mp3"), "mp3");
    }

    #[test]
    fn test_extract_plain_json() {
        let raw = r#" {"selectedFormat":"webm","reason":"x"} "#;
        assert_eq!(
            extract_json_block(raw),
            Some(r#"{"selectedFormat":"webm","reason":"x"}"#)
        );
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "Here you go:\n```json\n{\"selectedFormat\": \"mp3\", \"reason\": \"audio\"}\n```\n";
        assert_eq!(
            extract_json_block(raw),
            Some("{\"selectedFormat\": \"mp3\", \"reason\": \"audio\"}")
        );
    }

    #[test]
    fn test_extract_chatty_json() {
        let raw = "Sure! {\"selectedFormat\": \"webm\", \"reason\": \"video\"} Hope that helps.";
        assert_eq!(
            extract_json_block(raw),
            Some("{\"selectedFormat\": \"webm\", \"reason\": \"video\"}")
        );
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_block("I cannot help with that."), None);
        assert_eq!(extract_json_block("} backwards {"), None);
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let result = build_http_client(5, Some("ftp://127.0.0.1:21"));
        assert!(matches!(result, Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_client_without_proxy() {
        assert!(build_http_client(5, None).is_ok());
    }
}
