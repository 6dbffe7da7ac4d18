// Error types for format advisors

use thiserror::Error;

/// Message shown to the user whenever no suggestion could be produced.
pub const SUGGESTION_UNAVAILABLE: &str =
    "Could not suggest an alternative format. Please try again.";

#[derive(Debug, Clone, Error)]
pub enum AdvisorError {
    /// Request failed local validation (empty tokens, no formats)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generative backend selected but no API key configured
    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    /// Completion service did not answer in time
    #[error("Network timeout: completion service is not responding")]
    NetworkTimeout,

    /// Connection, DNS, TLS or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Completion service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response did not match the decision schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response picked a format outside the available set
    #[error("Selected format '{selected}' is not one of: {available}")]
    FormatNotAvailable { selected: String, available: String },

    /// Model refused to answer (safety filter, recitation)
    #[error("Completion blocked: {0}")]
    Blocked(String),

    /// Bad configuration (proxy URL, config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Advisor chain produced nothing
    #[error("All advisors failed")]
    AllAdvisorsFailed,
}

impl AdvisorError {
    /// Generic text for the presentation layer. Every failure looks the same to the user.
    pub fn user_message(&self) -> &'static str {
        SUGGESTION_UNAVAILABLE
    }

    /// Whether the next advisor in a chain should get a chance
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::NetworkTimeout;
        }

        if e.is_decode() {
            return Self::MalformedResponse(e.to_string());
        }

        if let Some(status) = e.status() {
            return Self::Http {
                status: status.as_u16(),
                body: e.to_string(),
            };
        }

        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}
