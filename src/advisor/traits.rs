// Advisor and completion backend trait definitions

use async_trait::async_trait;

use super::errors::AdvisorError;
use super::models::{FormatDecision, FormatRequest};

/// Trait for anything that can pick a substitute format
#[async_trait]
pub trait FormatAdvisor: Send + Sync {
    /// Name of the advisor (for logging)
    fn name(&self) -> &'static str;

    /// Pick one of `request.available_formats()` with a user-facing reason
    async fn suggest(&self, request: &FormatRequest) -> Result<FormatDecision, AdvisorError>;
}

/// Prompt text plus the schema the reply has to follow
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub text: String,
    pub response_schema: serde_json::Value,
}

/// Trait for generative text services
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Return the raw reply text
    async fn complete(&self, prompt: &PromptRequest) -> Result<String, AdvisorError>;
}
