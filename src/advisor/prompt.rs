// Prompt template and response validation for the generative advisor
//
// The model owns the choice; this module only shapes the question and
// refuses any answer that breaks the decision schema or picks a format
// that is not on the list.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::errors::AdvisorError;
use super::models::{FormatDecision, FormatRequest};
use super::traits::{CompletionBackend, FormatAdvisor, PromptRequest};
use super::utils::extract_json_block;

/// Render the instruction text sent to the model
pub fn render_prompt(request: &FormatRequest) -> String {
    format!(
        "You are an AI assistant helping a user download a YouTube video.\n\
         \n\
         The user requested the following format: {requested}\n\
         \n\
         The available formats are: {available}\n\
         \n\
         Given that the requested format may not be available, select an appropriate \
         alternative format, considering factors such as quality and compatibility. \
         Explain your reasoning for the selection.\n\
         \n\
         Ensure that the output is valid JSON that conforms to the schema. \
         The selectedFormat MUST be one of the availableFormats.\n",
        requested = request.requested_format(),
        available = request.available_list(),
    )
}

/// Schema the reply must follow
pub fn response_schema(request: &FormatRequest) -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "selectedFormat": {
                "type": "STRING",
                "description": "The format selected for download.",
                "enum": request.available_formats(),
            },
            "reason": {
                "type": "STRING",
                "description": "The reason for selecting this format.",
            },
        },
        "required": ["selectedFormat", "reason"],
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    selected_format: Option<String>,
    reason: Option<String>,
}

/// Validate a raw model reply into a decision.
///
/// Either the whole decision comes back or an error does.
pub fn parse_decision(raw: &str, request: &FormatRequest) -> Result<FormatDecision, AdvisorError> {
    let json = extract_json_block(raw).ok_or_else(|| {
        AdvisorError::MalformedResponse("reply contains no JSON object".to_string())
    })?;

    let decoded: RawDecision = serde_json::from_str(json)?;

    let selected = decoded
        .selected_format
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdvisorError::MalformedResponse("missing selectedFormat".to_string()))?;

    let reason = decoded
        .reason
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdvisorError::MalformedResponse("missing reason".to_string()))?;

    let canonical = request
        .canonical(&selected)
        .ok_or_else(|| AdvisorError::FormatNotAvailable {
            selected: selected.clone(),
            available: request.available_list(),
        })?;

    Ok(FormatDecision {
        selected_format: canonical.to_string(),
        reason,
    })
}

/// Advisor that delegates the choice to a completion backend
pub struct GenerativeAdvisor<B: CompletionBackend> {
    backend: B,
}

impl<B: CompletionBackend> GenerativeAdvisor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: CompletionBackend> FormatAdvisor for GenerativeAdvisor<B> {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    async fn suggest(&self, request: &FormatRequest) -> Result<FormatDecision, AdvisorError> {
        let prompt = PromptRequest {
            text: render_prompt(request),
            response_schema: response_schema(request),
        };

        tracing::debug!(
            backend = self.backend.name(),
            requested = %request.requested_format(),
            available = %request.available_list(),
            "requesting format suggestion"
        );

        let raw = self.backend.complete(&prompt).await?;
        let decision = parse_decision(&raw, request).map_err(|e| {
            tracing::warn!(backend = self.backend.name(), error = %e, "rejected model reply");
            e
        })?;

        tracing::debug!(selected = %decision.selected_format, "model picked format");
        Ok(decision)
    }
}
