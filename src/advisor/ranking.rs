// RankedAdvisor - deterministic fallback selection
//
// Picks a substitute without any external service:
// - Same media kind as the request beats switching kind
// - Within a kind, the most compatible container wins
// - Unknown tokens come last, ties keep input order

use async_trait::async_trait;

use super::errors::AdvisorError;
use super::models::{FormatDecision, FormatRequest, MediaFormat, MediaKind};
use super::traits::FormatAdvisor;

/// Advisor with a fixed priority order
pub struct RankedAdvisor;

impl RankedAdvisor {
    pub fn new() -> Self {
        Self
    }

    /// Pick the best candidate and explain why
    pub fn rank(request: &FormatRequest) -> Result<FormatDecision, AdvisorError> {
        // Unknown requests are treated as video, the common case for a video site
        let requested_kind = MediaFormat::parse(request.requested_format())
            .map(|f| f.kind())
            .unwrap_or(MediaKind::Video);

        let best = request
            .available_formats()
            .iter()
            .enumerate()
            .max_by_key(|(idx, token)| {
                let (same_kind, compat) = match MediaFormat::parse(token) {
                    Some(f) => (f.kind() == requested_kind, f.compatibility()),
                    None => (false, 0),
                };
                // Reverse index so the earliest entry wins a tie
                (same_kind, compat, std::cmp::Reverse(*idx))
            })
            .map(|(_, token)| token)
            .ok_or_else(|| AdvisorError::InvalidRequest("no available formats".to_string()))?;

        Ok(FormatDecision {
            selected_format: best.clone(),
            reason: Self::explain(request.requested_format(), best, requested_kind),
        })
    }

    fn explain(requested: &str, selected: &str, requested_kind: MediaKind) -> String {
        let requested_label = requested.to_uppercase();
        let selected_label = selected.to_uppercase();
        let parsed = MediaFormat::parse(selected);

        let reason = match parsed {
            Some(f) if f.kind() == requested_kind => format!(
                "{} is not available for this video. {} is the most widely supported {} \
                 format on offer, so it keeps the {} and plays on most devices.",
                requested_label,
                selected_label,
                requested_kind,
                if requested_kind == MediaKind::Video {
                    "picture and sound"
                } else {
                    "audio track"
                },
            ),
            Some(f) => format!(
                "{} is not available and no other {} format is offered. {} is the most \
                 compatible {} format available, so the download will contain {} only.",
                requested_label,
                requested_kind,
                selected_label,
                f.kind(),
                f.kind(),
            ),
            None => format!(
                "{} is not available and none of the offered formats is a known {} format. \
                 {} was the first option offered.",
                requested_label, requested_kind, selected_label,
            ),
        };

        match parsed {
            Some(f) if f.is_lossless() => format!(
                "{} {} is lossless, so expect a much larger file.",
                reason, selected_label
            ),
            _ => reason,
        }
    }
}

impl Default for RankedAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormatAdvisor for RankedAdvisor {
    fn name(&self) -> &'static str {
        "ranked"
    }

    async fn suggest(&self, request: &FormatRequest) -> Result<FormatDecision, AdvisorError> {
        let decision = Self::rank(request)?;
        tracing::debug!(
            requested = %request.requested_format(),
            selected = %decision.selected_format,
            "ranked fallback"
        );
        Ok(decision)
    }
}
