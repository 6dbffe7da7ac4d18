// Orchestrator with fallback logic

use super::backends::GeminiBackend;
use super::config::{AdvisorConfig, Strategy};
use super::errors::AdvisorError;
use super::models::{FormatDecision, FormatRequest};
use super::prompt::GenerativeAdvisor;
use super::ranking::RankedAdvisor;
use super::traits::FormatAdvisor;

pub struct Advisor {
    advisors: Vec<Box<dyn FormatAdvisor>>,
}

impl Advisor {
    pub fn new() -> Self {
        Self {
            advisors: Vec::new(),
        }
    }

    pub fn add_advisor(&mut self, advisor: Box<dyn FormatAdvisor>) {
        self.advisors.push(advisor);
    }

    /// Build the advisor chain for a strategy
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let mut advisor = Self::new();

        match config.strategy {
            Strategy::Generative => {
                advisor.add_advisor(Box::new(GenerativeAdvisor::new(GeminiBackend::new(config)?)));
            }
            Strategy::Ranked => {
                advisor.add_advisor(Box::new(RankedAdvisor::new()));
            }
            Strategy::Auto => {
                if config.has_api_key() {
                    advisor.add_advisor(Box::new(GenerativeAdvisor::new(GeminiBackend::new(
                        config,
                    )?)));
                } else {
                    tracing::info!("no API key configured, using ranked suggestions only");
                }
                advisor.add_advisor(Box::new(RankedAdvisor::new()));
            }
        }

        tracing::debug!(
            strategy = %config.strategy,
            chain = ?advisor.names(),
            "advisor chain ready"
        );
        Ok(advisor)
    }

    /// Names of the advisors in the order they are tried
    pub fn names(&self) -> Vec<&'static str> {
        self.advisors.iter().map(|a| a.name()).collect()
    }

    /// Ask each advisor in turn until one produces a valid decision
    pub async fn suggest(&self, request: &FormatRequest) -> Result<FormatDecision, AdvisorError> {
        let mut last_error = AdvisorError::AllAdvisorsFailed;

        for advisor in &self.advisors {
            tracing::info!(advisor = advisor.name(), "trying advisor");

            match advisor.suggest(request).await {
                Ok(decision) => {
                    // Advisors validate already; this is the last gate before the caller
                    match request.canonical(&decision.selected_format) {
                        Some(canonical) => {
                            tracing::info!(
                                advisor = advisor.name(),
                                selected = canonical,
                                "suggestion ready"
                            );
                            return Ok(FormatDecision {
                                selected_format: canonical.to_string(),
                                reason: decision.reason,
                            });
                        }
                        None => {
                            tracing::warn!(
                                advisor = advisor.name(),
                                selected = %decision.selected_format,
                                "advisor picked a format that is not available"
                            );
                            last_error = AdvisorError::FormatNotAvailable {
                                selected: decision.selected_format,
                                available: request.available_list(),
                            };
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(advisor = advisor.name(), error = %e, "advisor failed");
                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Use the requested format when it exists, otherwise ask for a substitute
    pub async fn resolve<S, I>(
        &self,
        requested: &str,
        available: I,
    ) -> Result<FormatDecision, AdvisorError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let request = FormatRequest::new(requested, available)?;

        if let Some(canonical) = request.canonical(request.requested_format()) {
            return Ok(FormatDecision {
                selected_format: canonical.to_string(),
                reason: format!("{} is available.", canonical.to_uppercase()),
            });
        }

        self.suggest(&request).await
    }
}

impl Default for Advisor {
    fn default() -> Self {
        Self::new()
    }
}
