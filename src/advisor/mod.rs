// Advisor module - picks a substitute when the requested format is missing

pub mod backends;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod ranking;
pub mod traits;
pub mod utils;

pub use config::{AdvisorConfig, Strategy};
pub use errors::{AdvisorError, SUGGESTION_UNAVAILABLE};
pub use models::{
    DownloadProgress, FormatDecision, FormatRequest, MediaFormat, MediaKind, VideoDetails,
    RESOLUTIONS,
};
pub use orchestrator::Advisor;
pub use prompt::GenerativeAdvisor;
pub use ranking::RankedAdvisor;
pub use traits::{CompletionBackend, FormatAdvisor, PromptRequest};
