pub mod advisor;
pub mod session;

pub use advisor::{Advisor, AdvisorConfig, AdvisorError, FormatDecision, FormatRequest, Strategy};
pub use session::{DownloadPlan, DownloadSession, SessionError};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("format_advisor=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
