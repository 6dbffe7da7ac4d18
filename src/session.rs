// Download session - the caller side of the advisor
//
// Covers what the page does besides drawing: URL check, mocked video
// details, the availability check and a simulated progress feed.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::advisor::{
    Advisor, AdvisorError, DownloadProgress, FormatDecision, FormatRequest, VideoDetails,
    RESOLUTIONS,
};

/// Formats the mocked video offers
pub const MOCK_AVAILABLE_FORMATS: [&str; 2] = ["webm", "mp3"];

pub const DEFAULT_FORMAT: &str = "mp4";
pub const DEFAULT_RESOLUTION: &str = "1080p";
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

const FETCH_DELAY: Duration = Duration::from_millis(1500);
const PLACEHOLDER_THUMBNAIL: &str = "https://picsum.photos/seed/yt-thumb-1/1280/720";

lazy_static! {
    static ref YOUTUBE_URL_RE: Regex = Regex::new(
        r"^(?i)(https?://)?((www|m|music)\.)?(youtube\.com/(watch\?|shorts/|live/|embed/)|youtu\.be/)\S+$"
    )
    .unwrap();
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid URL: please enter a valid YouTube video URL")]
    InvalidUrl(String),

    #[error("Unknown resolution: {0}")]
    InvalidResolution(String),

    /// Advisor failed; the message shown is always the generic one
    #[error("{}", .0.user_message())]
    Suggestion(#[source] AdvisorError),
}

/// What happens when the user presses download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadPlan {
    /// Requested format exists, start right away
    Direct(String),
    /// Requested format is missing; needs user confirmation first
    Fallback {
        requested: String,
        decision: FormatDecision,
    },
}

impl DownloadPlan {
    pub fn format(&self) -> &str {
        match self {
            Self::Direct(format) => format,
            Self::Fallback { decision, .. } => &decision.selected_format,
        }
    }
}

/// Reject anything that is not a YouTube video link
pub fn validate_url(url: &str) -> Result<&str, SessionError> {
    let trimmed = url.trim();
    if trimmed.is_empty() || !YOUTUBE_URL_RE.is_match(trimmed) {
        return Err(SessionError::InvalidUrl(trimmed.to_string()));
    }
    Ok(trimmed)
}

/// Mocked metadata lookup
pub async fn fetch_video_details(url: &str) -> Result<VideoDetails, SessionError> {
    fetch_video_details_after(url, FETCH_DELAY).await
}

async fn fetch_video_details_after(
    url: &str,
    delay: Duration,
) -> Result<VideoDetails, SessionError> {
    let url = validate_url(url)?;
    tracing::info!(url, "fetching video details");

    tokio::time::sleep(delay).await;

    Ok(VideoDetails {
        title: "Journey Through the Cosmos - Epic Space Animation".to_string(),
        author: "AstroVisions".to_string(),
        thumbnail: PLACEHOLDER_THUMBNAIL.to_string(),
    })
}

/// Feed progress from 0 to 100 in 1% steps, one step per tick.
///
/// Stops early when the receiver goes away.
pub async fn simulate_download(
    format: &str,
    tick: Duration,
    tx: mpsc::Sender<DownloadProgress>,
) -> u32 {
    // interval() panics on a zero period
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    let mut percent: u32 = 0;

    loop {
        interval.tick().await;

        let status = if percent >= 100 {
            format!("Downloaded {}", format.to_uppercase())
        } else {
            format!("Downloading {}", format.to_uppercase())
        };

        if tx
            .send(DownloadProgress {
                percent: percent as f32,
                status,
            })
            .await
            .is_err()
        {
            tracing::debug!(percent, "progress receiver dropped");
            return percent;
        }

        if percent >= 100 {
            tracing::info!(format, "simulated download complete");
            return percent;
        }
        percent += 1;
    }
}

/// State of one URL being prepared for download
pub struct DownloadSession {
    advisor: Advisor,
    available_formats: Vec<String>,
    url: Option<String>,
    details: Option<VideoDetails>,
    format: String,
    resolution: String,
}

impl DownloadSession {
    pub fn new(advisor: Advisor) -> Self {
        Self::with_available(advisor, MOCK_AVAILABLE_FORMATS)
    }

    pub fn with_available<S, I>(advisor: Advisor, available: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            advisor,
            available_formats: available.into_iter().map(Into::into).collect(),
            url: None,
            details: None,
            format: DEFAULT_FORMAT.to_string(),
            resolution: DEFAULT_RESOLUTION.to_string(),
        }
    }

    pub async fn load(&mut self, url: &str) -> Result<&VideoDetails, SessionError> {
        self.load_after(url, FETCH_DELAY).await
    }

    async fn load_after(
        &mut self,
        url: &str,
        delay: Duration,
    ) -> Result<&VideoDetails, SessionError> {
        let details = fetch_video_details_after(url, delay).await?;
        self.url = Some(url.trim().to_string());
        Ok(self.details.insert(details))
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn details(&self) -> Option<&VideoDetails> {
        self.details.as_ref()
    }

    pub fn available_formats(&self) -> &[String] {
        &self.available_formats
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    pub fn select_format(&mut self, format: &str) {
        self.format = format.trim().to_ascii_lowercase();
    }

    pub fn select_resolution(&mut self, resolution: &str) -> Result<(), SessionError> {
        let wanted = resolution.trim().to_ascii_lowercase();
        if !RESOLUTIONS.contains(&wanted.as_str()) {
            return Err(SessionError::InvalidResolution(resolution.to_string()));
        }
        self.resolution = wanted;
        Ok(())
    }

    /// Decide which format to download.
    ///
    /// `&mut self` keeps a session to one pending suggestion at a time.
    pub async fn plan(&mut self) -> Result<DownloadPlan, SessionError> {
        let request = FormatRequest::new(&self.format, &self.available_formats)
            .map_err(SessionError::Suggestion)?;

        if let Some(canonical) = request.canonical(request.requested_format()) {
            return Ok(DownloadPlan::Direct(canonical.to_string()));
        }

        tracing::info!(
            requested = %request.requested_format(),
            available = %request.available_list(),
            "requested format missing, asking for a substitute"
        );

        match self.advisor.suggest(&request).await {
            Ok(decision) => Ok(DownloadPlan::Fallback {
                requested: request.requested_format().to_string(),
                decision,
            }),
            Err(e) => {
                tracing::error!(error = %e, "format suggestion failed");
                Err(SessionError::Suggestion(e))
            }
        }
    }

    /// Back to a blank form
    pub fn reset(&mut self) {
        self.url = None;
        self.details = None;
        self.format = DEFAULT_FORMAT.to_string();
        self.resolution = DEFAULT_RESOLUTION.to_string();
    }
}
