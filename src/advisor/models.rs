// Common data models for format advisors

use serde::{Deserialize, Serialize};

use super::errors::AdvisorError;
use super::utils::normalize_token;

/// Input of a fallback decision: what the user asked for and what exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFormatRequest")]
pub struct FormatRequest {
    requested_format: String,
    available_formats: Vec<String>,
}

/// Wire form before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormatRequest {
    requested_format: String,
    available_formats: Vec<String>,
}

impl TryFrom<RawFormatRequest> for FormatRequest {
    type Error = AdvisorError;

    fn try_from(raw: RawFormatRequest) -> Result<Self, Self::Error> {
        Self::new(&raw.requested_format, raw.available_formats)
    }
}

impl FormatRequest {
    /// Build a validated request.
    ///
    /// Tokens are trimmed, blanks dropped and case-insensitive duplicates
    /// collapsed (first spelling wins, order kept).
    pub fn new<S, I>(requested: &str, available: I) -> Result<Self, AdvisorError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let requested_format = requested.trim().to_string();
        if requested_format.is_empty() {
            return Err(AdvisorError::InvalidRequest(
                "requested format is empty".to_string(),
            ));
        }

        let mut available_formats: Vec<String> = Vec::new();
        for token in available {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            if available_formats
                .iter()
                .any(|f| f.eq_ignore_ascii_case(token))
            {
                continue;
            }
            available_formats.push(token.to_string());
        }

        if available_formats.is_empty() {
            return Err(AdvisorError::InvalidRequest(
                "no available formats".to_string(),
            ));
        }

        Ok(Self {
            requested_format,
            available_formats,
        })
    }

    pub fn requested_format(&self) -> &str {
        &self.requested_format
    }

    pub fn available_formats(&self) -> &[String] {
        &self.available_formats
    }

    /// Case-insensitive membership in the available set
    pub fn is_available(&self, token: &str) -> bool {
        self.canonical(token).is_some()
    }

    /// Spelling used in `available_formats` for a matching token
    pub fn canonical(&self, token: &str) -> Option<&str> {
        let wanted = normalize_token(token);
        self.available_formats
            .iter()
            .find(|f| normalize_token(f) == wanted)
            .map(String::as_str)
    }

    /// Available formats joined for display and error messages
    pub fn available_list(&self) -> String {
        self.available_formats.join(", ")
    }
}

/// Output of a fallback decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDecision {
    pub selected_format: String,
    pub reason: String,
}

/// Whether a container carries a picture or sound only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Known media format tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Webm,
    Mkv,
    Mov,
    M4a,
    Mp3,
    Aac,
    Opus,
    Ogg,
    Wav,
    Flac,
}

impl MediaFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "mkv" => Some(Self::Mkv),
            "mov" => Some(Self::Mov),
            "m4a" => Some(Self::M4a),
            "mp3" => Some(Self::Mp3),
            "aac" => Some(Self::Aac),
            "opus" => Some(Self::Opus),
            "ogg" => Some(Self::Ogg),
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
            Self::Mov => "mov",
            Self::M4a => "m4a",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Opus => "opus",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Mp4 | Self::Webm | Self::Mkv | Self::Mov => MediaKind::Video,
            _ => MediaKind::Audio,
        }
    }

    /// How widely players and devices accept the format (higher is better)
    pub fn compatibility(&self) -> u8 {
        match self {
            // H.264/AAC in MP4 plays nearly everywhere
            Self::Mp4 => 100,
            Self::Webm => 80,
            Self::Mkv => 60,
            Self::Mov => 50,
            Self::Mp3 => 100,
            Self::M4a => 90,
            Self::Aac => 80,
            Self::Ogg => 60,
            Self::Opus => 55,
            Self::Flac => 50,
            Self::Wav => 40,
        }
    }

    /// Lossless audio keeps full quality at the cost of size
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav)
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video metadata shown before download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub author: String,
    pub thumbnail: String,
}

/// Selectable output resolutions
pub const RESOLUTIONS: [&str; 4] = ["1080p", "720p", "480p", "360p"];

/// Download progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}
