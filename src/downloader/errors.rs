// Error types for the downloader core and its backends

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::QualityTier;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Input matched neither the playlist nor the video URL pattern
    #[error("Invalid URL {input:?}: expected {patterns}")]
    InvalidUrl { input: String, patterns: String },

    /// The requested tier has no matching stream for this target
    #[error("{tier} is unavailable for this target")]
    ResolutionUnavailable { tier: QualityTier },

    #[error("No download directory selected")]
    NoDestinationSelected,

    /// Anything the extraction tool reported
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lookup task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DownloadError {
    /// True when the URL field was left blank
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::InvalidUrl { input, .. } if input.trim().is_empty())
    }

    /// Short error name shown as the title of the message
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "InvalidUrl",
            Self::ResolutionUnavailable { .. } => "ResolutionUnavailable",
            Self::NoDestinationSelected => "NoDestinationSelected",
            Self::Extraction(e) => e.kind.name(),
            Self::Io(_) => "Io",
            Self::Internal(_) => "Internal",
        }
    }

    /// Message for the user, without the diagnostic details
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUrl { .. } if self.is_empty_input() => "Please provide link.".to_string(),
            Self::InvalidUrl { .. } => "Invalid link.".to_string(),
            Self::ResolutionUnavailable { .. } => "This resolution is unavailable.".to_string(),
            Self::NoDestinationSelected => "Please select a download directory".to_string(),
            Self::Extraction(e) => match e.kind {
                ExtractionKind::Unknown | ExtractionKind::Execution | ExtractionKind::Parse => {
                    e.to_string()
                }
                kind => kind.user_message().to_string(),
            },
            Self::Io(e) => e.to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }

    /// Unexpected failures end the shell; everything else is reported and skipped
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Categories of extraction tool failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionKind {
    PrivateVideo,
    MembersOnly,
    RegionBlocked,
    LiveStream,
    AgeRestricted,
    VideoUnavailable,
    /// Video or playlist does not resolve at all
    Unreachable,
    RateLimited,
    BotDetection,
    NetworkTimeout,
    /// yt-dlp not found on the system
    ToolNotFound,
    /// Tool output could not be parsed
    Parse,
    /// Tool could not be started or waited on
    Execution,
    Unknown,
}

impl ExtractionKind {
    /// Classify raw tool diagnostics. Patterns are checked most specific first.
    pub fn diagnose(error: &str) -> Self {
        let lower = error.to_lowercase();

        if lower.contains("members only")
            || lower.contains("members-only")
            || lower.contains("join this channel")
            || lower.contains("available to members")
        {
            return Self::MembersOnly;
        }

        if lower.contains("private video")
            || lower.contains("video is private")
            || lower.contains("sign in if you've been granted access")
        {
            return Self::PrivateVideo;
        }

        if lower.contains("age-restricted")
            || lower.contains("sign in to confirm your age")
            || lower.contains("age_verification")
        {
            return Self::AgeRestricted;
        }

        if lower.contains("live event will begin")
            || lower.contains("is live")
            || lower.contains("live stream")
            || lower.contains("premieres in")
        {
            return Self::LiveStream;
        }

        if lower.contains("available in your country")
            || lower.contains("blocked in your country")
            || lower.contains("geo restrict")
        {
            return Self::RegionBlocked;
        }

        if lower.contains("incomplete youtube id")
            || lower.contains("playlist does not exist")
            || lower.contains("unable to recognize playlist")
            || lower.contains("unsupported url")
            || lower.contains("http error 404")
        {
            return Self::Unreachable;
        }

        if lower.contains("video unavailable")
            || lower.contains("video has been removed")
            || lower.contains("no longer available")
            || lower.contains("video is unavailable")
        {
            return Self::VideoUnavailable;
        }

        if lower.contains("http error 429") || lower.contains("rate limit") || lower.contains("too many requests") {
            return Self::RateLimited;
        }

        if lower.contains("not a bot") || lower.contains("captcha") || lower.contains("unusual traffic") {
            return Self::BotDetection;
        }

        if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection refused")
            || lower.contains("network unreachable")
        {
            return Self::NetworkTimeout;
        }

        if lower.contains("command not found") {
            return Self::ToolNotFound;
        }

        Self::Unknown
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrivateVideo => "VideoPrivate",
            Self::MembersOnly => "MembersOnly",
            Self::RegionBlocked => "VideoRegionBlocked",
            Self::LiveStream => "LiveStreamError",
            Self::AgeRestricted => "AgeRestrictedError",
            Self::VideoUnavailable => "VideoUnavailable",
            Self::Unreachable => "Unreachable",
            Self::RateLimited => "RateLimited",
            Self::BotDetection => "BotDetection",
            Self::NetworkTimeout => "NetworkTimeout",
            Self::ToolNotFound => "ToolNotFound",
            Self::Parse => "ParseError",
            Self::Execution => "ExecutionError",
            Self::Unknown => "ExtractionError",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PrivateVideo => "Private video",
            Self::MembersOnly => "Members-only content",
            Self::RegionBlocked => "Geographic restriction",
            Self::LiveStream => "Active live stream",
            Self::AgeRestricted => "Age-restricted content",
            Self::VideoUnavailable => "Video unavailable",
            Self::Unreachable => "Unreachable video or playlist",
            Self::RateLimited => "Rate limited by YouTube",
            Self::BotDetection => "Bot detection triggered",
            Self::NetworkTimeout => "Network timeout",
            Self::ToolNotFound => "Tool not found",
            Self::Parse => "Parse error",
            Self::Execution => "Execution error",
            Self::Unknown => "Extraction failed",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PrivateVideo => "Video is private.",
            Self::MembersOnly => "Video is for members only.",
            Self::RegionBlocked => "Video is blocked in your region.",
            Self::LiveStream => "This is an active live stream.",
            Self::AgeRestricted => "This video is age restricted.",
            Self::VideoUnavailable => "Video unavailable.",
            Self::Unreachable => "Video or playlist is unreachable or invalid.",
            Self::RateLimited => "YouTube is rate-limiting requests. Try again later.",
            Self::BotDetection => "YouTube detected automated access. Try again later.",
            Self::NetworkTimeout => "Network timeout: YouTube is not responding.",
            Self::ToolNotFound => "yt-dlp was not found. Install it or set YTDOWNLOADER_YTDLP.",
            Self::Parse => "Could not read the extraction tool output.",
            Self::Execution => "Could not run the extraction tool.",
            Self::Unknown => "Extraction failed.",
        }
    }
}

/// Opaque failure reported by the extraction tool
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .kind.description(), .details)]
pub struct ExtractionError {
    pub kind: ExtractionKind,
    pub details: String,
}

impl ExtractionError {
    pub fn new(kind: ExtractionKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
        }
    }

    pub fn parse(details: impl Into<String>) -> Self {
        Self::new(ExtractionKind::Parse, details)
    }

    pub fn execution(details: impl Into<String>) -> Self {
        Self::new(ExtractionKind::Execution, details)
    }
}

// Raw stderr from the tool
impl From<String> for ExtractionError {
    fn from(s: String) -> Self {
        let kind = ExtractionKind::diagnose(&s);
        let details = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(3)
            .collect::<Vec<_>>()
            .join(" | ");
        Self { kind, details }
    }
}

impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        Self::Extraction(ExtractionError::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_detection() {
        let error = "ERROR: [youtube] abc: Private video. Sign in if you've been granted access";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::PrivateVideo);
    }

    #[test]
    fn test_members_only_detection() {
        let error = "ERROR: Join this channel to get access to members-only content";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::MembersOnly);
    }

    #[test]
    fn test_age_restricted_detection() {
        let error = "Sign in to confirm your age. This video may be inappropriate";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::AgeRestricted);
    }

    #[test]
    fn test_live_detection() {
        let error = "ERROR: [youtube] abc: This live event will begin in 3 hours.";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::LiveStream);
    }

    #[test]
    fn test_geo_detection() {
        let error = "The uploader has not made this video available in your country";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::RegionBlocked);
    }

    #[test]
    fn test_unavailable_detection() {
        let error = "ERROR: [youtube] abc: Video unavailable";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::VideoUnavailable);
    }

    #[test]
    fn test_unreachable_detection() {
        let error = "ERROR: [youtube:tab] The playlist does not exist.";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::Unreachable);
    }

    #[test]
    fn test_status_codes_inside_video_ids_ignored() {
        let error = "ERROR: [youtube] ab404cdEFGH: Video unavailable";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::VideoUnavailable);
        let error = "ERROR: [youtube] x429yzABCDE: Video unavailable";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::VideoUnavailable);
    }

    #[test]
    fn test_http_status_detection() {
        assert_eq!(
            ExtractionKind::diagnose("ERROR: Unable to download webpage: HTTP Error 404: Not Found"),
            ExtractionKind::Unreachable
        );
        assert_eq!(
            ExtractionKind::diagnose("ERROR: HTTP Error 429: Too Many Requests"),
            ExtractionKind::RateLimited
        );
    }

    #[test]
    fn test_missing_output_dir_is_not_tool_missing() {
        let error = "ERROR: unable to open for writing: [Errno 2] No such file or directory: '/gone/a.mp4'";
        assert_eq!(ExtractionKind::diagnose(error), ExtractionKind::Unknown);
    }

    #[test]
    fn test_timeout_detection() {
        assert_eq!(ExtractionKind::diagnose("Timed out after 30s"), ExtractionKind::NetworkTimeout);
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(ExtractionKind::diagnose("something odd"), ExtractionKind::Unknown);
    }

    #[test]
    fn test_from_string_keeps_first_lines() {
        let err = ExtractionError::from("\nERROR: Video unavailable\nline2\nline3\nline4".to_string());
        assert_eq!(err.kind, ExtractionKind::VideoUnavailable);
        assert_eq!(err.details, "ERROR: Video unavailable | line2 | line3");
    }

    #[test]
    fn test_invalid_url_messages() {
        let empty = DownloadError::InvalidUrl {
            input: String::new(),
            patterns: String::new(),
        };
        assert!(empty.is_empty_input());
        assert_eq!(empty.user_message(), "Please provide link.");

        let malformed = DownloadError::InvalidUrl {
            input: "https://example.com".to_string(),
            patterns: String::new(),
        };
        assert!(!malformed.is_empty_input());
        assert_eq!(malformed.user_message(), "Invalid link.");
    }

    #[test]
    fn test_extraction_user_message() {
        let err = DownloadError::from("ERROR: Private video".to_string());
        assert_eq!(err.name(), "VideoPrivate");
        assert_eq!(err.user_message(), "Video is private.");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_only_internal_is_fatal() {
        assert!(DownloadError::Internal("join".to_string()).is_fatal());
        assert!(!DownloadError::NoDestinationSelected.is_fatal());
    }
}
