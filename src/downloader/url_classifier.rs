// URL classification - decides whether input names a playlist or a single video

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;

/// Playlist page with a 34-character list id
pub const PLAYLIST_URL_PATTERN: &str = r"^(?:https?://)?(?:www\.|m\.)?(?:youtube(?:-nocookie)?\.com|youtu\.be)/playlist\?list=[A-Za-z0-9_-]{34}$";

/// `watch?...v=ID`, `embed/ID`, `v/ID`, `shorts/ID`, `attribution_link?...v=ID` or a bare `/ID`.
/// The 11-character id may only be followed by a query or fragment.
pub const VIDEO_URL_PATTERN: &str = r"^(?:https?://)?(?:www\.|m\.)?(?:youtube(?:-nocookie)?\.com|youtu\.be)/(?:(?:watch|embed|v|shorts)/|embed/v=|(?:watch|embed/watch|attribution_link)\?(?:[^#\s]*?[&?])?v=)?[A-Za-z0-9_-]{11}(?:[?&#]\S*)?$";

lazy_static! {
    static ref PLAYLIST_URL_RE: Regex = Regex::new(PLAYLIST_URL_PATTERN).unwrap();
    static ref VIDEO_URL_RE: Regex = Regex::new(VIDEO_URL_PATTERN).unwrap();
}

/// A classified, normalized URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetUrl {
    Video(String),
    Playlist(String),
}

impl TargetUrl {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Video(url) | Self::Playlist(url) => url,
        }
    }

    pub fn is_playlist(&self) -> bool {
        matches!(self, Self::Playlist(_))
    }
}

/// Prefix `https://` unless the input already carries an http(s) scheme
pub fn normalize_url(input: &str) -> String {
    if input.starts_with("https://") || input.starts_with("http://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    }
}

/// Classify `input` as a playlist or a video URL.
///
/// The playlist pattern is tried first. Both patterns must match the whole
/// string. The returned URL is normalized.
pub fn classify(input: &str) -> Result<TargetUrl, DownloadError> {
    let url = normalize_url(input);

    if PLAYLIST_URL_RE.is_match(&url) {
        return Ok(TargetUrl::Playlist(url));
    }
    if VIDEO_URL_RE.is_match(&url) {
        return Ok(TargetUrl::Video(url));
    }

    Err(DownloadError::InvalidUrl {
        input: input.to_string(),
        patterns: format!("({}) | ({})", PLAYLIST_URL_PATTERN, VIDEO_URL_PATTERN),
    })
}
