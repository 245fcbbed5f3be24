// Common data models for downloader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Whether a stream carries picture or only sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// The three download presets offered for every target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    /// 720p progressive video
    High,
    /// 360p progressive video
    Low,
    /// Audio-only at 128kbps
    Audio,
}

impl QualityTier {
    /// Display order used by the shell
    pub const ALL: [QualityTier; 3] = [Self::High, Self::Low, Self::Audio];

    /// The stream attributes this tier asks for
    pub fn filter(&self) -> StreamFilter {
        match self {
            Self::High => StreamFilter {
                resolution: Some("720p"),
                kind: StreamKind::Video,
                progressive: true,
                audio_bitrate: None,
            },
            Self::Low => StreamFilter {
                resolution: Some("360p"),
                kind: StreamKind::Video,
                progressive: true,
                audio_bitrate: None,
            },
            Self::Audio => StreamFilter {
                resolution: None,
                kind: StreamKind::Audio,
                progressive: false,
                audio_bitrate: Some("128kbps"),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "hd",
            Self::Low => "ld",
            Self::Audio => "audio",
        }
    }

    /// Frame title shown next to the tier
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Highest resolution",
            Self::Low => "Lowest resolution",
            Self::Audio => "Audio only",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filter().resolution {
            Some(res) => write!(f, "{} ({})", self.label(), res),
            None => write!(f, "{}", self.label()),
        }
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hd" | "high" | "720p" => Ok(Self::High),
            "ld" | "low" | "360p" => Ok(Self::Low),
            "audio" | "mp3" => Ok(Self::Audio),
            other => Err(format!("Unknown quality tier: {}", other)),
        }
    }
}

/// Attribute filter for stream selection.
///
/// `None` fields are "don't care" and are not compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFilter {
    pub resolution: Option<&'static str>,
    pub kind: StreamKind,
    pub progressive: bool,
    pub audio_bitrate: Option<&'static str>,
}

impl StreamFilter {
    pub fn matches(&self, stream: &Stream) -> bool {
        if let Some(res) = self.resolution {
            if stream.resolution.as_deref() != Some(res) {
                return false;
            }
        }
        if let Some(abr) = self.audio_bitrate {
            if stream.audio_bitrate.as_deref() != Some(abr) {
                return false;
            }
        }
        stream.kind == self.kind && stream.is_progressive == self.progressive
    }
}

/// One downloadable variant of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Extraction tool format id (the YouTube itag)
    pub format_id: String,
    /// Title of the video this stream belongs to
    pub title: String,
    /// Page URL handed back to the extraction tool when downloading
    pub source_url: String,
    /// e.g. "720p"; `None` for audio-only streams
    pub resolution: Option<String>,
    pub kind: StreamKind,
    /// Audio and video multiplexed together
    pub is_progressive: bool,
    /// e.g. "128kbps"; `None` for video-only streams
    pub audio_bitrate: Option<String>,
    pub file_size: u64,
}

/// A single video with its available streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: String,
    pub channel_url: String,
    pub length_seconds: u64,
    pub views: u64,
    pub thumbnail_url: String,
    pub description: String,
    pub streams: Vec<Stream>,
}

impl Video {
    /// Length in minutes, rounded to two decimals
    pub fn length_minutes(&self) -> f64 {
        (self.length_seconds as f64 / 60.0 * 100.0).round() / 100.0
    }
}

/// Playlist metadata plus the member URLs, before members are looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub url: String,
    pub title: String,
    pub owner: String,
    pub owner_url: String,
    pub views: u64,
    pub last_updated: Option<String>,
    pub entries: Vec<String>,
}

/// A playlist with every member video resolved, in playlist order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub url: String,
    pub title: String,
    pub owner: String,
    pub owner_url: String,
    pub views: u64,
    pub last_updated: Option<String>,
    pub videos: Vec<Video>,
}

impl Playlist {
    pub fn from_info(info: PlaylistInfo, videos: Vec<Video>) -> Self {
        Self {
            id: info.id,
            url: info.url,
            title: info.title,
            owner: info.owner,
            owner_url: info.owner_url,
            views: info.views,
            last_updated: info.last_updated,
            videos,
        }
    }

    pub fn length(&self) -> usize {
        self.videos.len()
    }
}

/// The user-specified download unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Target {
    Video(Video),
    Playlist(Playlist),
}

impl Target {
    pub fn url(&self) -> &str {
        match self {
            Self::Video(video) => &video.url,
            Self::Playlist(playlist) => &playlist.url,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Video(video) => &video.title,
            Self::Playlist(playlist) => &playlist.title,
        }
    }
}

/// Download progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Events emitted while a download runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DownloadEvent {
    /// A stream started downloading; `index` is 1-based
    Started {
        file_name: String,
        index: usize,
        total: usize,
    },
    Progress(DownloadProgress),
    /// A stream finished; playlists report "{index} of {total}"
    ItemCompleted {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// Every stream is on disk under `destination`
    Finished { destination: PathBuf },
}
