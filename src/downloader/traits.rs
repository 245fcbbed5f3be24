// Media backend trait definition

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use super::errors::DownloadError;
use super::models::{DownloadEvent, DownloadProgress, PlaylistInfo, Stream, Video};

/// Trait for the extraction tool that resolves and downloads media
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Metadata and streams of a single video
    async fn fetch_video(&self, url: &str) -> Result<Video, DownloadError>;

    /// Playlist metadata and the ordered member URLs
    async fn fetch_playlist(&self, url: &str) -> Result<PlaylistInfo, DownloadError>;

    /// Download one stream to `output_dir/file_name`, returning the written path
    async fn download_stream(
        &self,
        stream: &Stream,
        output_dir: &Path,
        file_name: &str,
        emitter: &ProgressEmitter,
    ) -> Result<PathBuf, DownloadError>;
}

/// Progress emitter helper
#[derive(Debug, Clone, Default)]
pub struct ProgressEmitter {
    sender: Option<UnboundedSender<DownloadEvent>>,
}

impl ProgressEmitter {
    pub fn new(sender: UnboundedSender<DownloadEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Emitter that drops every event
    pub fn silent() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: DownloadEvent) {
        if let Some(sender) = &self.sender {
            // receiver gone means nobody is watching any more
            let _ = sender.send(event);
        }
    }

    pub fn progress(&self, percent: f32, status: impl Into<String>) {
        self.emit(DownloadEvent::Progress(DownloadProgress {
            percent,
            status: status.into(),
        }));
    }
}
