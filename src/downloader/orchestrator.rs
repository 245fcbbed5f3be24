// Orchestrator - loads targets through a backend and runs tier downloads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::errors::DownloadError;
use super::format_selector::{FormatSelector, ResolvedSelections, Selection};
use super::models::{DownloadEvent, Playlist, QualityTier, Stream, Target, Video};
use super::naming::{create_unique_dir, create_unique_file, sanitize_file_name};
use super::traits::{MediaBackend, ProgressEmitter};
use super::url_classifier::{classify, TargetUrl};
use crate::config::{Config, MEDIA_EXTENSION};

/// A looked-up target with its per-tier selections
#[derive(Debug, Clone)]
pub struct LoadedTarget {
    pub target: Target,
    pub selections: ResolvedSelections,
}

pub struct Downloader {
    backend: Arc<dyn MediaBackend>,
    config: Config,
}

impl Downloader {
    pub fn new(backend: Arc<dyn MediaBackend>, config: Config) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classify `input`, fetch the target and resolve every tier
    pub async fn load(&self, input: &str) -> Result<LoadedTarget, DownloadError> {
        let url = classify(input)?;
        log::info!("[Downloader] Loading {} via {}", url.as_str(), self.backend.name());

        let target = match url {
            TargetUrl::Video(url) => Target::Video(self.backend.fetch_video(&url).await?),
            TargetUrl::Playlist(url) => {
                let info = self.backend.fetch_playlist(&url).await?;
                log::info!(
                    "[Downloader] Playlist {:?} has {} videos",
                    info.title,
                    info.entries.len()
                );
                let videos = self.fetch_members(&info.entries).await?;
                Target::Playlist(Playlist::from_info(info, videos))
            }
        };

        let selections = FormatSelector::resolve_selections(&target);
        Ok(LoadedTarget { target, selections })
    }

    /// Look up every member on a bounded pool, keeping playlist order.
    /// The first failure cancels the remaining lookups.
    async fn fetch_members(&self, urls: &[String]) -> Result<Vec<Video>, DownloadError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let semaphore = Arc::clone(&semaphore);
            let backend = Arc::clone(&self.backend);
            let url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| DownloadError::Internal(format!("Worker pool closed: {}", e)))?;
                backend.fetch_video(&url).await.map_err(|e| {
                    log::warn!("[Downloader] Member lookup failed for {}: {}", url, e);
                    e
                })
            });
            handles.push(handle);
        }

        let mut videos = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some(handle) = pending.next() {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(DownloadError::Internal(format!("Member lookup task failed: {}", e))));
            match result {
                Ok(video) => videos.push(video),
                Err(e) => {
                    for rest in pending.by_ref() {
                        rest.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(videos)
    }

    /// Download the selection for `tier` into `destination`.
    ///
    /// Returns the written file (video) or the created directory (playlist).
    pub async fn download(
        &self,
        loaded: &LoadedTarget,
        tier: QualityTier,
        destination: Option<&Path>,
        emitter: &ProgressEmitter,
    ) -> Result<PathBuf, DownloadError> {
        let destination = match destination {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => return Err(DownloadError::NoDestinationSelected),
        };

        let selection = loaded
            .selections
            .get(tier)
            .ok_or(DownloadError::ResolutionUnavailable { tier })?;

        let written = match (&loaded.target, selection) {
            (Target::Video(video), Selection::Single(stream)) => {
                self.download_video(video, stream, destination, emitter).await?
            }
            (Target::Playlist(playlist), Selection::Batch(streams)) => {
                self.download_playlist(playlist, streams, destination, emitter)
                    .await?
            }
            _ => {
                return Err(DownloadError::Internal(
                    "Selection does not match the loaded target".to_string(),
                ))
            }
        };

        emitter.emit(DownloadEvent::Finished {
            destination: written.clone(),
        });
        log::info!("[Downloader] Download completed: {}", written.display());
        Ok(written)
    }

    async fn download_video(
        &self,
        video: &Video,
        stream: &Stream,
        destination: &Path,
        emitter: &ProgressEmitter,
    ) -> Result<PathBuf, DownloadError> {
        let clean_title = sanitize_file_name(&video.title);
        let (name, placeholder) = create_unique_file(destination, &clean_title, MEDIA_EXTENSION)?;
        drop(placeholder);

        let file_name = format!("{}.{}", name, MEDIA_EXTENSION);
        emitter.emit(DownloadEvent::Started {
            file_name: file_name.clone(),
            index: 1,
            total: 1,
        });

        match self
            .backend
            .download_stream(stream, destination, &file_name, emitter)
            .await
        {
            Ok(path) => {
                emitter.emit(DownloadEvent::ItemCompleted {
                    index: 1,
                    total: 1,
                    path: path.clone(),
                });
                Ok(path)
            }
            Err(e) => {
                release_placeholder(&destination.join(&file_name));
                Err(e)
            }
        }
    }

    /// Members are written in playlist order; finished files stay on failure
    async fn download_playlist(
        &self,
        playlist: &Playlist,
        streams: &[Stream],
        destination: &Path,
        emitter: &ProgressEmitter,
    ) -> Result<PathBuf, DownloadError> {
        let dir = create_unique_dir(destination, &sanitize_file_name(&playlist.title))?;
        log::info!("[Downloader] Saving playlist into {}", dir.display());

        let total = streams.len();
        for (i, stream) in streams.iter().enumerate() {
            let index = i + 1;
            let file_name = format!("{}.{}", sanitize_file_name(&stream.title), MEDIA_EXTENSION);
            emitter.emit(DownloadEvent::Started {
                file_name: file_name.clone(),
                index,
                total,
            });

            let path = self
                .backend
                .download_stream(stream, &dir, &file_name, emitter)
                .await?;
            emitter.emit(DownloadEvent::ItemCompleted { index, total, path });
        }

        Ok(dir)
    }
}

/// Remove a claimed name that never received any data
fn release_placeholder(path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => {
            if let Err(e) = std::fs::remove_file(path) {
                log::warn!("[Downloader] Could not remove {}: {}", path.display(), e);
            }
        }
        _ => {}
    }
}
