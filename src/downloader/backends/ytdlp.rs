// yt-dlp backend - drives the native `yt-dlp` binary as a subprocess
//
// Metadata comes from `--dump-json` (videos) and `--flat-playlist
// --dump-single-json` (playlists). Each yt-dlp format becomes one Stream;
// the format id is handed back verbatim with `-f` when downloading.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use super::itags;
use crate::config::Config;
use crate::downloader::errors::{DownloadError, ExtractionError, ExtractionKind};
use crate::downloader::models::{PlaylistInfo, Stream, StreamKind, Video};
use crate::downloader::traits::{MediaBackend, ProgressEmitter};
use crate::downloader::utils::{get_common_args, run_output_with_timeout, spawn_error};

lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\d+\.?\d*\s*\w+/s))?(?:\s+ETA\s+(\S+))?"
    ).unwrap();
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
}

/// Parse a yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32
/// Returns (percent, status_string)
pub fn parse_ytdlp_progress(line: &str) -> Option<(f32, String)> {
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let status = match (caps.get(3), caps.get(4)) {
            (Some(speed), Some(eta)) => {
                format!("{:.1}% of {} at {} ETA {}", percent, size, speed.as_str(), eta.as_str())
            }
            (Some(speed), None) => format!("{:.1}% of {} at {}", percent, size, speed.as_str()),
            _ => format!("{:.1}% of {}", percent, size),
        };
        return Some((percent, status));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        let short_name: String = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename)
            .chars()
            .take(50)
            .collect();
        return Some((0.0, format!("Starting: {}", short_name)));
    }

    if ALREADY_RE.is_match(line) {
        return Some((100.0, "File already downloaded".to_string()));
    }

    None
}

/// Find yt-dlp binary
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}

/// yt-dlp treats `%` in `-o` as a template marker
fn escape_output_template(path: &str) -> String {
    path.replace('%', "%%")
}

/// "20240131" -> "2024-01-31"; anything else passes through
fn format_upload_date(raw: &str) -> String {
    let parsed = time::format_description::parse("[year][month][day]")
        .ok()
        .and_then(|input| time::Date::parse(raw, &input[..]).ok());
    let formatted = parsed.and_then(|date| {
        time::format_description::parse("[year]-[month]-[day]")
            .ok()
            .and_then(|output| date.format(&output[..]).ok())
    });
    formatted.unwrap_or_else(|| raw.to_string())
}

fn str_field(json: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| json[*k].as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn has_codec(codec: &Value) -> bool {
    codec.as_str().map_or(false, |c| c != "none")
}

/// Map one yt-dlp format entry; formats with neither audio nor video are skipped
fn parse_stream(format: &Value, title: &str, source_url: &str) -> Option<Stream> {
    let format_id = format["format_id"].as_str()?.to_string();
    let has_video = has_codec(&format["vcodec"]);
    let has_audio = has_codec(&format["acodec"]);
    if !has_video && !has_audio {
        return None;
    }

    let itag = itags::parse_itag(&format_id);

    let resolution = if has_video {
        itag.and_then(itags::nominal_resolution)
            .map(str::to_string)
            .or_else(|| format["height"].as_u64().map(|h| format!("{}p", h)))
    } else {
        None
    };

    let audio_bitrate = if has_audio {
        itag.and_then(itags::nominal_audio_bitrate)
            .map(str::to_string)
            .or_else(|| format["abr"].as_f64().map(|abr| format!("{}kbps", abr.round() as u64)))
    } else {
        None
    };

    let file_size = format["filesize"]
        .as_u64()
        .or_else(|| format["filesize_approx"].as_u64())
        .or_else(|| format["filesize_approx"].as_f64().map(|f| f as u64))
        .unwrap_or(0);

    Some(Stream {
        format_id,
        title: title.to_string(),
        source_url: source_url.to_string(),
        resolution,
        kind: if has_video { StreamKind::Video } else { StreamKind::Audio },
        is_progressive: has_video && has_audio,
        audio_bitrate,
        file_size,
    })
}

fn parse_json(stdout: &[u8]) -> Result<Value, DownloadError> {
    let json_str = String::from_utf8_lossy(stdout);
    serde_json::from_str(json_str.trim())
        .map_err(|e| ExtractionError::parse(format!("Invalid JSON: {}", e)).into())
}

/// Parse `--dump-json` output of a single video
pub fn parse_video_json(stdout: &[u8], requested_url: &str) -> Result<Video, DownloadError> {
    let json = parse_json(stdout)?;

    let live_status = json["live_status"].as_str().unwrap_or("");
    if json["is_live"].as_bool() == Some(true) || live_status == "is_live" || live_status == "is_upcoming" {
        return Err(ExtractionError::new(
            ExtractionKind::LiveStream,
            format!("{} is a live stream", requested_url),
        )
        .into());
    }

    let formats = json["formats"]
        .as_array()
        .ok_or_else(|| ExtractionError::parse("No formats array in JSON"))?;

    let title = str_field(&json, &["title"]).unwrap_or_else(|| "Unknown".to_string());
    let url = str_field(&json, &["webpage_url"]).unwrap_or_else(|| requested_url.to_string());
    let streams = formats
        .iter()
        .filter_map(|f| parse_stream(f, &title, &url))
        .collect();

    Ok(Video {
        id: str_field(&json, &["id"]).unwrap_or_default(),
        author: str_field(&json, &["uploader", "channel"]).unwrap_or_else(|| "Unknown".to_string()),
        channel_url: str_field(&json, &["channel_url", "uploader_url"]).unwrap_or_default(),
        length_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
        views: json["view_count"].as_u64().unwrap_or(0),
        thumbnail_url: str_field(&json, &["thumbnail"]).unwrap_or_default(),
        description: str_field(&json, &["description"]).unwrap_or_default(),
        title,
        url,
        streams,
    })
}

/// Parse `--flat-playlist --dump-single-json` output
pub fn parse_playlist_json(stdout: &[u8], requested_url: &str) -> Result<PlaylistInfo, DownloadError> {
    let json = parse_json(stdout)?;

    let entries = json["entries"]
        .as_array()
        .ok_or_else(|| ExtractionError::parse("No entries array in playlist JSON"))?
        .iter()
        .filter_map(|entry| {
            str_field(entry, &["url", "webpage_url"]).or_else(|| {
                entry["id"]
                    .as_str()
                    .map(|id| format!("https://www.youtube.com/watch?v={}", id))
            })
        })
        .collect();

    Ok(PlaylistInfo {
        id: str_field(&json, &["id"]).unwrap_or_default(),
        url: str_field(&json, &["webpage_url"]).unwrap_or_else(|| requested_url.to_string()),
        title: str_field(&json, &["title"]).unwrap_or_else(|| "Unknown".to_string()),
        owner: str_field(&json, &["uploader", "channel"]).unwrap_or_else(|| "Unknown".to_string()),
        owner_url: str_field(&json, &["uploader_url", "channel_url"]).unwrap_or_default(),
        views: json["view_count"].as_u64().unwrap_or(0),
        last_updated: str_field(&json, &["modified_date"]).map(|d| format_upload_date(&d)),
        entries,
    })
}

/// Media backend using the yt-dlp binary
pub struct YtDlpBackend {
    ytdlp_path: String,
    config: Config,
}

impl YtDlpBackend {
    pub fn new(config: Config) -> Self {
        let ytdlp_path = config.ytdlp_path.clone().unwrap_or_else(find_ytdlp);
        log::debug!("[yt-dlp] Using binary {}", ytdlp_path);
        Self { ytdlp_path, config }
    }

    async fn run_json(&self, mut args: Vec<String>, url: &str) -> Result<Vec<u8>, DownloadError> {
        args.extend(get_common_args(&self.config));
        args.push(url.to_string());
        log::debug!("[yt-dlp] {} {}", self.ytdlp_path, args.join(" "));

        // metadata lookups of long playlists take longer than a single socket timeout
        let limit = self.config.timeout_secs.saturating_mul(4);
        let output = run_output_with_timeout(&self.ytdlp_path, args, limit).await?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            log::warn!("[yt-dlp] Lookup of {} failed: {}", url, stderr.trim());
            Err(stderr.into())
        }
    }

    fn download_args(&self, stream: &Stream, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            stream.format_id.clone(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-update".to_string(),
            "--no-warnings".to_string(),
            "--force-overwrites".to_string(),
            "--retries".to_string(),
            "0".to_string(),
            "-o".to_string(),
            escape_output_template(&output.to_string_lossy()),
        ];
        args.extend(get_common_args(&self.config));
        args.push(stream.source_url.clone());
        args
    }
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_video(&self, url: &str) -> Result<Video, DownloadError> {
        let args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        let stdout = self.run_json(args, url).await?;
        parse_video_json(&stdout, url)
    }

    async fn fetch_playlist(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        let args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
        ];
        let stdout = self.run_json(args, url).await?;
        parse_playlist_json(&stdout, url)
    }

    async fn download_stream(
        &self,
        stream: &Stream,
        output_dir: &Path,
        file_name: &str,
        emitter: &ProgressEmitter,
    ) -> Result<PathBuf, DownloadError> {
        let output = output_dir.join(file_name);
        let args = self.download_args(stream, &output);
        log::info!("[yt-dlp] Downloading format {} of {}", stream.format_id, stream.source_url);

        let mut child = TokioCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.ytdlp_path, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractionError::execution("Failed to capture stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractionError::execution("Failed to capture stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some((percent, status)) = parse_ytdlp_progress(&line) {
                emitter.progress(percent, status);
            }
            if line.contains("Destination") || line.contains("ERROR") {
                log::debug!("[yt-dlp] {}", line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ExtractionError::execution(format!("Process error: {}", e)))?;
        let stderr_output = stderr_task
            .await
            .map_err(|e| DownloadError::Internal(format!("stderr task failed: {}", e)))?;

        if status.success() {
            emitter.progress(100.0, "Download completed");
            Ok(output)
        } else {
            log::warn!("[yt-dlp] Download failed: {}", stderr_output.trim());
            Err(stderr_output.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Rick Astley - Never Gonna Give You Up",
        "uploader": "Rick Astley",
        "channel_url": "https://www.youtube.com/channel/UCuAXFkgsw1L7xaCfnd5JJOw",
        "duration": 212,
        "view_count": 1500000000,
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
        "description": "The official video",
        "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "is_live": false,
        "formats": [
            {"format_id": "sb0", "vcodec": "none", "acodec": "none", "height": 45},
            {"format_id": "139", "vcodec": "none", "acodec": "mp4a.40.5", "abr": 48.8, "filesize": 1300000},
            {"format_id": "140", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3400000},
            {"format_id": "251", "vcodec": "none", "acodec": "opus", "abr": 135.1, "filesize_approx": 3600000},
            {"format_id": "18", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "abr": 96.0, "filesize": 11000000},
            {"format_id": "136", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720},
            {"format_id": "22", "vcodec": "avc1.64001F", "acodec": "mp4a.40.2", "height": 720, "filesize_approx": 25000000}
        ]
    }"#;

    const PLAYLIST_JSON: &str = r#"{
        "id": "PL5--8gKSku15-C4mBKRpQVcaat4zwe4Gu",
        "title": "Mix",
        "uploader": "Someone",
        "uploader_url": "https://www.youtube.com/@someone",
        "view_count": 4321,
        "modified_date": "20240131",
        "webpage_url": "https://www.youtube.com/playlist?list=PL5--8gKSku15-C4mBKRpQVcaat4zwe4Gu",
        "entries": [
            {"id": "dQw4w9WgXcQ", "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"},
            {"id": "9bZkp7q19f0"}
        ]
    }"#;

    #[test]
    fn test_parse_video_metadata() {
        let video = parse_video_json(VIDEO_JSON.as_bytes(), "https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.author, "Rick Astley");
        assert_eq!(video.length_seconds, 212);
        assert_eq!(video.views, 1_500_000_000);
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_parse_streams_keeps_order_and_skips_storyboards() {
        let video = parse_video_json(VIDEO_JSON.as_bytes(), "").unwrap();
        let ids: Vec<&str> = video.streams.iter().map(|s| s.format_id.as_str()).collect();
        assert_eq!(ids, vec!["139", "140", "251", "18", "136", "22"]);
    }

    #[test]
    fn test_parse_stream_attributes() {
        let video = parse_video_json(VIDEO_JSON.as_bytes(), "").unwrap();
        let by_id = |id: &str| video.streams.iter().find(|s| s.format_id == id).unwrap();

        let audio = by_id("140");
        assert_eq!(audio.kind, StreamKind::Audio);
        assert!(!audio.is_progressive);
        assert_eq!(audio.audio_bitrate.as_deref(), Some("128kbps"));
        assert_eq!(audio.resolution, None);

        // nominal label wins over the measured 135.1
        assert_eq!(by_id("251").audio_bitrate.as_deref(), Some("160kbps"));
        assert_eq!(by_id("251").file_size, 3_600_000);

        let low = by_id("18");
        assert_eq!(low.kind, StreamKind::Video);
        assert!(low.is_progressive);
        assert_eq!(low.resolution.as_deref(), Some("360p"));

        let adaptive = by_id("136");
        assert!(!adaptive.is_progressive);
        assert_eq!(adaptive.audio_bitrate, None);
        assert_eq!(adaptive.file_size, 0);

        assert_eq!(by_id("22").file_size, 25_000_000);
    }

    #[test]
    fn test_parse_stream_fallbacks() {
        let format: Value = serde_json::json!({
            "format_id": "hls-1080", "vcodec": "avc1", "acodec": "mp4a", "height": 1080, "abr": 127.6
        });
        let stream = parse_stream(&format, "t", "u").unwrap();
        assert_eq!(stream.resolution.as_deref(), Some("1080p"));
        assert_eq!(stream.audio_bitrate.as_deref(), Some("128kbps"));
    }

    #[test]
    fn test_live_stream_rejected() {
        let json = r#"{"id": "x", "is_live": true, "formats": []}"#;
        match parse_video_json(json.as_bytes(), "https://youtu.be/x") {
            Err(DownloadError::Extraction(e)) => assert_eq!(e.kind, ExtractionKind::LiveStream),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        match parse_video_json(b"not json", "") {
            Err(DownloadError::Extraction(e)) => assert_eq!(e.kind, ExtractionKind::Parse),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_playlist() {
        let info = parse_playlist_json(PLAYLIST_JSON.as_bytes(), "").unwrap();
        assert_eq!(info.title, "Mix");
        assert_eq!(info.owner, "Someone");
        assert_eq!(info.views, 4321);
        assert_eq!(info.last_updated.as_deref(), Some("2024-01-31"));
        assert_eq!(
            info.entries,
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                "https://www.youtube.com/watch?v=9bZkp7q19f0".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_upload_date() {
        assert_eq!(format_upload_date("20231105"), "2023-11-05");
        assert_eq!(format_upload_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_progress_parsing() {
        let (percent, status) =
            parse_ytdlp_progress("[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59").unwrap();
        assert_eq!(percent, 12.5);
        assert_eq!(status, "12.5% of 310.04MiB at 374.36KiB/s ETA 11:59");

        let (percent, _) = parse_ytdlp_progress("[download] 100% of   10.00MiB in 00:00:02").unwrap();
        assert_eq!(percent, 100.0);

        let (percent, status) =
            parse_ytdlp_progress("[download] Destination: /tmp/out/My clip.mp4").unwrap();
        assert_eq!(percent, 0.0);
        assert_eq!(status, "Starting: My clip.mp4");

        assert!(parse_ytdlp_progress("[youtube] Extracting URL").is_none());
    }

    #[test]
    fn test_output_template_escaped() {
        assert_eq!(escape_output_template("/tmp/100% legit.mp4"), "/tmp/100%% legit.mp4");
    }

    #[test]
    fn test_download_args() {
        let backend = YtDlpBackend::new(Config::default().with_ytdlp_path("yt-dlp").with_timeout(9));
        let video = parse_video_json(VIDEO_JSON.as_bytes(), "").unwrap();
        let args = backend.download_args(&video.streams[3], Path::new("/tmp/a.mp4"));
        assert_eq!(&args[..2], &["-f".to_string(), "18".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "-o" && w[1] == "/tmp/a.mp4"));
        assert!(args.windows(2).any(|w| w[0] == "--socket-timeout" && w[1] == "9"));
        assert_eq!(args.last().map(String::as_str), Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    }
}
