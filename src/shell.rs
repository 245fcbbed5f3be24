// Interactive terminal front end
//
// All mutable shell data lives in ShellState; rendering helpers are pure
// functions of that state so they can be tested without a terminal.

use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::downloader::format_selector::ResolvedSelections;
use crate::downloader::{
    DownloadError, DownloadEvent, Downloader, LoadedTarget, Playlist, ProgressEmitter, QualityTier,
    Target, Video,
};

const HELP: &str = "\
Commands:
  <url>            load a YouTube video or playlist
  folder [path]    choose the download folder (no path: your Downloads folder)
  hd | ld | audio  download the loaded target at that quality
  info             show the loaded target again
  help             show this help
  quit             exit";

#[derive(Debug, Default)]
pub struct ShellState {
    pub loaded: Option<LoadedTarget>,
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(String),
    Folder(Option<PathBuf>),
    Download(QualityTier),
    Info,
    Help,
    Quit,
}

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Command::Quit,
        "help" | "?" => Command::Help,
        "info" => Command::Info,
        "folder" | "cd" if rest.is_empty() => Command::Folder(None),
        "folder" | "cd" => Command::Folder(Some(PathBuf::from(rest))),
        _ if rest.is_empty() => match head.parse::<QualityTier>() {
            Ok(tier) => Command::Download(tier),
            Err(_) => Command::Load(line.to_string()),
        },
        _ => Command::Load(line.to_string()),
    }
}

/// 1234567 -> "1,234,567"
pub fn format_views(views: u64) -> String {
    let digits = views.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn render_error(err: &DownloadError) -> String {
    format!("{}: {}", err.name(), err.user_message())
}

fn render_tiers(selections: &ResolvedSelections) -> String {
    QualityTier::ALL
        .iter()
        .map(|&tier| {
            format!(
                "  [{:<5}] {:<29} {}",
                tier.as_str(),
                tier.to_string(),
                selections.size_label(tier)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_video(video: &Video) -> String {
    let mut lines = vec![
        format!("Title:       {}", video.title),
        format!("URL:         {}", video.url),
        format!("Length:      {:.2} minutes", video.length_minutes()),
        format!("Views:       {}", format_views(video.views)),
        format!("Creator:     {}", video.author),
    ];
    if !video.channel_url.is_empty() {
        lines.push(format!("Channel:     {}", video.channel_url));
    }
    if !video.thumbnail_url.is_empty() {
        lines.push(format!("Thumbnail:   {}", video.thumbnail_url));
    }
    if !video.description.is_empty() {
        lines.push(format!("Description:\n{}", video.description));
    }
    lines.join("\n")
}

fn render_playlist(playlist: &Playlist) -> String {
    let mut lines = vec![
        format!("Title:        {}", playlist.title),
        format!("URL:          {}", playlist.url),
        format!("Videos:       {}", playlist.length()),
        format!("Views:        {}", format_views(playlist.views)),
        format!("Owner:        {}", playlist.owner),
    ];
    if !playlist.owner_url.is_empty() {
        lines.push(format!("Owner URL:    {}", playlist.owner_url));
    }
    if let Some(updated) = &playlist.last_updated {
        lines.push(format!("Last updated: {}", updated));
    }
    lines.join("\n")
}

/// Info view of the current state
pub fn render(state: &ShellState) -> String {
    let folder = match &state.destination {
        Some(dir) => format!("Folder: {}", dir.display()),
        None => "Folder: (not selected)".to_string(),
    };

    match &state.loaded {
        None => format!("Paste a YouTube video or playlist link.\n{}", folder),
        Some(loaded) => {
            let info = match &loaded.target {
                Target::Video(video) => render_video(video),
                Target::Playlist(playlist) => render_playlist(playlist),
            };
            format!("{}\n\n{}\n\n{}", info, render_tiers(&loaded.selections), folder)
        }
    }
}

/// One progress line per event; playlists count finished members
pub fn render_event(event: &DownloadEvent, is_playlist: bool) -> Option<String> {
    match event {
        DownloadEvent::Started { file_name, .. } => Some(format!("Downloading {}", file_name)),
        DownloadEvent::Progress(p) if !is_playlist => {
            Some(format!("{}% completed", p.percent.round() as u32))
        }
        DownloadEvent::Progress(_) => None,
        DownloadEvent::ItemCompleted { index, total, .. } if is_playlist => {
            Some(format!("{} of {}", index, total))
        }
        DownloadEvent::ItemCompleted { .. } => None,
        DownloadEvent::Finished { destination } => {
            Some(format!("Download completed: {}", destination.display()))
        }
    }
}

async fn print_events(mut rx: UnboundedReceiver<DownloadEvent>, is_playlist: bool) {
    let mut last_line = String::new();
    while let Some(event) = rx.recv().await {
        if let DownloadEvent::Progress(p) = &event {
            log::debug!("[Shell] {}", p.status);
        }
        if let Some(line) = render_event(&event, is_playlist) {
            // yt-dlp reports several lines per percent
            if line != last_line {
                println!("{}", line);
                last_line = line;
            }
        }
    }
}

/// Apply one command to the state
pub async fn update(
    state: &mut ShellState,
    downloader: &Downloader,
    command: Command,
) -> Result<Flow, DownloadError> {
    match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => println!("{}", HELP),
        Command::Info => println!("{}", render(state)),
        Command::Folder(path) => {
            let chosen = path.or_else(|| downloader.config().default_destination.clone());
            match chosen {
                Some(dir) if dir.is_dir() => {
                    println!("Folder: {}", dir.display());
                    state.destination = Some(dir);
                }
                Some(dir) => println!("Not a directory: {}", dir.display()),
                None => return Err(DownloadError::NoDestinationSelected),
            }
        }
        Command::Load(input) => {
            println!("Loading...");
            let loaded = downloader.load(&input).await?;
            state.loaded = Some(loaded);
            println!("{}", render(state));
        }
        Command::Download(tier) => {
            let loaded = match &state.loaded {
                Some(loaded) => loaded,
                None => {
                    println!("Load a video or playlist first.");
                    return Ok(Flow::Continue);
                }
            };
            let is_playlist = matches!(loaded.target, Target::Playlist(_));

            let (tx, rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(print_events(rx, is_playlist));
            let result = downloader
                .download(loaded, tier, state.destination.as_deref(), &ProgressEmitter::new(tx))
                .await;
            let _ = printer.await;
            result?;
        }
    }
    Ok(Flow::Continue)
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run the read-eval loop. Returns the process exit code.
pub async fn run_shell(downloader: &Downloader, initial_url: Option<String>) -> i32 {
    let mut state = ShellState::default();
    println!("{}", HELP);

    let mut pending = initial_url.map(Command::Load);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => {
                prompt();
                match lines.next_line().await {
                    Ok(Some(line)) => parse_command(&line),
                    Ok(None) => return 0,
                    Err(e) => {
                        log::error!("[Shell] Failed to read input: {}", e);
                        return 1;
                    }
                }
            }
        };

        match update(&mut state, downloader, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => return 0,
            Err(e) if e.is_fatal() => {
                log::error!("[Shell] {}", e);
                eprintln!("{}", render_error(&e));
                return 1;
            }
            Err(e) => {
                log::debug!("[Shell] {:?}", e);
                println!("{}", render_error(&e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{DownloadProgress, Stream, StreamKind};
    use crate::downloader::FormatSelector;

    fn sample_video() -> Video {
        Video {
            id: "dQw4w9WgXcQ".to_string(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            title: "Never Gonna Give You Up".to_string(),
            author: "Rick Astley".to_string(),
            channel_url: String::new(),
            length_seconds: 212,
            views: 1_234_567,
            thumbnail_url: String::new(),
            description: String::new(),
            streams: vec![Stream {
                format_id: "18".to_string(),
                title: "Never Gonna Give You Up".to_string(),
                source_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                resolution: Some("360p".to_string()),
                kind: StreamKind::Video,
                is_progressive: true,
                audio_bitrate: Some("96kbps".to_string()),
                file_size: 5_242_880,
            }],
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("  HD "), Command::Download(QualityTier::High));
        assert_eq!(parse_command("audio"), Command::Download(QualityTier::Audio));
        assert_eq!(parse_command("info"), Command::Info);
        assert_eq!(parse_command("folder"), Command::Folder(None));
        assert_eq!(
            parse_command("folder /tmp/My Videos"),
            Command::Folder(Some(PathBuf::from("/tmp/My Videos")))
        );
        assert_eq!(
            parse_command("youtu.be/dQw4w9WgXcQ"),
            Command::Load("youtu.be/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(parse_command(""), Command::Load(String::new()));
    }

    #[test]
    fn test_format_views() {
        assert_eq!(format_views(0), "0");
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(1000), "1,000");
        assert_eq!(format_views(1_234_567), "1,234,567");
    }

    #[test]
    fn test_render_without_target() {
        let state = ShellState::default();
        let out = render(&state);
        assert!(out.contains("Paste a YouTube"));
        assert!(out.contains("(not selected)"));
    }

    #[test]
    fn test_render_video() {
        let target = Target::Video(sample_video());
        let selections = FormatSelector::resolve_selections(&target);
        let state = ShellState {
            loaded: Some(LoadedTarget { target, selections }),
            destination: Some(PathBuf::from("/tmp")),
        };
        let out = render(&state);
        assert!(out.contains("Length:      3.53 minutes"));
        assert!(out.contains("Views:       1,234,567"));
        assert!(out.contains("Creator:     Rick Astley"));
        assert!(out.contains("5.0 MB"));
        assert!(out.contains("Unavailable"));
        assert!(out.contains("Folder: /tmp"));
    }

    #[test]
    fn test_render_event() {
        let progress = DownloadEvent::Progress(DownloadProgress {
            percent: 41.6,
            status: String::new(),
        });
        assert_eq!(render_event(&progress, false).as_deref(), Some("42% completed"));
        assert_eq!(render_event(&progress, true), None);

        let item = DownloadEvent::ItemCompleted {
            index: 2,
            total: 5,
            path: PathBuf::from("/tmp/x.mp4"),
        };
        assert_eq!(render_event(&item, true).as_deref(), Some("2 of 5"));
        assert_eq!(render_event(&item, false), None);
    }

    #[test]
    fn test_render_error() {
        assert_eq!(
            render_error(&DownloadError::NoDestinationSelected),
            "NoDestinationSelected: Please select a download directory"
        );
        let unavailable = DownloadError::ResolutionUnavailable { tier: QualityTier::High };
        assert_eq!(
            render_error(&unavailable),
            "ResolutionUnavailable: This resolution is unavailable."
        );
    }
}
