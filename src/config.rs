// Runtime configuration, read from the environment

use std::path::PathBuf;

/// Fixed container extension for every download
pub const MEDIA_EXTENSION: &str = "mp4";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_WORKERS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Explicit yt-dlp binary; searched for when unset
    pub ytdlp_path: Option<String>,
    pub proxy: Option<String>,
    /// Netscape cookies.txt file
    pub cookies_path: Option<String>,
    /// Browser name for `--cookies-from-browser`
    pub cookies_browser: Option<String>,
    pub timeout_secs: u64,
    /// Size of the playlist member lookup pool
    pub max_workers: usize,
    /// Folder offered before the user picks one
    pub default_destination: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            proxy: None,
            cookies_path: None,
            cookies_browser: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_workers: default_workers(),
            default_destination: dirs::download_dir(),
        }
    }
}

/// min(32, cpus + 4)
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    MAX_WORKERS.min(cpus + 4)
}

impl Config {
    /// Defaults overridden by `YTDOWNLOADER_*` variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = get("YTDOWNLOADER_YTDLP") {
            config.ytdlp_path = Some(path);
        }
        config.proxy = get("YTDOWNLOADER_PROXY");
        config.cookies_path = get("YTDOWNLOADER_COOKIES");
        config.cookies_browser = get("YTDOWNLOADER_COOKIES_BROWSER");

        if let Some(raw) = get("YTDOWNLOADER_TIMEOUT") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => log::warn!("[Config] Ignoring invalid YTDOWNLOADER_TIMEOUT={}", raw),
            }
        }
        if let Some(raw) = get("YTDOWNLOADER_WORKERS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.max_workers = n,
                _ => log::warn!("[Config] Ignoring invalid YTDOWNLOADER_WORKERS={}", raw),
            }
        }

        config
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = Some(path.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_cookies(mut self, path: impl Into<String>) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    pub fn with_cookies_from_browser(mut self, browser: impl Into<String>) -> Self {
        self.cookies_browser = Some(browser.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    pub fn with_default_destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_destination = Some(dir.into());
        self
    }
}
