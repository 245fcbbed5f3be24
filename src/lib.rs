pub mod config;
pub mod downloader;
pub mod logging;
pub mod shell;

use std::sync::Arc;

use clap::Parser;

use config::Config;
use downloader::backends::YtDlpBackend;
use downloader::Downloader;

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Video or playlist URL to load before the prompt appears
    pub url: Option<String>,
}

/// Entry point of the terminal app. Returns the exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    logging::init_logging();
    let config = Config::from_env();
    let backend = Arc::new(YtDlpBackend::new(config.clone()));
    let downloader = Downloader::new(backend, config);

    log::info!("[App] Starting ytdownloader {}", env!("CARGO_PKG_VERSION"));
    shell::run_shell(&downloader, cli.url).await
}
