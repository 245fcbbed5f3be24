// Helper functions for backend implementations

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::errors::{DownloadError, ExtractionError, ExtractionKind};
use crate::config::Config;

/// Run command with timeout, collecting stdout and stderr
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ExtractionError::execution(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ExtractionError::execution(format!("Failed to capture stderr from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res
                .map_err(|e| ExtractionError::execution(format!("Failed to wait for {}: {}", program, e)))?;
            let stdout = join_reader(stdout_task, "stdout").await?;
            let stderr = join_reader(stderr_task, "stderr").await?;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ExtractionError::new(
                ExtractionKind::NetworkTimeout,
                format!("Timed out after {}s", timeout_secs),
            )
            .into())
        }
    }
}

async fn join_reader(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    stream: &str,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::Internal(format!("{} reader task failed: {}", stream, e)))?
        .map_err(|e| ExtractionError::execution(format!("Failed to read {}: {}", stream, e)).into())
}

/// Missing binaries get their own kind so the user is told to install yt-dlp
pub fn spawn_error(program: &str, e: std::io::Error) -> DownloadError {
    let kind = if e.kind() == std::io::ErrorKind::NotFound {
        ExtractionKind::ToolNotFound
    } else {
        ExtractionKind::Execution
    };
    ExtractionError::new(kind, format!("Failed to start {}: {}", program, e)).into()
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &Config) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(config: &Config) -> Vec<String> {
    vec!["--socket-timeout".to_string(), config.timeout_secs.to_string()]
}

/// Cookie file wins over browser cookies
pub fn get_cookie_args(config: &Config) -> Vec<String> {
    if let Some(path) = &config.cookies_path {
        vec!["--cookies".to_string(), path.clone()]
    } else if let Some(browser) = &config.cookies_browser {
        vec!["--cookies-from-browser".to_string(), browser.clone()]
    } else {
        Vec::new()
    }
}

/// Network and auth arguments shared by every yt-dlp invocation
pub fn get_common_args(config: &Config) -> Vec<String> {
    let mut args = get_timeout_args(config);
    args.extend(get_proxy_args(config));
    args.extend(get_cookie_args(config));
    args
}
