//! yt-dlp wrapper
//!
//! Locates the yt-dlp binary, runs it under a hard time bound, and implements
//! the info-dump metadata backend. The subtitle backend lives in
//! [`subtitles`](crate::extractor::subtitles).

use crate::extractor::models::{VideoId, VideoMetadata};
use crate::extractor::traits::MetadataBackend;
use crate::utils::error::TubescriptError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

/// Longest description kept from the info dump, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const NOT_INSTALLED: &str = "yt-dlp is not installed. Install with: pip install yt-dlp";

/// Handle on a located yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    path: Option<PathBuf>,
}

impl YtDlp {
    /// Use `configured` if given, otherwise search PATH and common locations.
    pub fn locate(configured: Option<&Path>) -> Self {
        let path = match configured {
            Some(p) => Some(p.to_path_buf()),
            None => find_ytdlp(),
        };
        match &path {
            Some(p) => debug!("Using yt-dlp at {}", p.display()),
            None => debug!("yt-dlp not found"),
        }
        Self { path }
    }

    /// Path to the binary, or `BackendUnavailable` when it was not found
    pub fn path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| TubescriptError::BackendUnavailable(NOT_INSTALLED.to_string()).into())
    }

    #[cfg(test)]
    pub(crate) fn unavailable() -> Self {
        Self { path: None }
    }

    /// Run yt-dlp with `args`, killing it if it outlives `limit`
    pub async fn run<I, S>(&self, args: I, limit: Duration) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.path()?;
        run_with_timeout(program, args, limit).await
    }
}

/// Run a program to completion with captured output.
///
/// The child is killed when `limit` elapses; that surfaces as
/// [`TubescriptError::Timeout`]. A missing program surfaces as
/// [`TubescriptError::BackendUnavailable`].
pub async fn run_with_timeout<I, S>(program: &Path, args: I, limit: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string());

    let mut command = AsyncCommand::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!("Running {:?}", command.as_std());

    match tokio::time::timeout(limit, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TubescriptError::BackendUnavailable(format!("{} is not installed", name)).into())
        }
        Ok(Err(e)) => Err(TubescriptError::IoError(e).into()),
        Err(_) => {
            // Dropping the output future killed the child.
            warn!("{} exceeded {}s and was killed", name, limit.as_secs());
            Err(TubescriptError::Timeout {
                program: name,
                seconds: limit.as_secs(),
            }
            .into())
        }
    }
}

/// Turn a non-zero exit into an `ExtractionError` carrying yt-dlp's stderr
pub(crate) fn check_status(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr.trim();
    let message = if message.is_empty() {
        format!("yt-dlp exited with {}", output.status)
    } else {
        message.to_string()
    };
    Err(TubescriptError::ExtractionError(message).into())
}

// ============================================================
// Info-dump metadata backend
// ============================================================

/// Fields read from `yt-dlp --dump-json`
#[derive(Debug, Default, Deserialize)]
struct InfoDump {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    channel_url: Option<String>,
    upload_date: Option<String>,
    duration: Option<f64>,
    description: Option<String>,
    view_count: Option<u64>,
}

/// Metadata from yt-dlp's info dump
pub struct YtDlpMetadataBackend {
    ytdlp: YtDlp,
    timeout: Duration,
}

impl YtDlpMetadataBackend {
    pub fn new(ytdlp: YtDlp, timeout: Duration) -> Self {
        Self { ytdlp, timeout }
    }
}

#[async_trait]
impl MetadataBackend for YtDlpMetadataBackend {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata> {
        let url = video_id.watch_url();
        let output = self
            .ytdlp
            .run(
                ["--dump-json", "--no-download", "--no-warnings", url.as_str()],
                self.timeout,
            )
            .await?;
        check_status(&output)?;

        let json_str = String::from_utf8_lossy(&output.stdout);
        parse_info_dump(&json_str, video_id)
    }
}

/// Map an info-dump record onto [`VideoMetadata`]
pub(crate) fn parse_info_dump(json: &str, video_id: &VideoId) -> Result<VideoMetadata> {
    let dump: InfoDump = serde_json::from_str(json.trim())
        .map_err(|e| TubescriptError::ParseError(format!("Invalid info dump: {}", e)))?;

    let title = non_blank(dump.title).unwrap_or_else(|| VideoMetadata::UNKNOWN.to_string());
    let author = non_blank(dump.uploader)
        .or_else(|| non_blank(dump.channel))
        .unwrap_or_else(|| VideoMetadata::UNKNOWN.to_string());

    Ok(VideoMetadata {
        video_id: video_id.to_string(),
        title,
        author,
        channel_url: non_blank(dump.channel_url),
        upload_date: non_blank(dump.upload_date),
        duration_seconds: dump
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.floor() as u64),
        description: non_blank(dump.description)
            .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect()),
        view_count: dump.view_count,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. System PATH
/// 2. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        return Some(path);
    }

    let common_paths = [
        // macOS Homebrew (Apple Silicon)
        "/opt/homebrew/bin/yt-dlp",
        // macOS Homebrew (Intel)
        "/usr/local/bin/yt-dlp",
        // System
        "/usr/bin/yt-dlp",
        // pip user install
        "~/.local/bin/yt-dlp",
    ];

    for path_str in common_paths {
        let expanded = match path_str.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(path_str),
        };

        if expanded.is_file() {
            return Some(expanded);
        }
    }

    None
}

// ============================================================
// Tests
// ============================================================

/// Stand-in yt-dlp scripts for exercising the real backends
#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use super::YtDlp;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Logs every invocation's arguments on one line and leaves the `-o`
    /// value in `$out` for the rest of the script.
    const PREAMBLE: &str = r#"#!/bin/sh
echo "$*" >> '{log}'
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
"#;

    pub(crate) struct FakeYtDlp {
        pub ytdlp: YtDlp,
        log: PathBuf,
    }

    impl FakeYtDlp {
        /// Write an executable script into `dir` that runs `body` after the preamble
        pub(crate) fn new(dir: &Path, body: &str) -> Self {
            let log = dir.join("invocations.log");
            let script = dir.join("yt-dlp");
            let source = PREAMBLE.replace("{log}", &log.to_string_lossy()) + body;
            std::fs::write(&script, source).expect("write script");
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
            Self {
                ytdlp: YtDlp::locate(Some(&script)),
                log,
            }
        }

        /// One entry per run, each the space-joined argument list
        pub(crate) fn invocations(&self) -> Vec<String> {
            std::fs::read_to_string(&self.log)
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }
}
