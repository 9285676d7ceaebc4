//! Data structures for transcripts and video information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical 11-character video identifier.
///
/// Only constructed through [`VideoId::parse`](crate::extractor::video_id), so every
/// value holds exactly 11 characters from `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(pub(crate) String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    /// Offset from the start of the video, in seconds
    pub start: f64,
    /// Seconds
    pub duration: f64,
}

/// Who produced a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptSource {
    Manual,
    AutoGenerated,
    Unknown,
}

impl TranscriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptSource::Manual => "manual",
            TranscriptSource::AutoGenerated => "auto-generated",
            TranscriptSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transcript produced by one successful backend attempt.
///
/// Entries keep the order the backend returned them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub entries: Vec<TranscriptEntry>,
    pub language: String,
    pub source: TranscriptSource,
}

/// Descriptive video information; always constructible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub channel_url: Option<String>,
    /// Raw `YYYYMMDD`
    pub upload_date: Option<String>,
    pub duration_seconds: Option<u64>,
    /// First 500 characters at most
    pub description: Option<String>,
    pub view_count: Option<u64>,
}

impl VideoMetadata {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Metadata with placeholder title/author and nothing else
    pub fn placeholder(video_id: &VideoId) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: Self::UNKNOWN.to_string(),
            author: Self::UNKNOWN.to_string(),
            channel_url: None,
            upload_date: None,
            duration_seconds: None,
            description: None,
            view_count: None,
        }
    }
}
