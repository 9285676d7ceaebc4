//! Error handling for Tubescript

use std::fmt;
use thiserror::Error;

/// Why a single backend attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub backend: String,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// Main error type for Tubescript
#[derive(Debug, Error)]
pub enum TubescriptError {
    #[error(
        "Could not extract a YouTube video ID from: {0:?}. \
         Please provide a valid YouTube URL or 11-character video ID."
    )]
    InvalidIdentifier(String),

    #[error("{}", render_no_transcript(.video_id, .diagnostics))]
    NoTranscriptAvailable {
        video_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("{0}")]
    BackendUnavailable(String),

    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("{0}")]
    NoCaptions(String),

    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

fn render_no_transcript(video_id: &str, diagnostics: &[Diagnostic]) -> String {
    let mut out = format!(
        "Error: Could not retrieve transcript for video {}.\nAttempted methods:\n",
        video_id
    );
    for diagnostic in diagnostics {
        out.push_str(&format!("  - {}\n", diagnostic));
    }
    out.push_str(
        "\nPossible causes:\n  \
         - The video has no captions/subtitles\n  \
         - The video is private or age-restricted\n  \
         - The requested languages are not available",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transcript_lists_every_attempt() {
        let err = TubescriptError::NoTranscriptAvailable {
            video_id: "dQw4w9WgXcQ".to_string(),
            diagnostics: vec![
                Diagnostic::new("caption-service", "Subtitles are disabled for this video"),
                Diagnostic::new("yt-dlp", "yt-dlp is not installed"),
            ],
        };
        let text = err.to_string();

        assert!(text.starts_with("Error: Could not retrieve transcript for video dQw4w9WgXcQ."));
        assert!(text.contains("  - caption-service: Subtitles are disabled for this video\n"));
        assert!(text.contains("  - yt-dlp: yt-dlp is not installed\n"));
        assert!(text.ends_with("  - The requested languages are not available"));
    }

    #[test]
    fn test_invalid_identifier_quotes_input() {
        let err = TubescriptError::InvalidIdentifier("not a url".to_string());
        assert!(err.to_string().contains("\"not a url\""));
    }
}
