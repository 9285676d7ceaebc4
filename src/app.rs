//! Request handling: identifier, transcript, metadata, document

use crate::extractor::models::{VideoId, VideoMetadata};
use crate::extractor::native::WatchPageClient;
use crate::extractor::{MetadataAcquirer, TranscriptAcquirer, YtDlp};
use crate::render::{build_document, format_transcript};
use crate::utils::config::AppSettings;
use crate::utils::error::TubescriptError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters of one transcript request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptRequest {
    /// Video URL in any supported shape, or a bare video ID
    pub url: String,

    /// Language preference, most preferred first
    #[serde(default)]
    pub languages: Option<Vec<String>>,

    #[serde(default)]
    pub include_timestamps: bool,

    #[serde(default = "default_include_metadata")]
    pub include_metadata: bool,
}

fn default_include_metadata() -> bool {
    true
}

impl TranscriptRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            languages: None,
            include_timestamps: false,
            include_metadata: true,
        }
    }

    /// Parse a request from tool-call JSON; unknown fields are rejected
    pub fn from_json(json: &str) -> Result<Self, TubescriptError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The URL with whitespace and surrounding `<...>` removed
    fn cleaned_url(&self) -> &str {
        let url = self.url.trim();
        url.strip_prefix('<')
            .and_then(|u| u.strip_suffix('>'))
            .unwrap_or(url)
            .trim()
    }
}

/// Runs requests against a fixed set of backends and settings
pub struct TranscriptService {
    settings: Arc<AppSettings>,
    transcripts: TranscriptAcquirer,
    metadata: MetadataAcquirer,
}

impl TranscriptService {
    pub fn new(
        settings: Arc<AppSettings>,
        transcripts: TranscriptAcquirer,
        metadata: MetadataAcquirer,
    ) -> Self {
        Self {
            settings,
            transcripts,
            metadata,
        }
    }

    /// Wire up the production backends around one HTTP client and one yt-dlp handle
    pub fn from_settings(settings: Arc<AppSettings>) -> Result<Self, TubescriptError> {
        let page = WatchPageClient::new(&settings.user_agent, settings.page_timeout())?;
        let ytdlp = YtDlp::locate(settings.ytdlp_path.as_deref());

        let transcripts = TranscriptAcquirer::standard(page.clone(), ytdlp.clone(), &settings);
        let metadata = MetadataAcquirer::standard(page, ytdlp, &settings);
        debug!(
            "Caption backends: {}; metadata backends: {}",
            transcripts.backend_ids().join(" -> "),
            metadata.backend_ids().join(" -> ")
        );
        Ok(Self::new(settings, transcripts, metadata))
    }

    /// Build the transcript document for `request`.
    ///
    /// Only an unusable identifier or a transcript no backend could produce
    /// is an error; metadata problems degrade to placeholders.
    pub async fn get_transcript(&self, request: &TranscriptRequest) -> Result<String, TubescriptError> {
        let video_id = VideoId::parse(request.cleaned_url())?;
        let languages = self.settings.resolve_languages(request.languages.as_deref());
        info!("Fetching transcript for {} ({})", video_id, languages.join(","));

        let transcript = self.transcripts.acquire(&video_id, &languages).await?;
        let text = format_transcript(&transcript.entries, request.include_timestamps);

        let metadata = if request.include_metadata {
            self.metadata.acquire(&video_id).await
        } else {
            VideoMetadata::placeholder(&video_id)
        };

        Ok(build_document(
            &metadata,
            &text,
            &transcript,
            &video_id,
            self.settings.max_document_chars,
        ))
    }

    /// Like [`get_transcript`](Self::get_transcript), with errors rendered as the response text
    pub async fn respond(&self, request: &TranscriptRequest) -> String {
        response_text(self.get_transcript(request).await)
    }
}

/// The text a caller receives: the document, or the error's message
pub fn response_text(result: Result<String, TubescriptError>) -> String {
    match result {
        Ok(document) => document,
        Err(e) => e.to_string(),
    }
}
