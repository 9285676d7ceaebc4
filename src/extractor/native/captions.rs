//! Captioning-service backend
//!
//! Talks to the platform's own caption tracks: the watch page lists every
//! available track (language, manual or auto-generated) and each track can be
//! downloaded as json3 timed events.

use crate::extractor::json3;
use crate::extractor::models::{TranscriptEntry, TranscriptResult, TranscriptSource, VideoId};
use crate::extractor::native::watch_page::WatchPageClient;
use crate::extractor::traits::CaptionBackend;
use crate::utils::error::TubescriptError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// One caption track offered for a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub is_generated: bool,
    pub base_url: String,
}

/// Every track offered for a video, in the order the service lists them
#[derive(Debug, Clone, Default)]
pub struct TranscriptList {
    pub video_id: String,
    pub tracks: Vec<CaptionTrack>,
}

impl TranscriptList {
    /// First human-authored track in the earliest matching language
    pub fn find_manually_created(&self, languages: &[String]) -> Option<&CaptionTrack> {
        self.find(languages, false)
    }

    /// First auto-generated track in the earliest matching language
    pub fn find_generated(&self, languages: &[String]) -> Option<&CaptionTrack> {
        self.find(languages, true)
    }

    /// Whatever the service lists first
    pub fn first(&self) -> Option<&CaptionTrack> {
        self.tracks.first()
    }

    fn find(&self, languages: &[String], generated: bool) -> Option<&CaptionTrack> {
        languages.iter().find_map(|lang| {
            self.tracks
                .iter()
                .find(|t| t.is_generated == generated && &t.language_code == lang)
        })
    }

    /// Pick the track to use: manual in any preferred language, then
    /// auto-generated in any preferred language, then anything at all.
    ///
    /// Returns the track with the source and language it is reported under.
    pub fn select(&self, languages: &[String]) -> Option<(&CaptionTrack, TranscriptSource, String)> {
        if let Some(track) = self.find_manually_created(languages) {
            return Some((track, TranscriptSource::Manual, track.language_code.clone()));
        }
        if let Some(track) = self.find_generated(languages) {
            return Some((track, TranscriptSource::AutoGenerated, track.language_code.clone()));
        }
        self.first().map(|track| {
            let source = if track.is_generated {
                TranscriptSource::AutoGenerated
            } else {
                TranscriptSource::Manual
            };
            (track, source, track.language_code.clone())
        })
    }
}

/// A structured captioning service
#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<TranscriptList>;

    async fn fetch(&self, track: &CaptionTrack) -> Result<Vec<TranscriptEntry>>;
}

// ============================================================
// HTTP implementation
// ============================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<RawTrackName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    #[serde(default)]
    text: String,
}

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

/// Caption service backed by the watch page and the timed-text endpoint
#[derive(Debug, Clone)]
pub struct TimedTextClient {
    page: WatchPageClient,
}

impl TimedTextClient {
    pub fn new(page: WatchPageClient) -> Self {
        Self { page }
    }
}

#[async_trait]
impl CaptionService for TimedTextClient {
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<TranscriptList> {
        let html = self.page.fetch_watch_page(video_id).await?;
        let tracks = parse_caption_tracks(&html)?;
        debug!("{} caption tracks listed for {}", tracks.len(), video_id);
        Ok(TranscriptList {
            video_id: video_id.to_string(),
            tracks,
        })
    }

    async fn fetch(&self, track: &CaptionTrack) -> Result<Vec<TranscriptEntry>> {
        let body = self.page.get_text(&json3_url(&track.base_url)).await?;
        Ok(json3::parse_events(&body)?)
    }
}

/// Track URL asking the timed-text endpoint for json3
fn json3_url(base_url: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}fmt=json3", base_url, separator)
}

/// Pull the caption track list embedded in a watch page
pub(crate) fn parse_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>, TubescriptError> {
    let Some(pos) = html.find(CAPTION_TRACKS_KEY) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(TubescriptError::ExtractionError(
                "YouTube is blocking requests from this IP (captcha challenge)".to_string(),
            ));
        }
        return Err(TubescriptError::NoCaptions(
            "Subtitles are disabled for this video".to_string(),
        ));
    };

    // The array is followed by the rest of the player response; only the
    // first JSON value is read.
    let rest = &html[pos + CAPTION_TRACKS_KEY.len()..];
    let raw = serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<RawCaptionTrack>>()
        .next()
        .ok_or_else(|| TubescriptError::ParseError("empty caption track list".to_string()))?
        .map_err(|e| TubescriptError::ParseError(format!("caption track list: {}", e)))?;

    Ok(raw
        .into_iter()
        .map(|t| CaptionTrack {
            is_generated: t.kind.as_deref() == Some("asr"),
            name: t
                .name
                .map(|n| {
                    n.simple_text
                        .unwrap_or_else(|| n.runs.into_iter().map(|r| r.text).collect())
                })
                .unwrap_or_default(),
            language_code: t.language_code,
            base_url: t.base_url,
        })
        .collect())
}

/// Caption backend over any [`CaptionService`]
pub struct CaptionServiceBackend<S> {
    service: S,
}

impl<S: CaptionService> CaptionServiceBackend<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: CaptionService> CaptionBackend for CaptionServiceBackend<S> {
    fn id(&self) -> &'static str {
        "caption-service"
    }

    async fn attempt(&self, video_id: &VideoId, languages: &[String]) -> Result<TranscriptResult> {
        let list = self.service.list_transcripts(video_id).await?;

        let (track, source, language) = list.select(languages).ok_or_else(|| {
            TubescriptError::NoCaptions(format!(
                "No transcript available for video {}. Tried languages: {}. \
                 The video may not have captions enabled.",
                video_id,
                languages.join(", ")
            ))
        })?;
        info!(
            "Using {} {} track \"{}\" for {}",
            source, language, track.name, video_id
        );

        let entries = self.service.fetch(track).await?;
        Ok(TranscriptResult {
            entries,
            language,
            source,
        })
    }
}
