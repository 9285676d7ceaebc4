use crate::extractor::models::{TranscriptResult, VideoId, VideoMetadata};
use anyhow::Result;
use async_trait::async_trait;

/// One strategy for acquiring a transcript
///
/// Implementations search `languages` in order, preferring manually created
/// captions over auto-generated ones, and settle for any available transcript
/// before giving up.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// Short name used in logs and diagnostics (e.g. "caption-service", "yt-dlp")
    fn id(&self) -> &'static str;

    /// Attempt to produce a transcript; the error text becomes this backend's diagnostic
    async fn attempt(&self, video_id: &VideoId, languages: &[String]) -> Result<TranscriptResult>;
}

/// One strategy for acquiring descriptive metadata
#[async_trait]
pub trait MetadataBackend: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata>;
}
