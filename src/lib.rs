//! Tubescript library

pub mod app;
pub mod extractor;
pub mod render;
pub mod utils;

// Re-export main types for easier use
pub use app::{TranscriptRequest, TranscriptService};
pub use extractor::{
    CaptionBackend, MetadataAcquirer, MetadataBackend, TranscriptAcquirer, TranscriptEntry,
    TranscriptResult, TranscriptSource, VideoId, VideoMetadata,
};
pub use render::{build_document, format_transcript};
pub use utils::{AppSettings, Diagnostic, TubescriptError};
