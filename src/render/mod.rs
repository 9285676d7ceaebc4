//! Turning acquired transcripts into the final text document

pub mod document;
pub mod format;

pub use document::{build_document, TRUNCATION_MARKER};
pub use format::{format_timecode, format_transcript};
