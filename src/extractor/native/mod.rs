//! Backends that talk to the platform over HTTP, without external tools

pub mod captions;
pub mod scrape;
pub mod watch_page;

pub use captions::{CaptionService, CaptionServiceBackend, CaptionTrack, TimedTextClient, TranscriptList};
pub use scrape::PageScrapeMetadataBackend;
pub use watch_page::WatchPageClient;
