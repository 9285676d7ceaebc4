pub mod acquirer;
pub mod json3;
pub mod models;
pub mod native;
pub mod subtitles;
pub mod traits;
pub mod video_id;
pub mod ytdlp;

pub use acquirer::{MetadataAcquirer, TranscriptAcquirer};
pub use models::{TranscriptEntry, TranscriptResult, TranscriptSource, VideoId, VideoMetadata};
pub use subtitles::YtDlpCaptionBackend;
pub use traits::{CaptionBackend, MetadataBackend};
pub use ytdlp::{YtDlp, YtDlpMetadataBackend};
