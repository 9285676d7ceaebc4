use crate::extractor::models::{TranscriptResult, VideoId, VideoMetadata};
use crate::extractor::native::{
    CaptionServiceBackend, PageScrapeMetadataBackend, TimedTextClient, WatchPageClient,
};
use crate::extractor::subtitles::YtDlpCaptionBackend;
use crate::extractor::traits::{CaptionBackend, MetadataBackend};
use crate::extractor::ytdlp::{YtDlp, YtDlpMetadataBackend};
use crate::utils::config::AppSettings;
use crate::utils::error::{Diagnostic, TubescriptError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ordered caption backends; the first success wins.
///
/// Backends run one after another, never concurrently, and each runs at most
/// once per request.
pub struct TranscriptAcquirer {
    backends: Vec<Arc<dyn CaptionBackend>>,
}

impl TranscriptAcquirer {
    /// Create an acquirer that tries `backends` in the given order
    pub fn new(backends: Vec<Arc<dyn CaptionBackend>>) -> Self {
        Self { backends }
    }

    /// Captioning service first, yt-dlp second
    pub fn standard(page: WatchPageClient, ytdlp: YtDlp, settings: &AppSettings) -> Self {
        Self::new(vec![
            Arc::new(CaptionServiceBackend::new(TimedTextClient::new(page))),
            Arc::new(YtDlpCaptionBackend::new(ytdlp, settings.subtitle_timeout())),
        ])
    }

    /// Names of the configured backends, in priority order
    pub fn backend_ids(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// Try each backend in turn until one produces a transcript.
    ///
    /// Fails with [`TubescriptError::NoTranscriptAvailable`] carrying one
    /// diagnostic per backend when none does.
    pub async fn acquire(
        &self,
        video_id: &VideoId,
        languages: &[String],
    ) -> Result<TranscriptResult, TubescriptError> {
        let mut diagnostics = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            debug!("Trying caption backend {} for {}", backend.id(), video_id);
            match backend.attempt(video_id, languages).await {
                Ok(result) => {
                    info!(
                        "Caption backend {} succeeded: {} entries, {} ({})",
                        backend.id(),
                        result.entries.len(),
                        result.language,
                        result.source
                    );
                    return Ok(result);
                }
                Err(e) => {
                    let diagnostic = Diagnostic::new(backend.id(), e.to_string());
                    warn!("Caption backend failed: {}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }

        Err(TubescriptError::NoTranscriptAvailable {
            video_id: video_id.to_string(),
            diagnostics,
        })
    }
}

/// Ordered metadata backends that never fail outward
pub struct MetadataAcquirer {
    backends: Vec<Arc<dyn MetadataBackend>>,
}

impl MetadataAcquirer {
    pub fn new(backends: Vec<Arc<dyn MetadataBackend>>) -> Self {
        Self { backends }
    }

    /// yt-dlp info dump first, page scrape second
    pub fn standard(page: WatchPageClient, ytdlp: YtDlp, settings: &AppSettings) -> Self {
        Self::new(vec![
            Arc::new(YtDlpMetadataBackend::new(ytdlp, settings.metadata_timeout())),
            Arc::new(PageScrapeMetadataBackend::new(page)),
        ])
    }

    pub fn backend_ids(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// Metadata from the first backend that succeeds, or placeholders.
    pub async fn acquire(&self, video_id: &VideoId) -> VideoMetadata {
        best_effort(self.try_acquire(video_id).await, video_id)
    }

    async fn try_acquire(&self, video_id: &VideoId) -> anyhow::Result<VideoMetadata> {
        let mut last_error = anyhow::anyhow!("no metadata backends configured");
        for backend in &self.backends {
            match backend.fetch(video_id).await {
                Ok(meta) => {
                    debug!("Metadata backend {} succeeded for {}", backend.id(), video_id);
                    return Ok(meta);
                }
                Err(e) => {
                    debug!("Metadata backend {} failed: {}", backend.id(), e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Swap any metadata failure for placeholder values
fn best_effort(result: anyhow::Result<VideoMetadata>, video_id: &VideoId) -> VideoMetadata {
    result.unwrap_or_else(|e| {
        debug!("Using placeholder metadata for {}: {}", video_id, e);
        VideoMetadata::placeholder(video_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::models::{TranscriptEntry, TranscriptSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        outcome: Option<TranscriptSource>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, outcome: Option<TranscriptSource>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CaptionBackend for Scripted {
        fn id(&self) -> &'static str {
            self.name
        }

        async fn attempt(
            &self,
            _video_id: &VideoId,
            languages: &[String],
        ) -> anyhow::Result<TranscriptResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Some(source) => Ok(TranscriptResult {
                    entries: vec![TranscriptEntry {
                        text: self.name.to_string(),
                        start: 0.0,
                        duration: 1.0,
                    }],
                    language: languages[0].clone(),
                    source,
                }),
                None => Err(anyhow::anyhow!("{} has nothing", self.name)),
            }
        }
    }

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let first = Scripted::new("first", None);
        let second = Scripted::new("second", Some(TranscriptSource::Manual));
        let third = Scripted::new("third", Some(TranscriptSource::AutoGenerated));
        let acquirer = TranscriptAcquirer::new(vec![first.clone(), second.clone(), third.clone()]);

        let result = acquirer.acquire(&id(), &["en".to_string()]).await.unwrap();
        assert_eq!(result.entries[0].text, "second");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failures_are_collected_in_order() {
        let acquirer = TranscriptAcquirer::new(vec![
            Scripted::new("alpha", None),
            Scripted::new("beta", None),
        ]);

        match acquirer.acquire(&id(), &["en".to_string()]).await {
            Err(TubescriptError::NoTranscriptAvailable {
                video_id,
                diagnostics,
            }) => {
                assert_eq!(video_id, "dQw4w9WgXcQ");
                assert_eq!(
                    diagnostics,
                    vec![
                        Diagnostic::new("alpha", "alpha has nothing"),
                        Diagnostic::new("beta", "beta has nothing"),
                    ]
                );
            }
            other => panic!("expected NoTranscriptAvailable, got {:?}", other),
        }
    }

    #[test]
    fn test_standard_backend_order() {
        let settings = AppSettings::default();
        let page = WatchPageClient::new(&settings.user_agent, settings.page_timeout()).unwrap();
        let ytdlp = YtDlp::locate(Some(std::path::Path::new("/opt/tools/yt-dlp")));

        let transcripts = TranscriptAcquirer::standard(page.clone(), ytdlp.clone(), &settings);
        assert_eq!(transcripts.backend_ids(), vec!["caption-service", "yt-dlp"]);

        let metadata = MetadataAcquirer::standard(page, ytdlp, &settings);
        assert_eq!(metadata.backend_ids(), vec!["yt-dlp", "page-scrape"]);
    }

    struct FailingMetadata;

    #[async_trait]
    impl MetadataBackend for FailingMetadata {
        fn id(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _video_id: &VideoId) -> anyhow::Result<VideoMetadata> {
            Err(TubescriptError::Timeout {
                program: "yt-dlp".to_string(),
                seconds: 15,
            }
            .into())
        }
    }

    struct TitledMetadata(&'static str);

    #[async_trait]
    impl MetadataBackend for TitledMetadata {
        fn id(&self) -> &'static str {
            "titled"
        }

        async fn fetch(&self, video_id: &VideoId) -> anyhow::Result<VideoMetadata> {
            let mut meta = VideoMetadata::placeholder(video_id);
            meta.title = self.0.to_string();
            Ok(meta)
        }
    }

    #[tokio::test]
    async fn test_metadata_falls_through_to_next_backend() {
        let acquirer =
            MetadataAcquirer::new(vec![Arc::new(FailingMetadata), Arc::new(TitledMetadata("Scraped"))]);
        let meta = acquirer.acquire(&id()).await;
        assert_eq!(meta.title, "Scraped");
    }

    #[tokio::test]
    async fn test_metadata_degrades_to_placeholders() {
        let acquirer = MetadataAcquirer::new(vec![Arc::new(FailingMetadata), Arc::new(FailingMetadata)]);
        let meta = acquirer.acquire(&id()).await;
        assert_eq!(meta, VideoMetadata::placeholder(&id()));

        let empty = MetadataAcquirer::new(vec![]);
        assert_eq!(empty.acquire(&id()).await.title, "Unknown");
    }
}
