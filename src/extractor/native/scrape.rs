use crate::extractor::models::{VideoId, VideoMetadata};
use crate::extractor::native::watch_page::WatchPageClient;
use crate::extractor::traits::MetadataBackend;
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"<title>(.*?)</title>").unwrap();
    static ref OWNER_RE: Regex = Regex::new(r#""ownerChannelName":"(.*?)""#).unwrap();
}

const SITE_SUFFIX: &str = " - YouTube";

/// Best-effort metadata from the raw watch page: title and channel name only
pub struct PageScrapeMetadataBackend {
    page: WatchPageClient,
}

impl PageScrapeMetadataBackend {
    pub fn new(page: WatchPageClient) -> Self {
        Self { page }
    }
}

#[async_trait]
impl MetadataBackend for PageScrapeMetadataBackend {
    fn id(&self) -> &'static str {
        "page-scrape"
    }

    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata> {
        let html = self.page.fetch_watch_page(video_id).await?;
        Ok(parse_watch_page(&html, video_id))
    }
}

/// Extract title and author from watch page markup
pub(crate) fn parse_watch_page(html: &str, video_id: &VideoId) -> VideoMetadata {
    let mut meta = VideoMetadata::placeholder(video_id);

    if let Some(caps) = TITLE_RE.captures(html) {
        let title = html_escape::decode_html_entities(&caps[1]).replace(SITE_SUFFIX, "");
        let title = title.trim();
        if !title.is_empty() {
            meta.title = title.to_string();
        }
    }

    if let Some(caps) = OWNER_RE.captures(html) {
        let raw = &caps[1];
        // The value sits inside a JSON string literal, so `\u0026`-style escapes are common.
        let unescaped = serde_json::from_str::<String>(&format!("\"{}\"", raw))
            .unwrap_or_else(|_| raw.to_string());
        let author = html_escape::decode_html_entities(&unescaped).to_string();
        if !author.trim().is_empty() {
            meta.author = author;
        }
    }

    meta
}
