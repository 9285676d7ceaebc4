use crate::extractor::models::VideoId;
use crate::utils::error::TubescriptError;
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

/// Plain HTTP access to watch pages and caption tracks
#[derive(Debug, Clone)]
pub struct WatchPageClient {
    client: reqwest::Client,
}

impl WatchPageClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TubescriptError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Raw HTML of the video's watch page
    pub async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String> {
        self.get_text(&video_id.watch_url()).await
    }

    /// GET `url` and return the body; non-2xx statuses are errors
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TubescriptError::NetworkError)?
            .error_for_status()
            .map_err(TubescriptError::NetworkError)?;
        let body = response.text().await.map_err(TubescriptError::NetworkError)?;
        Ok(body)
    }
}
