//! Video identifier extraction from URLs and bare IDs

use lazy_static::lazy_static;
use regex::Regex;

use crate::extractor::models::VideoId;
use crate::utils::error::TubescriptError;

lazy_static! {
    static ref URL_ID_RE: Regex = Regex::new(
        r"(?:youtube\.com/watch\?.*v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})"
    )
    .unwrap();
    static ref BARE_ID_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap();
}

impl VideoId {
    /// Extract the video ID from a watch, short-link, embed, `/v/` or shorts URL,
    /// or accept a bare 11-character ID.
    pub fn parse(input: &str) -> Result<Self, TubescriptError> {
        let input = input.trim();

        if let Some(caps) = URL_ID_RE.captures(input) {
            return Ok(VideoId(caps[1].to_string()));
        }

        if BARE_ID_RE.is_match(input) {
            return Ok(VideoId(input.to_string()));
        }

        Err(TubescriptError::InvalidIdentifier(input.to_string()))
    }
}
