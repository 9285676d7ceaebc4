//! Parser for the json3 timed-caption format
//!
//! Both caption backends receive this format: the captioning service when a
//! track is requested with `fmt=json3`, and yt-dlp with `--sub-format json3`.
//!
//! ```json
//! {"events": [{"tStartMs": 1200, "dDurationMs": 2400, "segs": [{"utf8": "hello"}]}]}
//! ```

use serde::Deserialize;

use crate::extractor::models::TranscriptEntry;
use crate::utils::error::TubescriptError;

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse json3 events into transcript entries.
///
/// Segment texts are trimmed and joined with single spaces; events with no text
/// (window setup, bare line breaks) are skipped.
pub fn parse_events(json: &str) -> Result<Vec<TranscriptEntry>, TubescriptError> {
    let doc: Json3Document = serde_json::from_str(json)
        .map_err(|e| TubescriptError::ParseError(format!("Invalid json3 subtitles: {}", e)))?;

    let entries = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let parts: Vec<&str> = event
                .segs
                .iter()
                .map(|seg| seg.utf8.trim())
                .filter(|t| !t.is_empty())
                .collect();
            if parts.is_empty() {
                return None;
            }
            Some(TranscriptEntry {
                text: parts.join(" "),
                start: millis_to_secs(event.t_start_ms),
                duration: millis_to_secs(event.d_duration_ms),
            })
        })
        .collect();

    Ok(entries)
}

/// Milliseconds to seconds, rounded to two decimals
fn millis_to_secs(ms: u64) -> f64 {
    round2(ms as f64 / 1000.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
