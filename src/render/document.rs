//! Markdown document with a YAML-style header block

use crate::extractor::models::{TranscriptResult, VideoId, VideoMetadata};

/// Appended after the cut when a document exceeds its character ceiling
pub const TRUNCATION_MARKER: &str = "\n\n[... transcript truncated due to length ...]";

/// Assemble header, optional description and transcript into one document.
///
/// Documents longer than `max_chars` characters are cut to exactly `max_chars`
/// and get [`TRUNCATION_MARKER`] appended. The cut counts characters, not bytes,
/// and ignores line boundaries.
pub fn build_document(
    metadata: &VideoMetadata,
    transcript_text: &str,
    transcript: &TranscriptResult,
    video_id: &VideoId,
    max_chars: usize,
) -> String {
    let header = build_header(metadata, transcript, video_id);

    let description_section = match metadata.description.as_deref() {
        Some(desc) if !desc.is_empty() => format!("\n## Description\n\n{}\n", desc),
        _ => String::new(),
    };

    let output = format!(
        "{}\n{}\n## Transcript\n\n{}\n",
        header, description_section, transcript_text
    );

    truncate_chars(output, max_chars)
}

fn build_header(metadata: &VideoMetadata, transcript: &TranscriptResult, video_id: &VideoId) -> String {
    let mut fields = vec![
        format!("title: \"{}\"", quote_escape(&metadata.title)),
        format!("author: \"{}\"", quote_escape(&metadata.author)),
        format!("url: {}", video_id.watch_url()),
        format!("video_id: {}", video_id),
        format!("transcript_language: {}", transcript.language),
        format!("transcript_source: {}", transcript.source),
    ];

    if let Some(date) = metadata.upload_date.as_deref().filter(|d| !d.is_empty()) {
        fields.push(format!("upload_date: {}", format_upload_date(date)));
    }
    if let Some(seconds) = metadata.duration_seconds.filter(|s| *s > 0) {
        fields.push(format!("duration: {}m{}s", seconds / 60, seconds % 60));
    }

    format!("---\n{}\n---", fields.join("\n"))
}

/// `YYYYMMDD` becomes `YYYY-MM-DD`; anything else passes through
fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

fn quote_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn truncate_chars(output: String, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = output[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => output,
    }
}
