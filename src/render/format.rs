use crate::extractor::models::TranscriptEntry;

/// `[MM:SS]` prefix for an entry starting at `start` seconds
pub fn format_timecode(start: f64) -> String {
    let total = start.max(0.0).floor() as u64;
    let minutes = total / 60;
    let seconds = total % 60;
    format!("[{:02}:{:02}]", minutes, seconds)
}

/// Render entries one per line, dropping entries with blank text.
///
/// Order is kept exactly as given.
pub fn format_transcript(entries: &[TranscriptEntry], include_timestamps: bool) -> String {
    entries
        .iter()
        .filter_map(|entry| {
            let text = entry.text.trim();
            if text.is_empty() {
                return None;
            }
            if include_timestamps {
                Some(format!("{} {}", format_timecode(entry.start), text))
            } else {
                Some(text.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
