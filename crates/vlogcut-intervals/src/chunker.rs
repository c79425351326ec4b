//! Fixed-width condensation of a source's timeline.

use vlogcut_models::{format_seconds, ContentChunk, EventKind, TimestampedEvent};
use vlogcut_oracle::truncate_chars;

/// Default chunk window width in seconds.
pub const DEFAULT_CHUNK_WIDTH_SECS: f64 = 15.0;

/// Character budget for the rendered digest sent to the oracle.
pub const DEFAULT_DIGEST_CHARS: usize = 2000;

const MAX_ITEMS_PER_CHUNK: usize = 3;
const VISUAL_PREVIEW_CHARS: usize = 50;

/// Condense one source's sorted events into windows of `width_secs`.
///
/// An event at or past `window_start + width_secs` closes the current window
/// and opens the next one. The last window is always emitted.
pub fn chunk_events(events: &[TimestampedEvent], width_secs: f64) -> Vec<ContentChunk> {
    let Some(first) = events.first() else {
        return Vec::new();
    };

    let mut chunks = Vec::new();
    let mut window_start = first.timestamp_secs;
    let mut window: Vec<&TimestampedEvent> = Vec::new();

    for event in events {
        if event.timestamp_secs - window_start >= width_secs {
            if !window.is_empty() {
                chunks.push(condense(&window, window_start, event.timestamp_secs - window_start));
            }
            window_start = event.timestamp_secs;
            window.clear();
        }
        window.push(event);
    }

    if !window.is_empty() {
        let last_ts = events.last().map(|e| e.timestamp_secs).unwrap_or(window_start);
        chunks.push(condense(&window, window_start, last_ts - window_start));
    }

    chunks
}

fn condense(window: &[&TimestampedEvent], start_secs: f64, duration_secs: f64) -> ContentChunk {
    let condensed_text = window
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::Transcript if !e.text.is_empty() => Some(e.attributed_text()),
            EventKind::Transcript => None,
            EventKind::Keyframe => Some(format!(
                "[Visual: {}...]",
                truncate_chars(&e.text, VISUAL_PREVIEW_CHARS)
            )),
        })
        .take(MAX_ITEMS_PER_CHUNK)
        .collect::<Vec<_>>()
        .join(" | ");

    ContentChunk {
        source_id: window[0].source_id.clone(),
        start_secs,
        duration_secs,
        condensed_text,
    }
}

/// Render chunks as `HH:MM:SS (12.0s): text` lines, cut to `max_chars`.
pub fn render_chunks_for_prompt(chunks: &[ContentChunk], max_chars: usize) -> String {
    let rendered = chunks
        .iter()
        .map(|c| {
            format!(
                "{} ({:.1}s): {}",
                format_seconds(c.start_secs),
                c.duration_secs,
                c.condensed_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let truncated = truncate_chars(&rendered, max_chars);
    if truncated.len() < rendered.len() {
        format!("{}...", truncated)
    } else {
        rendered
    }
}
