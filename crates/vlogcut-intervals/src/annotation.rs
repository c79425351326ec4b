//! Annotation file parsing.
//!
//! Each source video has one annotation file with lines of the form
//! `[transcript:HH:MM:SS] Speaker: text` or `[keyframe:HH:MM:SS] caption`.
//! Anything else is ignored; malformed timestamps drop only their own line.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use vlogcut_models::{parse_timestamp, TimestampedEvent};

use crate::error::{IntervalError, IntervalResult};

/// Suffix of analysis output files; the prefix is the source id.
pub const PROCESSED_SUFFIX: &str = "_processed.txt";

const MAX_SPEAKER_LEN: usize = 20;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(transcript|keyframe):([^\]]*)\]\s*(.*)$").expect("valid annotation regex")
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Derive a source id from an annotation file name.
///
/// `part1_processed.txt` -> `part1`, `part2.txt` -> `part2`.
pub fn source_id_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if let Some(stem) = name.strip_suffix(PROCESSED_SUFFIX) {
        stem.to_string()
    } else if let Some(stem) = name.strip_suffix(".txt") {
        stem.to_string()
    } else {
        name
    }
}

/// Parse the contents of one annotation file.
pub fn parse_annotation_text(source_id: &str, content: &str) -> Vec<TimestampedEvent> {
    let mut events = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let Some(caps) = LINE_PATTERN.captures(line) else {
            continue;
        };

        let kind = &caps[1];
        let raw_ts = &caps[2];
        let timestamp = match parse_timestamp(raw_ts) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(
                    source = source_id,
                    line = line_no + 1,
                    timestamp = raw_ts,
                    "Skipping line with malformed timestamp: {}",
                    e
                );
                continue;
            }
        };

        let text = strip_markup(&caps[3]);
        if text.is_empty() {
            continue;
        }

        let event = if kind == "transcript" {
            let (speaker, text) = split_speaker(&text);
            if text.is_empty() {
                continue;
            }
            TimestampedEvent::transcript(source_id, timestamp, text, speaker)
        } else {
            TimestampedEvent::keyframe(source_id, timestamp, text)
        };
        events.push(event);
    }

    events
}

fn strip_markup(raw: &str) -> String {
    TAG_PATTERN.replace_all(raw, "").trim().to_string()
}

/// Best-effort speaker attribution.
///
/// A short capitalised first token followed by more text is taken as the
/// speaker; a trailing `:` on the token is dropped.
fn split_speaker(text: &str) -> (Option<String>, String) {
    if text.starts_with('[') {
        return (None, text.to_string());
    }

    let Some((first, rest)) = text.split_once(char::is_whitespace) else {
        return (None, text.to_string());
    };

    let rest = rest.trim();
    let starts_upper = first.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper || first.chars().count() >= MAX_SPEAKER_LEN || rest.is_empty() {
        return (None, text.to_string());
    }

    let speaker = first.trim_end_matches(':');
    if speaker.is_empty() {
        return (None, text.to_string());
    }
    (Some(speaker.to_string()), rest.to_string())
}

/// Annotation files in `dir`, sorted by file name.
///
/// Prefers `*_processed.txt`; falls back to any `*.txt` when none exist.
async fn annotation_files(dir: &Path) -> IntervalResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut processed = Vec::new();
    let mut plain = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(PROCESSED_SUFFIX) {
            processed.push(path);
        } else if name.ends_with(".txt") {
            plain.push(path);
        }
    }

    let mut files = if processed.is_empty() { plain } else { processed };
    files.sort();
    Ok(files)
}

/// Parse every annotation file in a directory.
///
/// Fails only when the directory is missing. Unreadable files contribute
/// no events.
pub async fn parse_annotation_dir(dir: impl AsRef<Path>) -> IntervalResult<Vec<TimestampedEvent>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IntervalError::not_found(dir));
    }

    let files = annotation_files(dir).await?;
    info!(dir = %dir.display(), files = files.len(), "Found annotation files");

    let mut all_events = Vec::new();
    for path in files {
        let source_id = source_id_from_path(&path);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read annotation file, skipping");
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = content {
            warn!(path = %path.display(), "Annotation file is not valid UTF-8, invalid bytes replaced");
        }

        let events = parse_annotation_text(&source_id, &content);
        if events.is_empty() {
            warn!(source = %source_id, "Annotation file yielded no events");
        } else {
            debug!(source = %source_id, events = events.len(), "Loaded annotation events");
        }
        all_events.extend(events);
    }

    Ok(all_events)
}
