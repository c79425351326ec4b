//! Timestamped annotation events.

use serde::{Deserialize, Serialize};

/// Kind of annotation line an event was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Speech-to-text line
    Transcript,
    /// Caption of a sampled frame
    Keyframe,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Transcript => "transcript",
            EventKind::Keyframe => "keyframe",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One annotation event on a source video's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    /// Seconds from the start of the source video
    pub timestamp_secs: f64,
    /// Transcript or keyframe
    pub kind: EventKind,
    /// Event text with markup stripped
    pub text: String,
    /// Originating source video
    pub source_id: String,
    /// Best-effort speaker attribution (transcript only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl TimestampedEvent {
    /// Create a transcript event.
    pub fn transcript(
        source_id: impl Into<String>,
        timestamp_secs: f64,
        text: impl Into<String>,
        speaker: Option<String>,
    ) -> Self {
        Self {
            timestamp_secs,
            kind: EventKind::Transcript,
            text: text.into(),
            source_id: source_id.into(),
            speaker,
        }
    }

    /// Create a keyframe event.
    pub fn keyframe(source_id: impl Into<String>, timestamp_secs: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp_secs,
            kind: EventKind::Keyframe,
            text: text.into(),
            source_id: source_id.into(),
            speaker: None,
        }
    }

    pub fn is_transcript(&self) -> bool {
        self.kind == EventKind::Transcript
    }

    /// Transcript text prefixed by the speaker when one is known.
    pub fn attributed_text(&self) -> String {
        match &self.speaker {
            Some(speaker) => format!("{}: {}", speaker, self.text),
            None => self.text.clone(),
        }
    }
}
