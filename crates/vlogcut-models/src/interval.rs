//! Content chunks and interval types produced during selection.

use serde::{Deserialize, Serialize};

use crate::timestamp::format_seconds;

/// Prefix of descriptions attached to fallback intervals.
pub const FALLBACK_DESCRIPTION_PREFIX: &str = "Selected segment from";

/// Condensed view of a fixed-width window of one source's events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub source_id: String,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub condensed_text: String,
}

/// Minimum/maximum length of a single interval, derived from the suggested length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalBounds {
    pub suggested: f64,
    pub min: f64,
    pub max: f64,
}

impl IntervalBounds {
    /// `min = max(1, s - 2)`, `max = s + 2`.
    pub fn from_suggested(suggested: f64) -> Self {
        Self {
            suggested,
            min: (suggested - 2.0).max(1.0),
            max: suggested + 2.0,
        }
    }

    pub fn contains(&self, duration: f64) -> bool {
        duration >= self.min && duration <= self.max
    }
}

/// How an interval was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalOrigin {
    Oracle,
    Fallback,
}

/// A proposed interval within one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInterval {
    pub source_id: String,
    pub start_secs: f64,
    pub end_secs: f64,
    pub reason: String,
}

impl CandidateInterval {
    pub fn new(source_id: impl Into<String>, start_secs: f64, end_secs: f64, reason: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            start_secs,
            end_secs,
            reason: reason.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Half-open overlap test; touching intervals do not overlap.
    pub fn overlaps(&self, other: &CandidateInterval) -> bool {
        self.source_id == other.source_id
            && self.start_secs < other.end_secs
            && other.start_secs < self.end_secs
    }
}

/// An interval accepted into the final plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedInterval {
    /// 1-based position in the final ordering
    pub index: u32,
    pub source_id: String,
    pub start_secs: f64,
    pub end_secs: f64,
    pub description: String,
    pub origin: IntervalOrigin,
}

impl SelectedInterval {
    pub fn from_candidate(index: u32, candidate: CandidateInterval, origin: IntervalOrigin) -> Self {
        Self {
            index,
            source_id: candidate.source_id,
            start_secs: candidate.start_secs,
            end_secs: candidate.end_secs,
            description: candidate.reason,
            origin,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn start_time(&self) -> String {
        format_seconds(self.start_secs)
    }

    pub fn end_time(&self) -> String {
        format_seconds(self.end_secs)
    }

    /// Whether the description is missing, too short, or a fallback placeholder.
    pub fn needs_description(&self) -> bool {
        let desc = self.description.trim();
        desc.chars().count() <= 10 || desc.starts_with(FALLBACK_DESCRIPTION_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_suggested() {
        let b = IntervalBounds::from_suggested(5.0);
        assert_eq!(b.min, 3.0);
        assert_eq!(b.max, 7.0);

        let b = IntervalBounds::from_suggested(2.0);
        assert_eq!(b.min, 1.0);
        assert_eq!(b.max, 4.0);
        assert!(b.contains(1.0));
        assert!(!b.contains(4.5));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = CandidateInterval::new("p1", 0.0, 5.0, "");
        let b = CandidateInterval::new("p1", 5.0, 10.0, "");
        let c = CandidateInterval::new("p1", 4.0, 6.0, "");
        let d = CandidateInterval::new("p2", 0.0, 5.0, "");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_needs_description() {
        let mut s = SelectedInterval::from_candidate(
            1,
            CandidateInterval::new("p1", 0.0, 5.0, "Selected segment from p1"),
            IntervalOrigin::Fallback,
        );
        assert!(s.needs_description());

        s.description = "short".into();
        assert!(s.needs_description());

        s.description = "Key dialogue where the team celebrates".into();
        assert!(!s.needs_description());
    }
}
