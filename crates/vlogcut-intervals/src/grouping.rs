//! Per-source grouping of annotation events.

use std::collections::BTreeMap;

use vlogcut_models::TimestampedEvent;

/// Events keyed by source id, each list ordered by timestamp.
///
/// A `BTreeMap` keeps source iteration order deterministic.
pub type SourceGroups = BTreeMap<String, Vec<TimestampedEvent>>;

/// Partition events by source and sort each source's timeline.
///
/// The sort is stable, so events sharing a timestamp keep file order.
pub fn group_by_source(events: Vec<TimestampedEvent>) -> SourceGroups {
    let mut groups = SourceGroups::new();
    for event in events {
        groups.entry(event.source_id.clone()).or_default().push(event);
    }
    for events in groups.values_mut() {
        events.sort_by(|a, b| a.timestamp_secs.total_cmp(&b.timestamp_secs));
    }
    groups
}

/// Length of a source: the timestamp of its last event.
pub fn source_duration(events: &[TimestampedEvent]) -> f64 {
    events.last().map(|e| e.timestamp_secs).unwrap_or(0.0)
}
