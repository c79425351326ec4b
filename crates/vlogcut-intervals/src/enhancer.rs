//! Caption generation for intervals with placeholder descriptions.

use tracing::{debug, info, warn};

use vlogcut_models::{EventKind, SelectedInterval};
use vlogcut_oracle::{truncate_chars, DescribeRequest, IntervalOracle};

use crate::grouping::SourceGroups;
use crate::metrics::record_description_fallback;

const MAX_CONTEXT_EVENTS: usize = 10;
const MAX_DIALOGUE_ITEMS: usize = 5;
const MAX_VISUAL_ITEMS: usize = 2;
const VISUAL_CHARS: usize = 100;
const NARRATIVE_CONTEXT_CHARS: usize = 1000;

/// Counts of what happened to each interval's description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhanceSummary {
    pub kept: usize,
    pub generated: usize,
    pub fallback: usize,
}

/// Replace placeholder descriptions with oracle captions.
///
/// Timing is never modified. Without an oracle nothing changes.
pub async fn enhance_descriptions(
    intervals: &mut [SelectedInterval],
    groups: &SourceGroups,
    narrative: &str,
    oracle: Option<&dyn IntervalOracle>,
) -> EnhanceSummary {
    let mut summary = EnhanceSummary::default();

    let Some(oracle) = oracle else {
        summary.kept = intervals.len();
        debug!("No oracle configured, keeping existing descriptions");
        return summary;
    };

    let narrative = truncate_chars(narrative, NARRATIVE_CONTEXT_CHARS);
    let total = intervals.len();

    for interval in intervals.iter_mut() {
        if !interval.needs_description() {
            summary.kept += 1;
            continue;
        }

        let request = describe_request(interval, groups, narrative);
        match oracle.describe_interval(&request).await {
            Ok(caption) if !caption.trim().is_empty() => {
                debug!(index = interval.index, source = %interval.source_id, "Generated description");
                interval.description = caption.trim().to_string();
                summary.generated += 1;
            }
            Ok(_) => {
                warn!(index = interval.index, "Oracle returned an empty description");
                interval.description = fallback_description(&interval.source_id);
                record_description_fallback();
                summary.fallback += 1;
            }
            Err(e) => {
                warn!(index = interval.index, error = %e, "Failed to generate description");
                interval.description = fallback_description(&interval.source_id);
                record_description_fallback();
                summary.fallback += 1;
            }
        }
    }

    info!(
        total = total,
        kept = summary.kept,
        generated = summary.generated,
        fallback = summary.fallback,
        "Interval descriptions enhanced"
    );
    summary
}

fn fallback_description(source_id: &str) -> String {
    format!("Video segment from {}", source_id)
}

fn describe_request(interval: &SelectedInterval, groups: &SourceGroups, narrative: &str) -> DescribeRequest {
    let mut dialogue = Vec::new();
    let mut visuals = Vec::new();

    let inside = groups
        .get(&interval.source_id)
        .into_iter()
        .flatten()
        .filter(|e| e.timestamp_secs >= interval.start_secs && e.timestamp_secs <= interval.end_secs)
        .take(MAX_CONTEXT_EVENTS);

    for event in inside {
        match event.kind {
            EventKind::Transcript if !event.text.is_empty() => dialogue.push(event.attributed_text()),
            EventKind::Transcript => {}
            EventKind::Keyframe => visuals.push(truncate_chars(&event.text, VISUAL_CHARS).to_string()),
        }
    }

    dialogue.truncate(MAX_DIALOGUE_ITEMS);
    visuals.truncate(MAX_VISUAL_ITEMS);

    DescribeRequest {
        source_id: interval.source_id.clone(),
        start_time: interval.start_time(),
        end_time: interval.end_time(),
        narrative: narrative.to_string(),
        dialogue: dialogue.join(" | "),
        visuals: visuals.join(" | "),
    }
}
