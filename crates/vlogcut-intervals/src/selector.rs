//! Budget-constrained interval selection.
//!
//! The total budget is split across sources in proportion to their length.
//! Each source's share is filled either by the oracle or, when the oracle is
//! absent or fails for that source, by an evenly spaced fallback. The merged
//! list is then truncated greedily so the plan never exceeds the budget.

use serde::Serialize;
use tracing::{debug, info, warn};

use vlogcut_models::{
    CandidateInterval, IntervalBounds, IntervalOrigin, SelectedInterval, TimestampedEvent,
    FALLBACK_DESCRIPTION_PREFIX,
};
use vlogcut_oracle::{truncate_chars, IntervalOracle, RankRequest};

use crate::chunker::{chunk_events, render_chunks_for_prompt};
use crate::config::SelectionConfig;
use crate::error::{IntervalError, IntervalResult};
use crate::grouping::{source_duration, SourceGroups};
use crate::metrics::record_oracle_fallback;

const NARRATIVE_PROMPT_CHARS: usize = 400;

/// How one source's share was filled.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub available_secs: f64,
    pub target_secs: f64,
    /// `None` when the source had no budget
    pub origin: Option<IntervalOrigin>,
    /// Intervals proposed before budget truncation
    pub proposed: usize,
}

/// Diagnostics for a selection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionReport {
    pub sources: Vec<SourceReport>,
    pub available_total_secs: f64,
    pub selection_ratio: f64,
    pub proposed_total_secs: f64,
    pub selected_total_secs: f64,
    /// Intervals removed by budget truncation
    pub dropped: usize,
}

impl SelectionReport {
    pub fn fallback_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.origin == Some(IntervalOrigin::Fallback))
            .count()
    }
}

/// Selected intervals plus diagnostics.
#[derive(Debug, Clone)]
pub struct Selection {
    pub intervals: Vec<SelectedInterval>,
    pub report: SelectionReport,
}

impl Selection {
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(|i| i.duration()).sum()
    }
}

/// Select intervals from every source within the configured budget.
///
/// Oracle failures never escape; they switch that source to the fallback.
pub async fn select_intervals(
    groups: &SourceGroups,
    config: &SelectionConfig,
    narrative: &str,
    oracle: Option<&dyn IntervalOracle>,
) -> IntervalResult<Selection> {
    config.validate()?;

    if groups.values().all(|events| events.is_empty()) {
        return Err(IntervalError::NoContent);
    }

    let bounds = config.bounds();
    let budget = config.target_duration as f64;
    let available_total: f64 = groups.values().map(|e| source_duration(e)).sum();
    let ratio = if available_total > 0.0 {
        (budget / available_total).min(1.0)
    } else {
        0.0
    };

    info!(
        sources = groups.len(),
        available_secs = available_total,
        target_secs = budget,
        ratio = ratio,
        "Selecting intervals"
    );

    let mut report = SelectionReport {
        available_total_secs: available_total,
        selection_ratio: ratio,
        ..Default::default()
    };
    let mut proposed: Vec<(CandidateInterval, IntervalOrigin)> = Vec::new();

    for (source_id, events) in groups {
        if events.is_empty() {
            continue;
        }

        let available = source_duration(events);
        let target = available * ratio;
        let mut source_report = SourceReport {
            source_id: source_id.clone(),
            available_secs: available,
            target_secs: target,
            origin: None,
            proposed: 0,
        };

        if target <= 0.0 {
            debug!(source = %source_id, "Source has no budget, skipping");
            report.sources.push(source_report);
            continue;
        }

        let (candidates, origin) =
            select_for_source(source_id, events, available, target, config, &bounds, narrative, oracle).await;

        source_report.origin = Some(origin);
        source_report.proposed = candidates.len();
        report.sources.push(source_report);
        proposed.extend(candidates.into_iter().map(|c| (c, origin)));
    }

    proposed.sort_by(|(a, _), (b, _)| {
        a.source_id
            .cmp(&b.source_id)
            .then(a.start_secs.total_cmp(&b.start_secs))
    });
    report.proposed_total_secs = proposed.iter().map(|(c, _)| c.duration()).sum();

    let proposed_count = proposed.len();
    let kept = truncate_to_budget(proposed, budget);
    report.dropped = proposed_count - kept.len();
    if report.dropped > 0 {
        info!(
            proposed_secs = report.proposed_total_secs,
            budget_secs = budget,
            dropped = report.dropped,
            "Trimmed intervals to fit the target duration"
        );
    }

    let intervals: Vec<SelectedInterval> = kept
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, origin))| SelectedInterval::from_candidate(i as u32 + 1, candidate, origin))
        .collect();
    report.selected_total_secs = intervals.iter().map(|i| i.duration()).sum();

    info!(
        intervals = intervals.len(),
        total_secs = report.selected_total_secs,
        fallback_sources = report.fallback_sources(),
        "Interval selection complete"
    );

    Ok(Selection { intervals, report })
}

#[allow(clippy::too_many_arguments)]
async fn select_for_source(
    source_id: &str,
    events: &[TimestampedEvent],
    available: f64,
    target: f64,
    config: &SelectionConfig,
    bounds: &IntervalBounds,
    narrative: &str,
    oracle: Option<&dyn IntervalOracle>,
) -> (Vec<CandidateInterval>, IntervalOrigin) {
    let suggested = config.suggested_interval_duration as f64;

    let Some(oracle) = oracle else {
        record_oracle_fallback("disabled");
        return (
            fallback_intervals(source_id, available, target, suggested, bounds),
            IntervalOrigin::Fallback,
        );
    };

    let chunks = chunk_events(events, config.chunk_width_secs);
    let request = RankRequest {
        source_id: source_id.to_string(),
        narrative: truncate_chars(narrative, NARRATIVE_PROMPT_CHARS).to_string(),
        content_digest: render_chunks_for_prompt(&chunks, config.digest_chars),
        target_secs: target,
        available_secs: available,
        bounds: *bounds,
    };

    match oracle.rank_intervals(&request).await {
        Ok(raw) => {
            let raw_count = raw.len();
            let accepted = accept_oracle_candidates(raw, available, bounds);
            if accepted.is_empty() {
                warn!(
                    source = %source_id,
                    proposed = raw_count,
                    "Oracle answer contained no usable intervals"
                );
            } else {
                info!(
                    source = %source_id,
                    proposed = raw_count,
                    accepted = accepted.len(),
                    "Oracle selected intervals"
                );
            }
            (accepted, IntervalOrigin::Oracle)
        }
        Err(e) => {
            warn!(source = %source_id, error = %e, "Oracle ranking failed, using fallback selection");
            record_oracle_fallback("oracle_error");
            (
                fallback_intervals(source_id, available, target, suggested, bounds),
                IntervalOrigin::Fallback,
            )
        }
    }
}

/// Enforce bounds and per-source ordering on oracle candidates.
///
/// Candidates are clamped to the end of the source and to `bounds.max`;
/// short, inverted, out-of-range and overlapping candidates are dropped.
pub fn accept_oracle_candidates(
    mut candidates: Vec<CandidateInterval>,
    available: f64,
    bounds: &IntervalBounds,
) -> Vec<CandidateInterval> {
    candidates.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    let mut accepted: Vec<CandidateInterval> = Vec::with_capacity(candidates.len());
    for mut candidate in candidates {
        if candidate.start_secs < 0.0
            || candidate.start_secs > available
            || candidate.end_secs <= candidate.start_secs
        {
            debug!(
                source = %candidate.source_id,
                start = candidate.start_secs,
                end = candidate.end_secs,
                "Discarding out-of-range candidate"
            );
            continue;
        }

        if candidate.end_secs > available {
            candidate.end_secs = available;
        }
        if candidate.duration() > bounds.max {
            candidate.end_secs = candidate.start_secs + bounds.max;
        }
        if candidate.duration() < bounds.min {
            debug!(
                source = %candidate.source_id,
                duration = candidate.duration(),
                "Discarding candidate shorter than minimum"
            );
            continue;
        }

        if let Some(existing) = accepted.iter().find(|a| a.overlaps(&candidate)) {
            warn!(
                source = %candidate.source_id,
                start = candidate.start_secs,
                overlaps_start = existing.start_secs,
                "Rejecting overlapping candidate"
            );
            continue;
        }

        accepted.push(candidate);
    }
    accepted
}

/// Evenly spaced intervals covering a source's share of the budget.
///
/// Deterministic for a given input.
pub fn fallback_intervals(
    source_id: &str,
    available: f64,
    target: f64,
    suggested: f64,
    bounds: &IntervalBounds,
) -> Vec<CandidateInterval> {
    if target <= 0.0 || available <= 0.0 {
        return Vec::new();
    }

    let count = ((target / suggested).floor() as usize).max(1);
    let size = (target / count as f64).clamp(bounds.min, bounds.max);
    let spacing = available / count as f64;
    let reason = format!("{} {}", FALLBACK_DESCRIPTION_PREFIX, source_id);

    (0..count)
        .filter_map(|k| {
            let start = spacing * k as f64;
            let end = (start + size).min(available);
            (end - start >= bounds.min).then(|| CandidateInterval::new(source_id, start, end, reason.clone()))
        })
        .collect()
}

/// Keep intervals in order while the running total fits the budget.
///
/// Stops at the first interval that would overflow.
fn truncate_to_budget<T>(items: Vec<(CandidateInterval, T)>, budget: f64) -> Vec<(CandidateInterval, T)> {
    let mut running = 0.0;
    let mut kept = Vec::with_capacity(items.len());
    for (candidate, extra) in items {
        let duration = candidate.duration();
        if running + duration > budget {
            break;
        }
        running += duration;
        kept.push((candidate, extra));
    }
    kept
}
