//! Cutting plan: the serialized contract between interval selection and cutting.
//!
//! The JSON shape is fixed; older plan files that used `source_video`,
//! `ai_description`, `total_target_duration` and `videos_used` still load.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interval::SelectedInterval;
use crate::timestamp::{parse_timestamp, TimestampError};

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid plan: {0}")]
    Invalid(String),

    #[error("Invalid timestamp in interval {index}: {source}")]
    Timestamp {
        index: u32,
        #[source]
        source: TimestampError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Aggregate information about a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanMetadata {
    pub generated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "stream_directory")]
    pub annotation_dir: Option<String>,

    /// Requested total duration (seconds)
    #[serde(alias = "total_target_duration")]
    pub target_duration: u32,

    pub suggested_interval_duration: u32,
    pub min_interval_duration: u32,
    pub max_interval_duration: u32,

    /// Sum of interval durations (seconds)
    pub actual_total_duration: f64,

    pub total_intervals: u32,

    #[serde(alias = "videos_used")]
    pub sources_used: Vec<String>,
}

/// One interval as written to the plan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanInterval {
    /// 1-based position; matches list order
    pub index: u32,
    /// `HH:MM:SS`
    pub start_time: String,
    /// `HH:MM:SS`
    pub end_time: String,
    pub duration_seconds: f64,
    #[serde(alias = "ai_description")]
    pub description: String,
    #[serde(alias = "source_video")]
    pub source: String,
}

impl PlanInterval {
    /// Parsed `(start, end)` in seconds.
    pub fn bounds_secs(&self) -> PlanResult<(f64, f64)> {
        let start = parse_timestamp(&self.start_time).map_err(|source| PlanError::Timestamp {
            index: self.index,
            source,
        })?;
        let end = parse_timestamp(&self.end_time).map_err(|source| PlanError::Timestamp {
            index: self.index,
            source,
        })?;
        Ok((start, end))
    }
}

impl From<&SelectedInterval> for PlanInterval {
    fn from(interval: &SelectedInterval) -> Self {
        Self {
            index: interval.index,
            start_time: interval.start_time(),
            end_time: interval.end_time(),
            duration_seconds: round2(interval.duration()),
            description: interval.description.clone(),
            source: interval.source_id.clone(),
        }
    }
}

/// Selection parameters recorded in the plan metadata.
#[derive(Debug, Clone, Default)]
pub struct PlanParams {
    pub target_duration: u32,
    pub suggested_interval_duration: u32,
    pub narrative_file: Option<String>,
    pub annotation_dir: Option<String>,
}

/// Ordered intervals plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CuttingPlan {
    pub metadata: PlanMetadata,
    pub intervals: Vec<PlanInterval>,
}

impl CuttingPlan {
    /// Build a plan from selected intervals in their final order.
    pub fn from_selection(intervals: &[SelectedInterval], params: PlanParams) -> Self {
        let suggested = params.suggested_interval_duration;
        let plan_intervals: Vec<PlanInterval> = intervals.iter().map(PlanInterval::from).collect();
        let actual_total: f64 = intervals.iter().map(SelectedInterval::duration).sum();
        let sources_used: Vec<String> = intervals
            .iter()
            .map(|i| i.source_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            metadata: PlanMetadata {
                generated_at: Utc::now(),
                narrative_file: params.narrative_file,
                annotation_dir: params.annotation_dir,
                target_duration: params.target_duration,
                suggested_interval_duration: suggested,
                min_interval_duration: suggested.saturating_sub(2).max(1),
                max_interval_duration: suggested + 2,
                actual_total_duration: round2(actual_total),
                total_intervals: plan_intervals.len() as u32,
                sources_used,
            },
            intervals: plan_intervals,
        }
    }

    /// Check index contiguity and interval timestamps.
    pub fn validate(&self) -> PlanResult<()> {
        for (pos, interval) in self.intervals.iter().enumerate() {
            let expected = pos as u32 + 1;
            if interval.index != expected {
                return Err(PlanError::Invalid(format!(
                    "interval at position {} has index {}, expected {}",
                    pos, interval.index, expected
                )));
            }
            let (start, end) = interval.bounds_secs()?;
            if start >= end {
                return Err(PlanError::Invalid(format!(
                    "interval {} starts at {} but ends at {}",
                    interval.index, interval.start_time, interval.end_time
                )));
            }
            if interval.source.trim().is_empty() {
                return Err(PlanError::Invalid(format!(
                    "interval {} has no source",
                    interval.index
                )));
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the plan as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> PlanResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Read a plan file.
    pub fn load(path: impl AsRef<Path>) -> PlanResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlanError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
