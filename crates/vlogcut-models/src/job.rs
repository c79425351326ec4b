//! Job identifiers, stages and records.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage of a cut job.
///
/// `preparing -> generating_intervals -> cutting_videos -> completed`, with
/// `error` reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Preparing,
    GeneratingIntervals,
    CuttingVideos,
    Completed,
    Error,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Preparing => "preparing",
            JobStage::GeneratingIntervals => "generating_intervals",
            JobStage::CuttingVideos => "cutting_videos",
            JobStage::Completed => "completed",
            JobStage::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Error)
    }

    /// Whether `next` is a legal successor of this stage.
    pub fn can_transition_to(&self, next: JobStage) -> bool {
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, JobStage::Error) => true,
            (JobStage::Preparing, JobStage::GeneratingIntervals) => true,
            (JobStage::GeneratingIntervals, JobStage::CuttingVideos) => true,
            (JobStage::CuttingVideos, JobStage::Completed) => true,
            _ => false,
        }
    }

    /// Nominal progress percentage when entering the stage.
    pub fn progress(&self) -> u8 {
        match self {
            JobStage::Preparing => 0,
            JobStage::GeneratingIntervals => 20,
            JobStage::CuttingVideos => 60,
            JobStage::Completed => 100,
            JobStage::Error => 0,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected stage change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStage,
    pub to: JobStage,
}

/// Tracked state of one cut job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    pub id: JobId,
    pub stage: JobStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable status line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            stage: JobStage::Preparing,
            progress: 0,
            message: None,
            error: None,
            plan_path: None,
            output_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(&mut self, next: JobStage) -> Result<(), InvalidTransition> {
        if !self.stage.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        if next != JobStage::Error {
            self.progress = next.progress();
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to `error` with a message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(JobStage::Error)?;
        self.error = Some(error.into());
        Ok(())
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}
