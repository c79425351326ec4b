//! Shared data models for the vlogcut pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Annotation events parsed from per-source text files
//! - Content chunks and candidate/selected intervals
//! - The cutting plan wire format
//! - Job identifiers and the job stage machine

pub mod event;
pub mod interval;
pub mod job;
pub mod plan;
pub mod timestamp;

// Re-export common types
pub use event::{EventKind, TimestampedEvent};
pub use interval::{
    CandidateInterval, ContentChunk, IntervalBounds, IntervalOrigin, SelectedInterval,
    FALLBACK_DESCRIPTION_PREFIX,
};
pub use job::{InvalidTransition, JobId, JobRecord, JobStage};
pub use plan::{CuttingPlan, PlanError, PlanInterval, PlanMetadata, PlanParams, PlanResult};
pub use timestamp::{format_compact, format_seconds, parse_timestamp, TimestampError};
