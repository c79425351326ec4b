//! Worker error types.

use thiserror::Error;

use vlogcut_models::{InvalidTransition, JobId};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job already exists: {0}")]
    JobExists(JobId),

    #[error("Interval generation error: {0}")]
    Interval(#[from] vlogcut_intervals::IntervalError),

    #[error("Media error: {0}")]
    Media(#[from] vlogcut_media::MediaError),

    #[error("Plan error: {0}")]
    Plan(#[from] vlogcut_models::PlanError),

    #[error("Invalid stage transition: {0}")]
    Transition(#[from] InvalidTransition),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Whether the failure came from missing input rather than processing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkerError::Interval(vlogcut_intervals::IntervalError::NotFound(_))
                | WorkerError::Media(vlogcut_media::MediaError::FileNotFound(_))
                | WorkerError::Plan(vlogcut_models::PlanError::NotFound(_))
        )
    }
}
