//! Interval generation error types.

use std::path::PathBuf;

use thiserror::Error;

pub type IntervalResult<T> = Result<T, IntervalError>;

#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("No usable annotation events in any source")]
    NoContent,

    #[error("Interval selection produced no intervals")]
    NoIntervals,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Plan error: {0}")]
    Plan(#[from] vlogcut_models::PlanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntervalError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
