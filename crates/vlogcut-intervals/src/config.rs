//! Selection parameters.

use vlogcut_models::IntervalBounds;

use crate::chunker::{DEFAULT_CHUNK_WIDTH_SECS, DEFAULT_DIGEST_CHARS};
use crate::error::{IntervalError, IntervalResult};

/// Parameters for one interval selection run.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Total duration budget for the plan, in seconds
    pub target_duration: u32,
    /// Suggested length of each interval, in seconds
    pub suggested_interval_duration: u32,
    /// Chunk window used to build the oracle digest
    pub chunk_width_secs: f64,
    /// Character budget for the digest
    pub digest_chars: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            target_duration: 60,
            suggested_interval_duration: 5,
            chunk_width_secs: DEFAULT_CHUNK_WIDTH_SECS,
            digest_chars: DEFAULT_DIGEST_CHARS,
        }
    }
}

impl SelectionConfig {
    pub fn new(target_duration: u32, suggested_interval_duration: u32) -> Self {
        Self {
            target_duration,
            suggested_interval_duration,
            ..Default::default()
        }
    }

    pub fn bounds(&self) -> IntervalBounds {
        IntervalBounds::from_suggested(self.suggested_interval_duration as f64)
    }

    pub fn validate(&self) -> IntervalResult<()> {
        if self.target_duration == 0 {
            return Err(IntervalError::invalid_config("target duration must be positive"));
        }
        if self.suggested_interval_duration == 0 {
            return Err(IntervalError::invalid_config(
                "suggested interval duration must be positive",
            ));
        }
        if self.chunk_width_secs.is_nan() || self.chunk_width_secs <= 0.0 {
            return Err(IntervalError::invalid_config("chunk width must be positive"));
        }
        Ok(())
    }
}
