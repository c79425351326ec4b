//! Oracle error types.

use thiserror::Error;

pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OracleError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transport-level failures are retried; malformed answers and missing
    /// configuration are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::RequestFailed(_) | OracleError::Timeout(_) | OracleError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(OracleError::request_failed("503").is_retryable());
        assert!(OracleError::Timeout(60).is_retryable());
        assert!(!OracleError::unavailable("no key").is_retryable());
        assert!(!OracleError::invalid_response("no array").is_retryable());
    }
}
