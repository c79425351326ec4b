//! Worker configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use vlogcut_media::FfmpegRunner;
use vlogcut_oracle::{IntervalOracle, LlmOracle, OracleConfig};

use crate::error::WorkerResult;

const WRITE_CHECK_FILE: &str = ".vlogcut-write-check";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root under which each job gets its own directory
    pub work_dir: PathBuf,
    /// Per-command FFmpeg timeout in seconds
    pub ffmpeg_timeout_secs: u64,
    /// Oracle client settings
    pub oracle: OracleConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vlogcut"),
            ffmpeg_timeout_secs: 600,
            oracle: OracleConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("VLOGCUT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/vlogcut")),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(600),
            oracle: OracleConfig::from_env(),
        }
    }

    pub fn ffmpeg_runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_timeout(self.ffmpeg_timeout_secs)
    }

    /// Create the work directory and confirm files can be written into it.
    pub async fn ensure_work_dir(&self) -> WorkerResult<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let marker = self.work_dir.join(WRITE_CHECK_FILE);
        tokio::fs::write(&marker, b"ok").await?;
        tokio::fs::remove_file(&marker).await?;
        debug!(work_dir = %self.work_dir.display(), "Work directory is writable");
        Ok(())
    }

    /// The configured oracle, or `None` when it is disabled or cannot be built.
    pub fn oracle(&self) -> Option<Arc<dyn IntervalOracle>> {
        match LlmOracle::from_config(&self.oracle) {
            Ok(Some(oracle)) => Some(Arc::new(oracle)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to create oracle client, continuing without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.ffmpeg_timeout_secs, 600);
        assert_eq!(config.ffmpeg_runner().timeout_secs(), 600);
        assert!(!config.oracle.is_enabled());
        assert!(config.oracle().is_none());
    }

    #[tokio::test]
    async fn test_ensure_work_dir_creates_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let config = WorkerConfig {
            work_dir: root.path().join("jobs").join("nested"),
            ..WorkerConfig::default()
        };

        config.ensure_work_dir().await.unwrap();
        assert!(config.work_dir.is_dir());
        assert!(!config.work_dir.join(WRITE_CHECK_FILE).exists());
    }

    #[tokio::test]
    async fn test_ensure_work_dir_rejects_unwritable_path() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = WorkerConfig {
            work_dir: blocker,
            ..WorkerConfig::default()
        };

        let err = config.ensure_work_dir().await.unwrap_err();
        assert!(matches!(err, crate::error::WorkerError::Io(_)));
    }
}
