//! Job pipeline and command-line tools.
//!
//! This crate provides:
//! - Tracked cut jobs: plan generation followed by cutting
//! - A job store abstraction with an in-memory implementation
//! - Tracing setup and job-scoped logging shared by the binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod store;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use pipeline::{run_cut_job, CutJobRequest, FINAL_VIDEO_NAME, PLAN_FILE_NAME};
pub use store::{InMemoryJobStore, JobStore};

/// Install the rustls crypto provider used by the oracle's HTTPS client.
pub fn install_crypto_provider() {
    // Already installed is fine; the first provider wins.
    let _ = rustls::crypto::ring::default_provider().install_default();
}
