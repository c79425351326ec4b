//! Job metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "vlogcut_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vlogcut_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vlogcut_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "vlogcut_job_duration_seconds";
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "completed").record(duration_secs);
}

/// Record a failed job, labelled by the stage it failed in.
pub fn record_job_failed(stage: &'static str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "failed").record(duration_secs);
}
