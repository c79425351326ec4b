//! Tracked end-to-end job: generate a plan, then cut it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use vlogcut_intervals::{NarrativeIntervalGenerator, SelectionConfig};
use vlogcut_media::{cut_plan_with, CutOptions, SegmentRunner};
use vlogcut_models::{JobId, JobRecord, JobStage};
use vlogcut_oracle::IntervalOracle;

use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::metrics::{record_job_completed, record_job_failed, record_job_started};
use crate::store::JobStore;

/// File name of the plan written into the job directory.
pub const PLAN_FILE_NAME: &str = "intervals.json";
/// File name of the final video written into the job directory.
pub const FINAL_VIDEO_NAME: &str = "final_cut_video.mp4";

/// Inputs for one cut job.
#[derive(Debug, Clone)]
pub struct CutJobRequest {
    pub narrative_file: PathBuf,
    pub annotation_dir: PathBuf,
    pub video_dir: PathBuf,
    /// Parent of the job's exclusive working directory
    pub work_dir: PathBuf,
    pub target_duration: u32,
    pub suggested_interval_duration: u32,
}

impl CutJobRequest {
    pub fn job_dir(&self, id: &JobId) -> PathBuf {
        self.work_dir.join(id.as_str())
    }
}

/// Run a job through every stage, persisting each transition.
///
/// On failure the record is moved to `error` before the error is returned.
pub async fn run_cut_job(
    store: &dyn JobStore,
    request: &CutJobRequest,
    oracle: Option<Arc<dyn IntervalOracle>>,
    runner: &dyn SegmentRunner,
) -> WorkerResult<JobRecord> {
    let mut record = JobRecord::new(JobId::new());
    store.create(&record).await?;

    let logger = JobLogger::new(&record.id, "cut_job");
    let span = logger.create_span();
    let started = Instant::now();
    record_job_started();
    logger.log_start(&format!("narrative {}", request.narrative_file.display()));

    let result = execute(store, &mut record, request, oracle, runner, &logger)
        .instrument(span)
        .await;

    let elapsed = started.elapsed().as_secs_f64();
    match result {
        Ok(()) => {
            record_job_completed(elapsed);
            logger.log_completion(record.message.as_deref().unwrap_or("done"));
            Ok(record)
        }
        Err(e) => {
            let failed_stage = record.stage.as_str();
            logger.log_error(&e.to_string());
            record_job_failed(failed_stage, elapsed);
            if !record.is_terminal() {
                record.fail(e.to_string())?;
                store.update(&record).await?;
            }
            Err(e)
        }
    }
}

async fn execute(
    store: &dyn JobStore,
    record: &mut JobRecord,
    request: &CutJobRequest,
    oracle: Option<Arc<dyn IntervalOracle>>,
    runner: &dyn SegmentRunner,
    logger: &JobLogger,
) -> WorkerResult<()> {
    let job_dir = request.job_dir(&record.id);
    tokio::fs::create_dir_all(&job_dir).await?;
    record.set_message(format!("Working in {}", job_dir.display()));
    store.update(record).await?;

    // Plan generation
    transition(store, record, JobStage::GeneratingIntervals, logger).await?;
    let config = SelectionConfig::new(request.target_duration, request.suggested_interval_duration);
    let mut generator = NarrativeIntervalGenerator::new(config);
    if let Some(oracle) = oracle {
        generator = generator.with_oracle(oracle);
    }
    let generated = generator
        .generate(&request.narrative_file, &request.annotation_dir)
        .await?;

    let plan_path = job_dir.join(PLAN_FILE_NAME);
    generated.plan.save(&plan_path)?;
    record.plan_path = Some(plan_path.clone());
    record.set_message(format!(
        "Selected {} intervals ({:.1}s)",
        generated.plan.metadata.total_intervals, generated.plan.metadata.actual_total_duration
    ));
    if generated.report.fallback_sources() > 0 {
        logger.log_warning(&format!(
            "{} source(s) used the fallback selection",
            generated.report.fallback_sources()
        ));
    }
    logger.log_progress(&format!("plan written to {}", plan_path.display()));

    // Cutting
    transition(store, record, JobStage::CuttingVideos, logger).await?;
    let options = cut_options(request, &job_dir);
    let report = cut_plan_with(&generated.plan, &options, runner).await?;
    if report.skipped() > 0 {
        logger.log_warning(&format!("{} interval(s) could not be cut", report.skipped()));
    }

    record.output_path = Some(report.output_path.clone());
    record.set_message(format!(
        "Cut {} of {} segments ({:.1}s)",
        report.extracted(),
        report.segments.len(),
        report.expected_duration
    ));
    transition(store, record, JobStage::Completed, logger).await?;

    Ok(())
}

fn cut_options(request: &CutJobRequest, job_dir: &Path) -> CutOptions {
    CutOptions {
        video_dir: request.video_dir.clone(),
        segment_dir: job_dir.join("segments"),
        final_output: job_dir.join(FINAL_VIDEO_NAME),
    }
}

async fn transition(
    store: &dyn JobStore,
    record: &mut JobRecord,
    next: JobStage,
    logger: &JobLogger,
) -> WorkerResult<()> {
    record.advance(next)?;
    store.update(record).await?;
    logger.log_stage(record.stage, record.progress);
    Ok(())
}
