//! Plan execution: per-interval extraction followed by concatenation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use tracing::{error, info, warn};

use vlogcut_models::{format_compact, CuttingPlan, PlanInterval};

use crate::command::{concat_command, extract_command, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Name of the concat manifest written next to the segments.
pub const MANIFEST_FILE_NAME: &str = "segments_list.txt";

const SEGMENTS_CUT_TOTAL: &str = "vlogcut_segments_cut_total";
const SEGMENTS_FAILED_TOTAL: &str = "vlogcut_segments_failed_total";

/// Extraction and concatenation backend.
#[async_trait]
pub trait SegmentRunner: Send + Sync {
    /// Copy `[start, end]` of `source` into `output`.
    async fn extract(&self, source: &Path, start: &str, end: &str, output: &Path) -> MediaResult<()>;

    /// Join the files listed in `manifest` into `output`.
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

#[async_trait]
impl SegmentRunner for FfmpegRunner {
    async fn extract(&self, source: &Path, start: &str, end: &str, output: &Path) -> MediaResult<()> {
        self.run(&extract_command(source, output, start, end)).await
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        self.run(&concat_command(manifest, output)).await
    }
}

/// Where to read sources and write segments.
#[derive(Debug, Clone)]
pub struct CutOptions {
    /// Directory holding `{source}.mp4`
    pub video_dir: PathBuf,
    /// Directory for extracted segments and the manifest
    pub segment_dir: PathBuf,
    /// Concatenated output file
    pub final_output: PathBuf,
}

impl Default for CutOptions {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("stream_videos"),
            segment_dir: PathBuf::from("output_segments"),
            final_output: PathBuf::from("final_cut_video.mp4"),
        }
    }
}

impl CutOptions {
    pub fn source_path(&self, source: &str) -> PathBuf {
        self.video_dir.join(format!("{}.mp4", source))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.segment_dir.join(MANIFEST_FILE_NAME)
    }
}

/// What happened to one plan interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentOutcome {
    Extracted { path: PathBuf },
    MissingSource,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentResult {
    pub index: u32,
    pub source: String,
    pub duration_seconds: f64,
    pub outcome: SegmentOutcome,
}

/// Result of executing a plan.
#[derive(Debug, Clone, Serialize)]
pub struct CutReport {
    pub segments: Vec<SegmentResult>,
    pub output_path: PathBuf,
    /// Sum of the durations of extracted segments
    pub expected_duration: f64,
}

impl CutReport {
    pub fn extracted(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s.outcome, SegmentOutcome::Extracted { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.segments.len() - self.extracted()
    }
}

/// `segment_{index:02}_{source}_{HHMMSS}-{HHMMSS}.mp4`
pub fn segment_file_name(interval: &PlanInterval) -> String {
    format!(
        "segment_{:02}_{}_{}-{}.mp4",
        interval.index,
        interval.source,
        format_compact(&interval.start_time),
        format_compact(&interval.end_time)
    )
}

/// Quote a path for an ffmpeg concat manifest `file` directive.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Write the concat manifest, one absolute path per line.
pub async fn write_concat_manifest(segments: &[PathBuf], manifest: &Path) -> MediaResult<()> {
    let mut content = String::new();
    for segment in segments {
        let absolute = std::path::absolute(segment)?;
        content.push_str(&format!("file '{}'\n", escape_concat_path(&absolute)));
    }
    tokio::fs::write(manifest, content).await?;
    Ok(())
}

/// Parseable bounds with `start < end`.
fn check_interval(interval: &PlanInterval) -> Result<(), String> {
    let (start, end) = interval.bounds_secs().map_err(|e| e.to_string())?;
    if start >= end {
        return Err(format!(
            "interval {} starts at {} but ends at {}",
            interval.index, interval.start_time, interval.end_time
        ));
    }
    Ok(())
}

/// Execute a plan with the system FFmpeg.
pub async fn cut_plan(plan: &CuttingPlan, options: &CutOptions) -> MediaResult<CutReport> {
    cut_plan_with(plan, options, &FfmpegRunner::new()).await
}

/// Execute a plan with the given runner.
///
/// Malformed intervals, missing sources and failed extractions are
/// skipped; the run only fails when nothing could be extracted or the
/// final concatenation fails.
pub async fn cut_plan_with(
    plan: &CuttingPlan,
    options: &CutOptions,
    runner: &dyn SegmentRunner,
) -> MediaResult<CutReport> {
    if !options.video_dir.is_dir() {
        return Err(MediaError::file_not_found(&options.video_dir));
    }
    tokio::fs::create_dir_all(&options.segment_dir).await?;

    info!(
        intervals = plan.intervals.len(),
        video_dir = %options.video_dir.display(),
        segment_dir = %options.segment_dir.display(),
        "Cutting plan segments"
    );

    let mut results = Vec::with_capacity(plan.intervals.len());
    let mut extracted = Vec::new();
    let mut expected_duration = 0.0;

    for interval in &plan.intervals {
        let source_path = options.source_path(&interval.source);
        let outcome = if let Err(reason) = check_interval(interval) {
            warn!(index = interval.index, source = %interval.source, reason = %reason, "Invalid interval, skipping");
            counter!(SEGMENTS_FAILED_TOTAL).increment(1);
            SegmentOutcome::Failed { reason }
        } else if !source_path.is_file() {
            warn!(
                index = interval.index,
                source = %interval.source,
                path = %source_path.display(),
                "Source video not found, skipping interval"
            );
            SegmentOutcome::MissingSource
        } else {
            let output = options.segment_dir.join(segment_file_name(interval));
            match runner
                .extract(&source_path, &interval.start_time, &interval.end_time, &output)
                .await
            {
                Ok(()) => {
                    info!(
                        index = interval.index,
                        start = %interval.start_time,
                        end = %interval.end_time,
                        output = %output.display(),
                        "Segment extracted"
                    );
                    counter!(SEGMENTS_CUT_TOTAL).increment(1);
                    extracted.push(output.clone());
                    expected_duration += interval.duration_seconds;
                    SegmentOutcome::Extracted { path: output }
                }
                Err(e) => {
                    error!(index = interval.index, source = %interval.source, error = %e, "Segment extraction failed");
                    counter!(SEGMENTS_FAILED_TOTAL).increment(1);
                    SegmentOutcome::Failed { reason: e.to_string() }
                }
            }
        };

        results.push(SegmentResult {
            index: interval.index,
            source: interval.source.clone(),
            duration_seconds: interval.duration_seconds,
            outcome,
        });
    }

    if extracted.is_empty() {
        return Err(MediaError::NoSegments);
    }

    let manifest = options.manifest_path();
    write_concat_manifest(&extracted, &manifest).await?;

    if let Some(parent) = options.final_output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    runner.concat(&manifest, &options.final_output).await?;

    let report = CutReport {
        segments: results,
        output_path: options.final_output.clone(),
        expected_duration,
    };

    info!(
        extracted = report.extracted(),
        skipped = report.skipped(),
        expected_secs = report.expected_duration,
        output = %report.output_path.display(),
        "Final video written"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use vlogcut_models::PlanMetadata;

    /// Writes placeholder files instead of invoking FFmpeg.
    #[derive(Default)]
    struct FakeRunner {
        failing_sources: HashSet<PathBuf>,
        extracts: Mutex<Vec<(PathBuf, String, String)>>,
        concats: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl SegmentRunner for FakeRunner {
        async fn extract(&self, source: &Path, start: &str, end: &str, output: &Path) -> MediaResult<()> {
            self.extracts
                .lock()
                .unwrap()
                .push((source.to_path_buf(), start.to_string(), end.to_string()));
            if self.failing_sources.contains(source) {
                return Err(MediaError::ffmpeg_failed("corrupt input", None, Some(1)));
            }
            tokio::fs::write(output, b"segment").await?;
            Ok(())
        }

        async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
            self.concats.lock().unwrap().push(manifest.to_path_buf());
            tokio::fs::write(output, b"final").await?;
            Ok(())
        }
    }

    fn interval(index: u32, source: &str, start: &str, end: &str) -> PlanInterval {
        PlanInterval {
            index,
            start_time: start.to_string(),
            end_time: end.to_string(),
            duration_seconds: 5.0,
            description: "moment".to_string(),
            source: source.to_string(),
        }
    }

    fn plan(intervals: Vec<PlanInterval>) -> CuttingPlan {
        CuttingPlan {
            metadata: PlanMetadata {
                generated_at: Utc::now(),
                narrative_file: None,
                annotation_dir: None,
                target_duration: 60,
                suggested_interval_duration: 5,
                min_interval_duration: 3,
                max_interval_duration: 7,
                actual_total_duration: 5.0 * intervals.len() as f64,
                total_intervals: intervals.len() as u32,
                sources_used: Vec::new(),
            },
            intervals,
        }
    }

    fn options(root: &Path) -> CutOptions {
        let video_dir = root.join("videos");
        std::fs::create_dir_all(&video_dir).unwrap();
        CutOptions {
            video_dir,
            segment_dir: root.join("segments"),
            final_output: root.join("out").join("final.mp4"),
        }
    }

    #[test]
    fn test_segment_file_name() {
        let name = segment_file_name(&interval(3, "partA", "00:01:05", "00:01:10"));
        assert_eq!(name, "segment_03_partA_000105-000110.mp4");
    }

    #[test]
    fn test_escape_concat_path() {
        assert_eq!(escape_concat_path(Path::new("/tmp/it's.mp4")), "/tmp/it'\\''s.mp4");
    }

    #[tokio::test]
    async fn test_missing_source_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let opts = options(root.path());
        std::fs::write(opts.source_path("partA"), b"video").unwrap();

        let plan = plan(vec![
            interval(1, "partA", "00:00:00", "00:00:05"),
            interval(2, "ghost", "00:00:10", "00:00:15"),
            interval(3, "partA", "00:00:20", "00:00:25"),
        ]);
        let runner = FakeRunner::default();

        let report = cut_plan_with(&plan, &opts, &runner).await.unwrap();
        assert_eq!(report.extracted(), 2);
        assert_eq!(report.segments[1].outcome, SegmentOutcome::MissingSource);
        assert_eq!(report.expected_duration, 10.0);
        assert!(opts.final_output.is_file());

        let manifest = std::fs::read_to_string(opts.manifest_path()).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '/"));
        assert!(lines[0].ends_with("segment_01_partA_000000-000005.mp4'"));
        assert!(lines[1].ends_with("segment_03_partA_000020-000025.mp4'"));

        let extracts = runner.extracts.lock().unwrap();
        assert_eq!(extracts.len(), 2);
        assert_eq!(extracts[1].1, "00:00:20");
    }

    #[tokio::test]
    async fn test_failed_extraction_is_excluded() {
        let root = tempfile::tempdir().unwrap();
        let opts = options(root.path());
        std::fs::write(opts.source_path("good"), b"video").unwrap();
        std::fs::write(opts.source_path("bad"), b"video").unwrap();

        let mut runner = FakeRunner::default();
        runner.failing_sources.insert(opts.source_path("bad"));

        let plan = plan(vec![
            interval(1, "bad", "00:00:00", "00:00:05"),
            interval(2, "good", "00:00:00", "00:00:05"),
        ]);

        let report = cut_plan_with(&plan, &opts, &runner).await.unwrap();
        assert!(matches!(report.segments[0].outcome, SegmentOutcome::Failed { .. }));
        assert_eq!(report.extracted(), 1);
        assert_eq!(runner.concats.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_intervals_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let opts = options(root.path());
        std::fs::write(opts.source_path("good"), b"video").unwrap();

        let plan = plan(vec![
            interval(1, "good", "00:00:00", "00:00:05"),
            interval(2, "good", "00:00:10", "00:00:10"),
            interval(3, "good", "00:00:30", "00:00:20"),
            interval(4, "good", "soon", "00:00:40"),
        ]);
        let runner = FakeRunner::default();

        let report = cut_plan_with(&plan, &opts, &runner).await.unwrap();
        assert_eq!(report.extracted(), 1);
        assert_eq!(report.skipped(), 3);
        for segment in &report.segments[1..] {
            assert!(matches!(segment.outcome, SegmentOutcome::Failed { .. }));
        }
        assert_eq!(runner.extracts.lock().unwrap().len(), 1);
        assert!(opts.final_output.is_file());
    }

    #[tokio::test]
    async fn test_nothing_resolvable_is_no_segments() {
        let root = tempfile::tempdir().unwrap();
        let opts = options(root.path());
        let runner = FakeRunner::default();

        let plan = plan(vec![interval(1, "ghost", "00:00:00", "00:00:05")]);
        let result = cut_plan_with(&plan, &opts, &runner).await;

        assert!(matches!(result, Err(MediaError::NoSegments)));
        assert!(runner.concats.lock().unwrap().is_empty());
        assert!(!opts.final_output.exists());
    }

    #[tokio::test]
    async fn test_missing_video_dir() {
        let root = tempfile::tempdir().unwrap();
        let opts = CutOptions {
            video_dir: root.path().join("absent"),
            ..CutOptions::default()
        };
        let result = cut_plan_with(&plan(Vec::new()), &opts, &FakeRunner::default()).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
