//! Cut the intervals of a plan out of the source videos and join them.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use vlogcut_media::{cut_plan_with, CutOptions, SegmentOutcome};
use vlogcut_models::CuttingPlan;
use vlogcut_worker::{init_tracing, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "cut-segments")]
#[command(about = "Cut video segments from an intervals plan and concatenate them")]
struct Args {
    /// Plan file produced by generate-intervals
    #[arg(default_value = "stream_processed_clip_intervals.json")]
    plan_file: PathBuf,

    /// Directory containing the source videos
    #[arg(short = 'v', long, default_value = "stream_videos")]
    video_dir: PathBuf,

    /// Directory for the individual segments
    #[arg(short = 'o', long, default_value = "output_segments")]
    output_dir: PathBuf,

    /// Final output video filename
    #[arg(short = 'f', long, default_value = "final_cut_video.mp4")]
    final_output: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = WorkerConfig::from_env();

    let plan = match CuttingPlan::load(&args.plan_file) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = plan.validate() {
        warn!(error = %e, "Plan failed validation, invalid intervals will be skipped");
    }

    info!(
        plan = %args.plan_file.display(),
        intervals = plan.intervals.len(),
        "Loaded plan"
    );

    let options = CutOptions {
        video_dir: args.video_dir,
        segment_dir: args.output_dir,
        final_output: args.final_output,
    };

    let report = match cut_plan_with(&plan, &options, &config.ffmpeg_runner()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    for segment in &report.segments {
        match &segment.outcome {
            SegmentOutcome::Extracted { .. } => {}
            SegmentOutcome::MissingSource => {
                warn!(index = segment.index, source = %segment.source, "Skipped: source video missing")
            }
            SegmentOutcome::Failed { reason } => {
                warn!(index = segment.index, source = %segment.source, "Skipped: {}", reason)
            }
        }
    }

    println!("Final video created: {}", report.output_path.display());
    println!(
        "Segments: {} of {} ({:.1}s expected)",
        report.extracted(),
        report.segments.len(),
        report.expected_duration
    );
}
