//! Run the full narrative-to-video pipeline as one tracked job.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use vlogcut_worker::{
    init_tracing, install_crypto_provider, run_cut_job, CutJobRequest, InMemoryJobStore, JobStore,
    WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "vlogcut-job")]
#[command(about = "Generate a cutting plan and render the final video in one job")]
struct Args {
    /// Path to the narrative text file
    narrative_file: PathBuf,

    /// Directory containing per-source annotation files
    #[arg(long, default_value = "stream_processed_clip")]
    annotation_dir: PathBuf,

    /// Directory containing the source videos
    #[arg(short = 'v', long, default_value = "stream_videos")]
    video_dir: PathBuf,

    /// Parent directory for job working directories (default: VLOGCUT_WORK_DIR)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Total target duration in seconds
    #[arg(long, default_value_t = 60)]
    duration: u32,

    /// Suggested duration of each interval in seconds
    #[arg(long, default_value_t = 5)]
    interval_duration: u32,

    /// Skip the oracle and use the fallback selection only
    #[arg(long)]
    no_oracle: bool,
}

#[tokio::main]
async fn main() {
    install_crypto_provider();
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = WorkerConfig::from_env();
    info!("Starting vlogcut-job");

    let request = CutJobRequest {
        narrative_file: args.narrative_file,
        annotation_dir: args.annotation_dir,
        video_dir: args.video_dir,
        work_dir: args.work_dir.unwrap_or_else(|| config.work_dir.clone()),
        target_duration: args.duration,
        suggested_interval_duration: args.interval_duration,
    };

    let oracle = if args.no_oracle { None } else { config.oracle() };
    let store = InMemoryJobStore::new();
    let runner = config.ffmpeg_runner();

    let result = run_cut_job(&store, &request, oracle, &runner).await;

    // One job per invocation; print its final record.
    if let Ok(records) = store.list(Some(1)).await {
        for record in records {
            match serde_json::to_string_pretty(&record) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to render job record: {}", e),
            }
        }
    }

    if let Err(e) = result {
        error!("Job failed: {}", e);
        std::process::exit(1);
    }
}
