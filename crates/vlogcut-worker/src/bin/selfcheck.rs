//! Preflight check for the cutting environment.

use anyhow::Context;

use vlogcut_media::check_ffmpeg;
use vlogcut_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "vlogcut-selfcheck: work_dir={} ffmpeg_timeout={}s",
        config.work_dir.display(),
        config.ffmpeg_timeout_secs
    );

    config
        .ensure_work_dir()
        .await
        .with_context(|| format!("work directory {} is not writable", config.work_dir.display()))?;
    println!("vlogcut-selfcheck: work_dir writable");

    let ffmpeg = check_ffmpeg().context("ffmpeg is required for cut-segments and vlogcut-job")?;
    println!("vlogcut-selfcheck: ffmpeg at {}", ffmpeg.display());

    if config.oracle.is_enabled() {
        println!(
            "vlogcut-selfcheck: oracle enabled (rank={}, describe={}, attempts={})",
            config.oracle.rank_model, config.oracle.describe_model, config.oracle.max_attempts
        );
    } else {
        println!("vlogcut-selfcheck: GEMINI_API_KEY not set, fallback selection only");
    }

    println!("vlogcut-selfcheck: ok");
    Ok(())
}
