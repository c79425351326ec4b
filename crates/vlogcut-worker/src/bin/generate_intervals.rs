//! Build a cutting plan from a narrative and annotation files.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use vlogcut_intervals::{GeneratedPlan, NarrativeIntervalGenerator, SelectionConfig};
use vlogcut_worker::{init_tracing, install_crypto_provider, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "generate-intervals")]
#[command(about = "Generate timestamp intervals from a narrative and annotated source videos")]
struct Args {
    /// Path to the narrative text file
    narrative_file: PathBuf,

    /// Directory containing per-source annotation files
    #[arg(long, alias = "stream-dir", default_value = "stream_processed_clip")]
    annotation_dir: PathBuf,

    /// Total target duration in seconds
    #[arg(long, default_value_t = 60)]
    duration: u32,

    /// Suggested duration of each interval in seconds
    #[arg(long, default_value_t = 5)]
    interval_duration: u32,

    /// Output JSON file (default: narrative_intervals_<timestamp>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

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

    let mut generator =
        NarrativeIntervalGenerator::new(SelectionConfig::new(args.duration, args.interval_duration));
    if !args.no_oracle {
        if let Some(oracle) = config.oracle() {
            generator = generator.with_oracle(oracle);
        }
    }

    let generated = match generator.generate(&args.narrative_file, &args.annotation_dir).await {
        Ok(generated) => generated,
        Err(e) => {
            error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let output = args.output.unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("narrative_intervals_{}.json", stamp))
    });
    if let Err(e) = generated.plan.save(&output) {
        error!("Failed to write {}: {}", output.display(), e);
        std::process::exit(1);
    }

    info!(output = %output.display(), "Results saved");
    print_summary(&generated);
}

fn print_summary(generated: &GeneratedPlan) {
    let meta = &generated.plan.metadata;
    let rule = "=".repeat(70);

    println!("\n{}", rule);
    println!("GENERATED INTERVALS SUMMARY");
    println!("{}", rule);
    println!(
        "Total Duration: {:.1}s (Target: {}s)",
        meta.actual_total_duration, meta.target_duration
    );
    println!("Number of Intervals: {}", meta.total_intervals);
    println!("Sources Used: {}", meta.sources_used.join(", "));
    for source in &meta.sources_used {
        let count = generated
            .plan
            .intervals
            .iter()
            .filter(|i| &i.source == source)
            .count();
        println!("  - {}: {} intervals", source, count);
    }
    println!("{}", "-".repeat(70));
    for interval in &generated.plan.intervals {
        println!(
            "{}. {} | {} - {} ({:.1}s)",
            interval.index,
            interval.source,
            interval.start_time,
            interval.end_time,
            interval.duration_seconds
        );
        println!("   {}\n", interval.description);
    }
}
