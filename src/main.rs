use std::path::PathBuf;

use clap::Parser;
use fallwatch::replay::ReplaySource;
use fallwatch::scheduler::Scheduler;
use fallwatch::sink::TracingSink;
use fallwatch::store::{reference_samples_from_dir, JsonEncoder};
use fallwatch::{EncodingStore, FrameAnalyzer, MonitorConfig, MonitorResult};

/// Replays recorded pose and face observations through the fall and face
/// detectors.
#[derive(Parser, Debug)]
#[command(name = "fallwatch", version)]
struct Args {
    /// JSON config file; defaults are used for missing fields.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Folder of reference encodings, one JSON file per person.
    #[arg(long, default_value = "pictures")]
    references: PathBuf,

    /// JSON-lines file of recorded frames.
    #[arg(long, value_name = "PATH")]
    frames: PathBuf,

    /// Frame rate to pace the replay at; 0 replays as fast as possible.
    #[arg(long, default_value = "30")]
    fps: u32,
}

fn main() -> MonitorResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MonitorConfig::from_json(path)?,
        None => MonitorConfig::default(),
    };

    let samples = reference_samples_from_dir(&args.references)?;
    let (store, report) = EncodingStore::build(samples, &mut JsonEncoder)?;
    tracing::info!(
        known = store.len(),
        skipped = report.skipped(),
        failed = report.failed(),
        "reference faces loaded"
    );

    let mut source = ReplaySource::open(&args.frames)?;
    let mut sink = TracingSink::default();
    let mut scheduler = Scheduler::new(FrameAnalyzer::new(store, &config)?, args.fps);

    let stats = scheduler.run(&mut source, &mut sink)?;

    println!(
        "frames: {}, falls: {}, recognized: {}, unknown: {}, deadline misses: {}, worst frame: {:?}",
        stats.total_frames,
        stats.falls,
        sink.recognized,
        sink.unknown,
        stats.deadline_misses,
        stats.worst_case
    );
    Ok(())
}
