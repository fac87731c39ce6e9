//! EMG Trigger Engine
//!
//! Replays a recorded sample stream (file or stdin) through the
//! segmentation engine and writes accepted segments as JSON lines.
//!
//! This is the entry point for standalone use. For library use, see lib.rs.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use emg_trigger::{
    sample_channel, EndPolicy, JsonLinesExporter, ReplayError, SampleReader, SegmentationConfig,
    SegmentationEngine, StreamRunner, TimestampMode,
};

#[derive(Parser, Debug)]
#[command(name = "emg-trigger", about = "Cut muscle activation bursts out of an EMG sample stream")]
struct Args {
    /// Recorded stream (`timestamp,ch0,ch1,...` per line). Reads stdin if omitted.
    input: Option<PathBuf>,

    /// Write accepted segments here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON engine configuration; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    channels: Option<usize>,

    #[arg(long)]
    window_size: Option<usize>,

    #[arg(long)]
    overlap: Option<f64>,

    #[arg(long)]
    threshold: Option<u32>,

    #[arg(long)]
    min_activity: Option<f64>,

    /// End recordings after this many seconds instead of debouncing.
    #[arg(long, conflicts_with = "stability_samples")]
    fixed_duration: Option<f64>,

    /// Quiet readings that end a recording.
    #[arg(long)]
    stability_samples: Option<usize>,

    /// Hard cap on samples per recording, whatever the end policy.
    #[arg(long)]
    max_recording_samples: Option<usize>,

    /// Stamp every position of a window with the window's newest timestamp.
    #[arg(long)]
    per_window_timestamps: bool,

    /// Samples queued between the reader and the engine.
    #[arg(long, default_value_t = 1024)]
    queue: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let engine = SegmentationEngine::new(config).context("invalid engine configuration")?;

    let input: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (tx, rx) = sample_channel(args.queue);
    let reader = thread::spawn(move || -> Result<(), ReplayError> {
        for sample in SampleReader::new(input) {
            match sample {
                Ok(sample) => {
                    if tx.send(sample).is_err() {
                        break;
                    }
                }
                Err(ReplayError::Parse { line, message }) => {
                    warn!("Skipping line {}: {}", line, message);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    });

    let report = match &args.output {
        Some(path) => {
            let sink = JsonLinesExporter::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            StreamRunner::new(engine, sink).run(rx)?.0
        }
        None => {
            let sink = JsonLinesExporter::new(io::stdout().lock());
            StreamRunner::new(engine, sink).run(rx)?.0
        }
    };

    match reader.join() {
        Ok(result) => result.context("failed to read sample stream")?,
        Err(_) => anyhow::bail!("sample reader thread panicked"),
    }

    info!(
        "Done: {} segments accepted, {} rejected, {} samples rejected",
        report.stats.segments_accepted, report.stats.segments_rejected, report.stats.samples_rejected
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<SegmentationConfig> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn build_config(args: &Args) -> Result<SegmentationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SegmentationConfig::default(),
    };

    if let Some(channels) = args.channels {
        config.channel_count = channels;
    }
    if let Some(window_size) = args.window_size {
        config.window_size = window_size;
    }
    if let Some(overlap) = args.overlap {
        config.overlap = overlap;
    }
    if let Some(threshold) = args.threshold {
        config.trigger_threshold = threshold;
    }
    if let Some(min_activity) = args.min_activity {
        config.min_activity_ratio = min_activity;
    }
    if let Some(secs) = args.fixed_duration {
        config.end_policy = EndPolicy::FixedDuration {
            max_duration_secs: secs,
        };
    }
    if let Some(stability_samples) = args.stability_samples {
        let max_duration_secs = match config.end_policy {
            EndPolicy::Debounce {
                max_duration_secs, ..
            } => max_duration_secs,
            EndPolicy::FixedDuration { max_duration_secs } => Some(max_duration_secs),
        };
        config.end_policy = EndPolicy::Debounce {
            stability_samples,
            max_duration_secs,
        };
    }
    if let Some(limit) = args.max_recording_samples {
        config.max_recording_samples = limit;
    }
    if args.per_window_timestamps {
        config.timestamp_mode = TimestampMode::PerWindow;
    }

    Ok(config)
}
