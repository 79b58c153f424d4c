//! Stimdelay - trigger-to-analogue delay estimation CLI
//!
//! Loads a recording, runs the delay extraction, and prints the requested
//! report (per-event delays, aggregate statistics, or corrected events),
//! either human-readable or as JSON.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use stimdelay::{
    extract_delays, recording, DelayOutput, ExtractOptions, OutputMode, Recording,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "stimdelay",
    version,
    about = "Estimate trigger-to-analogue onset delays in EEG/MEG recordings"
)]
struct Args {
    /// Recording file: a BrainVision header (.vhdr) or a stimdelay binary
    /// container
    recording: PathBuf,

    /// Name of the digital trigger channel
    #[arg(long, default_value = "STI101")]
    stim_channel: String,

    /// Name of the analogue reference channel
    #[arg(long, default_value = "MISC001")]
    misc_channel: String,

    /// Trigger codes to include, comma-separated (default: all)
    #[arg(long, value_delimiter = ',')]
    codes: Option<Vec<i32>>,

    /// Output view: delays | stats | events
    #[arg(long, default_value = "delays")]
    output: String,

    /// Minimum allowed trigger separation in seconds
    #[arg(long)]
    min_separation: Option<f64>,

    /// Shift all events by this many seconds before the search
    #[arg(long)]
    time_shift: Option<f64>,

    /// High-pass edge for the analogue channel (Hz)
    #[arg(long)]
    l_freq: Option<f64>,

    /// Low-pass edge for the analogue channel (Hz)
    #[arg(long)]
    h_freq: Option<f64>,

    /// Minimum trigger pulse duration in seconds
    #[arg(long)]
    min_duration: Option<f64>,

    /// Crossing limit in baseline standard deviations
    #[arg(long, default_value_t = 5.0)]
    sd_limit: f64,

    /// Lookahead window of the crossing search (samples)
    #[arg(long, default_value_t = 1000)]
    max_delay: usize,

    /// Baseline window start in seconds, relative to each event
    #[arg(long, default_value_t = -0.1, allow_hyphen_values = true)]
    baseline_tmin: f64,

    /// Baseline window end in seconds, relative to each event
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    baseline_tmax: f64,

    /// Diagnostic epoch end in seconds (stats mode amplitude scan)
    #[arg(long, default_value_t = 0.5)]
    epoch_tmax: f64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stimdelay=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    // Validate the requested view before touching the data
    let output: OutputMode = args.output.parse()?;

    let mut raw = load_recording(&args.recording)
        .with_context(|| format!("failed to load {}", args.recording.display()))?;
    info!(
        sfreq = raw.sfreq(),
        n_channels = raw.n_channels(),
        n_samples = raw.n_samples(),
        "recording loaded"
    );

    let opts = ExtractOptions {
        stim_channel: args.stim_channel,
        misc_channel: args.misc_channel,
        trigger_codes: args.codes,
        epoch_tmax: args.epoch_tmax,
        baseline: (args.baseline_tmin, args.baseline_tmax),
        l_freq: args.l_freq,
        h_freq: args.h_freq,
        time_shift: args.time_shift,
        min_separation: args.min_separation,
        min_duration: args.min_duration,
        output,
        sd_limit: args.sd_limit,
        max_delay_samples: args.max_delay,
        diagnostic_epochs: output == OutputMode::Stats,
    };

    let result = extract_delays(&mut raw, &opts).context("delay extraction failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&args.recording, &result);
    }
    Ok(())
}

/// Pick a loader from the file extension: `.vhdr` means BrainVision,
/// anything else the stimdelay binary container
fn load_recording(path: &Path) -> Result<Recording> {
    let raw = match path.extension().and_then(|e| e.to_str()) {
        Some("vhdr") => recording::brainvision::read_brainvision(path)?,
        _ => recording::binary::read_recording(path)?,
    };
    Ok(raw)
}

fn print_report(path: &Path, result: &DelayOutput) {
    println!(
        "# stimdelay v{} - {} - {}",
        stimdelay::VERSION,
        path.display(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    match result {
        DelayOutput::Delays(delays) => {
            println!("# {} events", delays.len());
            for (i, delay) in delays.iter().enumerate() {
                println!("{i}\t{delay:.3} ms");
            }
        }
        DelayOutput::Stats(stats) => {
            println!("mean   {:>10.3} ms", stats.mean);
            println!("std    {:>10.3} ms", stats.std);
            println!("median {:>10.3} ms", stats.median);
            println!("q10    {:>10.3} ms", stats.q10);
            println!("q90    {:>10.3} ms", stats.q90);
            if let (Some(min), Some(max)) = (stats.min_amp, stats.max_amp) {
                println!("amp    [{min:.6}, {max:.6}]");
            }
        }
        DelayOutput::Events(events) => {
            println!("# sample\tcorrection\tcode");
            for eve in events {
                println!("{}\t{}\t{}", eve.sample, eve.prior, eve.code);
            }
        }
    }
}
