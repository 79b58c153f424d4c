//! Delay estimation pipeline
//!
//! This module contains the delay-estimation stages and their orchestration:
//! - Adaptive threshold estimation from baseline statistics ([`threshold`])
//! - Bounded forward crossing search ([`crossing`])
//! - Aggregate reporting ([`stats`])
//! - The public operation [`extract_delays`] tying them together

pub mod crossing;
pub mod stats;
pub mod threshold;

pub use crossing::{find_crossing, Crossing};
pub use stats::DelayStats;
pub use threshold::{estimate_threshold, Threshold};

use crate::error::DelayError;
use crate::events::{filter_events_too_close, find_events, Event};
use crate::recording::epochs::Epochs;
use crate::recording::Recording;
use crate::{DEFAULT_MAX_DELAY_SAMPLES, DEFAULT_SD_LIMIT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Start of the diagnostic epoch window, relative to each event (seconds)
const DIAGNOSTIC_TMIN: f64 = -0.2;

/// Requested output view of a delay extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Per-event delays in milliseconds
    #[default]
    Delays,
    /// Aggregate delay statistics
    Stats,
    /// Timing-corrected event sequence
    Events,
}

impl FromStr for OutputMode {
    type Err = DelayError;

    /// Parse a mode name; anything unrecognized is a configuration error,
    /// raised before any computation happens
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delays" => Ok(OutputMode::Delays),
            "stats" => Ok(OutputMode::Stats),
            "events" => Ok(OutputMode::Events),
            other => Err(DelayError::Configuration(format!(
                "invalid output mode: {other}"
            ))),
        }
    }
}

/// Options for [`extract_delays`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Name of the digital trigger channel
    pub stim_channel: String,
    /// Name of the analogue reference channel
    pub misc_channel: String,
    /// Allow-list of trigger codes; `None` keeps all codes
    pub trigger_codes: Option<Vec<i32>>,
    /// End of the diagnostic epoch window (seconds after each event)
    pub epoch_tmax: f64,
    /// Baseline window `(tmin, tmax)` in seconds relative to each event
    pub baseline: (f64, f64),
    /// Optional high-pass edge for the analogue channel (Hz)
    pub l_freq: Option<f64>,
    /// Optional low-pass edge for the analogue channel (Hz)
    pub h_freq: Option<f64>,
    /// Shift every event by this many seconds before the search, to
    /// compensate a known systematic device lag
    pub time_shift: Option<f64>,
    /// Minimum allowed trigger separation in seconds; enables the proximity
    /// filter
    pub min_separation: Option<f64>,
    /// Minimum trigger pulse duration in seconds; `None` picks a
    /// rate-dependent default
    pub min_duration: Option<f64>,
    /// Requested output view
    pub output: OutputMode,
    /// Crossing limit in baseline standard deviations
    pub sd_limit: f64,
    /// Lookahead window of the crossing search (samples)
    pub max_delay_samples: usize,
    /// Scan the diagnostic epoch window for amplitude extrema in `Stats` mode
    pub diagnostic_epochs: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            stim_channel: "STI101".into(),
            misc_channel: "MISC001".into(),
            trigger_codes: None,
            epoch_tmax: 0.5,
            baseline: (-0.1, 0.0),
            l_freq: None,
            h_freq: None,
            time_shift: None,
            min_separation: None,
            min_duration: None,
            output: OutputMode::default(),
            sd_limit: DEFAULT_SD_LIMIT,
            max_delay_samples: DEFAULT_MAX_DELAY_SAMPLES,
            diagnostic_epochs: false,
        }
    }
}

/// Result of [`extract_delays`], shaped by the requested [`OutputMode`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayOutput {
    /// Per-event delay in milliseconds, same order and length as the
    /// filtered events
    Delays(Vec<f64>),
    /// Aggregate statistics over the delay array
    Stats(DelayStats),
    /// Events shifted by their measured delay, with the correction term in
    /// `prior`
    Events(Vec<Event>),
}

/// Estimate onset delays of the analogue channel relative to the triggers
///
/// Pipeline: validate configuration, optionally band-pass the analogue
/// channel, extract trigger events (debounced, allow-listed), optionally thin
/// rapid trigger trains and apply a systematic time shift, estimate the
/// detection threshold from baseline windows, then search forward from every
/// event for the first threshold crossing and report the offsets in the
/// requested view.
///
/// A missing crossing aborts the whole extraction for every event except the
/// last one; for the last event only, the delay sample is left at zero on the
/// assumption that the recording stopped after the trigger but before the
/// analogue response completed. That allowance applies to the final event
/// alone, not to missing crossings in general.
///
/// # Arguments
/// * `raw` - The recording; mutated only when a band-pass is requested
/// * `opts` - Extraction options, see [`ExtractOptions`]
pub fn extract_delays(
    raw: &mut Recording,
    opts: &ExtractOptions,
) -> Result<DelayOutput, DelayError> {
    let (tmin, tmax) = opts.baseline;
    if tmin > tmax {
        return Err(DelayError::Configuration(format!(
            "malformed baseline window: ({tmin}, {tmax})"
        )));
    }
    if opts.max_delay_samples == 0 {
        return Err(DelayError::Configuration(
            "lookahead window must be at least one sample".into(),
        ));
    }
    raw.pick_channel(&opts.stim_channel)?;
    let misc_idx = raw.pick_channel(&opts.misc_channel)?;

    if opts.l_freq.is_some() || opts.h_freq.is_some() {
        raw.band_pass(misc_idx, opts.l_freq, opts.h_freq)?;
    }

    let mut events = find_events(
        raw,
        &opts.stim_channel,
        opts.min_duration,
        opts.trigger_codes.as_deref(),
    )?;

    if let Some(min_separation) = opts.min_separation {
        let min_samples = (min_separation * raw.sfreq()) as usize;
        events = filter_events_too_close(&events, min_samples);
    }

    if let Some(time_shift) = opts.time_shift {
        let shift = (time_shift * raw.sfreq()) as i64;
        for eve in &mut events {
            let shifted = eve.sample as i64 + shift;
            if shifted < raw.first_samp() as i64 {
                return Err(DelayError::Configuration(format!(
                    "time shift {time_shift} s moves an event before the recording start"
                )));
            }
            eve.sample = shifted as usize;
        }
    }

    let mut delay_samples = vec![0usize; events.len()];
    let ana = raw.rectified(misc_idx);

    let threshold = estimate_threshold(raw, &events, misc_idx, opts.baseline, opts.sd_limit)?;

    let last = events.len().saturating_sub(1);
    for (row, eve) in events.iter().enumerate() {
        let rel = eve.relative_to(raw.first_samp());
        match find_crossing(&ana, rel, threshold, opts.max_delay_samples) {
            Crossing::Found(offset) => delay_samples[row] = offset,
            // Data collection may have ended after the final trigger but
            // before the response; leave that one delay at zero.
            Crossing::NotFound if row == last => {
                tracing::debug!(
                    ordinal = row,
                    sample = rel,
                    "no crossing for the final event; assuming a truncated trial"
                );
            }
            Crossing::NotFound => {
                return Err(DelayError::NoCrossingFound {
                    ordinal: row,
                    code: eve.code,
                    sample: rel,
                    lookahead: opts.max_delay_samples,
                });
            }
        }
    }

    let delays: Vec<f64> = delay_samples
        .iter()
        .map(|&d| d as f64 / raw.sfreq() * 1e3)
        .collect();

    match opts.output {
        OutputMode::Delays => Ok(DelayOutput::Delays(delays)),
        OutputMode::Stats => {
            let mut stats = DelayStats::from_delays(&delays);
            if opts.diagnostic_epochs {
                let epochs = Epochs::new(raw, &events, misc_idx, DIAGNOSTIC_TMIN, opts.epoch_tmax);
                stats.min_amp = epochs.min_amplitude();
                stats.max_amp = epochs.max_amplitude();
            }
            Ok(DelayOutput::Stats(stats))
        }
        OutputMode::Events => {
            let corrected = events
                .iter()
                .zip(&delay_samples)
                .map(|(eve, &d)| Event {
                    sample: eve.sample + d,
                    prior: d as i32,
                    code: eve.code,
                })
                .collect();
            Ok(DelayOutput::Events(corrected))
        }
    }
}
