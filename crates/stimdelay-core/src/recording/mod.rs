//! In-memory multi-channel recording model
//!
//! This module contains the recording buffer and its collaborators:
//! - The [`Recording`] type itself: named channels over one 2D sample buffer
//! - Generic binary container I/O ([`binary`])
//! - BrainVision vendor format loading ([`brainvision`])
//! - Per-event aligned segment extraction ([`epochs`])

pub mod binary;
pub mod brainvision;
pub mod epochs;

use crate::error::DelayError;
use crate::filters::{zero_phase, Biquad};
use thiserror::Error;

/// Errors that can occur while loading a recording from disk
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a stimdelay recording container (bad magic)")]
    BadMagic,

    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u16),

    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("missing header entry: {0}")]
    MissingEntry(String),

    #[error("malformed recording file: {0}")]
    Malformed(String),
}

/// An immutable multi-channel time series
///
/// Holds one 2D numeric buffer (channels x samples) together with the sample
/// rate, the channel names, and the absolute index of the first buffered
/// sample. Event sample indices are absolute, so they are converted to buffer
/// indices by subtracting [`Recording::first_samp`].
///
/// The delay-estimation pipeline only reads the buffer; the one exception is
/// the optional band-pass of the analogue channel, which rewrites exactly one
/// row in place and never touches channel names or alignment.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Sample rate in Hz
    sfreq: f64,
    /// Absolute index of the first sample in the buffer
    first_samp: usize,
    /// Channel names, one per buffer row
    ch_names: Vec<String>,
    /// Sample buffer, channels x samples
    data: Vec<Vec<f64>>,
}

impl Recording {
    /// Create a recording from a pre-loaded buffer
    ///
    /// # Panics
    /// Panics if `sfreq` is not positive, if the number of names does not
    /// match the number of buffer rows, or if the rows have unequal lengths.
    pub fn new(sfreq: f64, first_samp: usize, ch_names: Vec<String>, data: Vec<Vec<f64>>) -> Self {
        assert!(sfreq > 0.0, "Sample rate must be positive");
        assert_eq!(
            ch_names.len(),
            data.len(),
            "Channel name count must match buffer row count"
        );
        if let Some(first) = data.first() {
            assert!(
                data.iter().all(|row| row.len() == first.len()),
                "All channels must have the same number of samples"
            );
        }

        Self {
            sfreq,
            first_samp,
            ch_names,
            data,
        }
    }

    /// Sample rate in Hz
    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    /// Absolute index of the first buffered sample
    pub fn first_samp(&self) -> usize {
        self.first_samp
    }

    /// Number of channels
    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    /// Number of samples per channel
    pub fn n_samples(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// Channel names, in buffer row order
    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Row index of a channel by name
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|n| n == name)
    }

    /// Row index of a channel by name, as a configuration error when absent
    pub fn pick_channel(&self, name: &str) -> Result<usize, DelayError> {
        self.channel_index(name)
            .ok_or_else(|| DelayError::Configuration(format!("channel not found: {name}")))
    }

    /// Samples of one channel
    pub fn channel(&self, idx: usize) -> &[f64] {
        &self.data[idx]
    }

    /// Rectified (absolute-valued) copy of one channel
    ///
    /// Computed once per extraction and shared read-only across all crossing
    /// searches.
    pub fn rectified(&self, idx: usize) -> Vec<f64> {
        self.data[idx].iter().map(|v| v.abs()).collect()
    }

    /// Band-pass one channel in place with zero-phase Butterworth sections
    ///
    /// `l_freq` installs a high-pass, `h_freq` a low-pass; either may be
    /// omitted for a one-sided filter. Each section runs forward and backward
    /// so onset timing is not biased by filter phase delay.
    pub fn band_pass(
        &mut self,
        idx: usize,
        l_freq: Option<f64>,
        h_freq: Option<f64>,
    ) -> Result<(), DelayError> {
        let nyquist = self.sfreq / 2.0;
        for freq in [l_freq, h_freq].into_iter().flatten() {
            if freq <= 0.0 || freq >= nyquist {
                return Err(DelayError::Configuration(format!(
                    "filter frequency {freq} Hz outside (0, {nyquist}) Hz"
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (l_freq, h_freq) {
            if lo >= hi {
                return Err(DelayError::Configuration(format!(
                    "band-pass edges out of order: ({lo}, {hi})"
                )));
            }
        }

        let sfreq = self.sfreq;
        let row = &mut self.data[idx];
        if let Some(hi) = h_freq {
            zero_phase(|| Biquad::low_pass(hi, sfreq), row);
        }
        if let Some(lo) = l_freq {
            zero_phase(|| Biquad::high_pass(lo, sfreq), row);
        }
        Ok(())
    }

    /// Convert a time offset in seconds to a signed sample offset
    pub fn time_to_samples(&self, t: f64) -> i64 {
        (t * self.sfreq).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_channel() -> Recording {
        Recording::new(
            1000.0,
            10,
            vec!["STI101".into(), "MISC001".into()],
            vec![vec![0.0; 100], vec![-1.0; 100]],
        )
    }

    #[test]
    fn test_channel_lookup() {
        let raw = two_channel();
        assert_eq!(raw.channel_index("MISC001"), Some(1));
        assert_eq!(raw.channel_index("MISC002"), None);
        assert!(raw.pick_channel("STI101").is_ok());
    }

    #[test]
    fn test_missing_channel_is_configuration_error() {
        let raw = two_channel();
        let err = raw.pick_channel("EOG001").unwrap_err();
        assert!(matches!(err, DelayError::Configuration(_)));
    }

    #[test]
    fn test_rectified_collapses_polarity() {
        let raw = two_channel();
        let ana = raw.rectified(1);
        assert!(ana.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_time_to_samples_rounds() {
        let raw = two_channel();
        assert_eq!(raw.time_to_samples(-0.1), -100);
        assert_eq!(raw.time_to_samples(0.0205), 21);
    }

    #[test]
    fn test_band_pass_rejects_bad_edges() {
        let mut raw = two_channel();
        assert!(raw.band_pass(1, Some(40.0), Some(10.0)).is_err());
        assert!(raw.band_pass(1, None, Some(600.0)).is_err());
    }

    #[test]
    #[should_panic(expected = "same number of samples")]
    fn test_ragged_buffer_rejected() {
        Recording::new(
            1000.0,
            0,
            vec!["A".into(), "B".into()],
            vec![vec![0.0; 10], vec![0.0; 9]],
        );
    }
}
