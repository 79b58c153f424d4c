//! Aggregate delay statistics
//!
//! Summary view of a completed delay array: central tendency, spread, and
//! tail percentiles, all in milliseconds, plus the analogue amplitude range
//! observed over the diagnostic epoch window when one was requested.

use serde::Serialize;

/// Aggregate statistics over per-event delays (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayStats {
    /// Mean delay
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Median delay
    pub median: f64,
    /// 10th percentile (linear interpolation)
    pub q10: f64,
    /// 90th percentile (linear interpolation)
    pub q90: f64,
    /// Smallest analogue amplitude over the diagnostic epochs, when computed
    pub min_amp: Option<f64>,
    /// Largest analogue amplitude over the diagnostic epochs, when computed
    pub max_amp: Option<f64>,
}

impl DelayStats {
    /// Compute summary statistics over a delay array
    ///
    /// Amplitude extrema start out as `None`; the caller fills them in when
    /// diagnostic epoching ran.
    ///
    /// # Panics
    /// Panics if `delays` is empty.
    pub fn from_delays(delays: &[f64]) -> Self {
        assert!(!delays.is_empty(), "Cannot summarize an empty delay array");

        let n = delays.len() as f64;
        let mean = delays.iter().sum::<f64>() / n;
        let var = delays.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = delays.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("delays must not be NaN"));

        Self {
            mean,
            std: var.sqrt(),
            median: percentile(&sorted, 50.0),
            q10: percentile(&sorted, 10.0),
            q90: percentile(&sorted, 90.0),
            min_amp: None,
            max_amp: None,
        }
    }
}

/// Linear-interpolation percentile over an already sorted slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
