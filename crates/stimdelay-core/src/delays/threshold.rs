//! Adaptive detection threshold from baseline statistics
//!
//! The analogue channel's resting ("off") level and its noise are estimated
//! from short windows preceding a sample of the trigger events. The crossing
//! limit is a multiple of the baseline standard deviation, so the search
//! adapts to whatever noise the recording actually carries.

use crate::error::DelayError;
use crate::events::Event;
use crate::recording::epochs::Epochs;
use crate::recording::Recording;
use crate::THRESHOLD_EVENT_CAP;
use serde::Serialize;

/// Analogue-onset detection threshold
///
/// Computed once per extraction and read-only afterward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    /// Resting level of the rectified analogue channel
    pub baseline_level: f64,
    /// Crossing limit: deviation from the baseline that counts as an onset
    pub noise_limit: f64,
}

/// Estimate the detection threshold from baseline windows around the events
///
/// At most [`THRESHOLD_EVENT_CAP`] events are examined; larger sequences are
/// decimated to every Nth event with `N = ceil(len / cap)`. For each sampled
/// event the misc-channel segment on `[tmin, tmax]` around the trigger is
/// extracted and rectified. The baseline level is the mean over segments of
/// per-segment means, and the noise limit is `sd_limit` times the mean over
/// segments of per-segment standard deviations. Averaging per segment first
/// gives every trial equal weight.
///
/// # Arguments
/// * `raw` - The recording
/// * `events` - Filtered event sequence
/// * `misc_idx` - Row index of the analogue channel
/// * `baseline` - `(tmin, tmax)` window in seconds relative to each event
/// * `sd_limit` - Crossing limit in baseline standard deviations
///
/// # Returns
/// [`DelayError::Estimation`] when no segment fits inside the buffer or the
/// statistics come out degenerate (NaN or zero variance); callers must not
/// proceed to crossing search in that case.
pub fn estimate_threshold(
    raw: &Recording,
    events: &[Event],
    misc_idx: usize,
    baseline: (f64, f64),
    sd_limit: f64,
) -> Result<Threshold, DelayError> {
    let (tmin, tmax) = baseline;
    if tmin > tmax {
        return Err(DelayError::Configuration(format!(
            "malformed baseline window: ({tmin}, {tmax})"
        )));
    }

    let decim = if events.len() > THRESHOLD_EVENT_CAP {
        let step = events.len().div_ceil(THRESHOLD_EVENT_CAP);
        tracing::warn!(
            step,
            total = events.len(),
            "decimating events for threshold estimation"
        );
        step
    } else {
        1
    };
    let sampled: Vec<Event> = events.iter().copied().step_by(decim).collect();

    let epochs = Epochs::new(raw, &sampled, misc_idx, tmin, tmax);
    if epochs.is_empty() {
        return Err(DelayError::Estimation(
            "baseline window produced no usable segments".into(),
        ));
    }

    let mut mean_of_means = 0.0;
    let mut mean_of_stds = 0.0;
    for segment in epochs.segments() {
        let rectified: Vec<f64> = segment.iter().map(|v| v.abs()).collect();
        let mean = rectified.iter().sum::<f64>() / rectified.len() as f64;
        let var = rectified.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / rectified.len() as f64;
        mean_of_means += mean;
        mean_of_stds += var.sqrt();
    }
    let n = epochs.len() as f64;
    let baseline_level = mean_of_means / n;
    let noise_limit = sd_limit * (mean_of_stds / n);

    if !baseline_level.is_finite() || !noise_limit.is_finite() {
        return Err(DelayError::Estimation(
            "baseline statistics are not finite".into(),
        ));
    }
    if noise_limit == 0.0 {
        return Err(DelayError::Estimation(
            "baseline has zero variance; cannot derive a crossing limit".into(),
        ));
    }

    tracing::debug!(
        baseline_level,
        noise_limit,
        segments = epochs.len(),
        "threshold estimated"
    );
    Ok(Threshold {
        baseline_level,
        noise_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eve(sample: usize) -> Event {
        Event {
            sample,
            prior: 0,
            code: 1,
        }
    }

    /// Misc channel alternating between 0 and 2: rectified mean 1, std 1
    fn alternating_recording(n: usize) -> Recording {
        let misc: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.0 } else { 2.0 }).collect();
        Recording::new(
            1000.0,
            0,
            vec!["STI101".into(), "MISC001".into()],
            vec![vec![0.0; n], misc],
        )
    }

    #[test]
    fn test_known_statistics() {
        let raw = alternating_recording(2000);
        // Window of 100 samples (inclusive 101) before each event
        let threshold =
            estimate_threshold(&raw, &[eve(500), eve(1500)], 1, (-0.1, 0.0), 5.0).unwrap();
        assert_relative_eq!(threshold.baseline_level, 1.0, epsilon = 0.02);
        assert_relative_eq!(threshold.noise_limit, 5.0, epsilon = 0.02);
    }

    #[test]
    fn test_deterministic() {
        let raw = alternating_recording(2000);
        let events = [eve(400), eve(900), eve(1400)];
        let a = estimate_threshold(&raw, &events, 1, (-0.1, 0.0), 5.0).unwrap();
        let b = estimate_threshold(&raw, &events, 1, (-0.1, 0.0), 5.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_window_is_configuration_error() {
        let raw = alternating_recording(2000);
        let err = estimate_threshold(&raw, &[eve(500)], 1, (0.1, -0.1), 5.0).unwrap_err();
        assert!(matches!(err, DelayError::Configuration(_)));
    }

    #[test]
    fn test_no_events_is_estimation_error() {
        let raw = alternating_recording(2000);
        let err = estimate_threshold(&raw, &[], 1, (-0.1, 0.0), 5.0).unwrap_err();
        assert!(matches!(err, DelayError::Estimation(_)));
    }

    #[test]
    fn test_windows_outside_buffer_is_estimation_error() {
        let raw = alternating_recording(2000);
        // Window reaches 100 samples before an event at sample 10
        let err = estimate_threshold(&raw, &[eve(10)], 1, (-0.1, 0.0), 5.0).unwrap_err();
        assert!(matches!(err, DelayError::Estimation(_)));
    }

    #[test]
    fn test_flat_baseline_is_estimation_error() {
        let raw = Recording::new(
            1000.0,
            0,
            vec!["STI101".into(), "MISC001".into()],
            vec![vec![0.0; 2000], vec![3.0; 2000]],
        );
        let err = estimate_threshold(&raw, &[eve(500)], 1, (-0.1, 0.0), 5.0).unwrap_err();
        assert!(matches!(err, DelayError::Estimation(_)));
    }

    #[test]
    fn test_decimation_examines_every_second_event_of_310() {
        let n_events = 310usize;
        let spacing = 150usize;
        let n = 200 + n_events * spacing;
        let raw = alternating_recording(n);

        let events: Vec<Event> = (0..n_events).map(|i| eve(200 + i * spacing)).collect();
        let full = estimate_threshold(&raw, &events, 1, (-0.1, 0.0), 5.0).unwrap();

        // ceil(310 / 300) = 2: the estimate must equal one computed from
        // every 2nd event explicitly
        let decimated: Vec<Event> = events.iter().copied().step_by(2).collect();
        assert_eq!(decimated.len(), 155);
        let manual = estimate_threshold(&raw, &decimated, 1, (-0.1, 0.0), 5.0).unwrap();
        assert_eq!(full, manual);
    }
}
