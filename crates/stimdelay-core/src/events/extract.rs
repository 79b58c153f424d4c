//! Trigger-channel event extraction
//!
//! Scans the digital stimulus channel for level transitions. A run of
//! constant nonzero value that persists for at least the minimum pulse
//! duration yields one event at the run's first sample; shorter runs are
//! treated as line glitches and suppressed.

use crate::error::DelayError;
use crate::events::Event;
use crate::recording::Recording;

/// Acquisitions faster than this are assumed to carry MEG-style trigger
/// lines, which need a longer debounce than EEG amplifiers
const HIGH_RATE_SFREQ: f64 = 2000.0;

/// Debounce applied to high-rate acquisitions when none is given (seconds)
const HIGH_RATE_MIN_DURATION: f64 = 0.002;

/// Find trigger events on the named stimulus channel
///
/// # Arguments
/// * `raw` - The recording to scan
/// * `stim_channel` - Name of the digital trigger channel
/// * `min_duration` - Minimum pulse duration in seconds. `None` selects
///   2 ms for sample rates above 2 kHz and no debounce otherwise.
/// * `include` - Optional allow-list of trigger codes; events with other
///   codes are dropped, order is preserved
///
/// # Returns
/// Events ordered by non-decreasing absolute sample index, or
/// [`DelayError::Configuration`] if the channel does not exist.
pub fn find_events(
    raw: &Recording,
    stim_channel: &str,
    min_duration: Option<f64>,
    include: Option<&[i32]>,
) -> Result<Vec<Event>, DelayError> {
    let stim_idx = raw.pick_channel(stim_channel)?;
    let data = raw.channel(stim_idx);

    let min_duration = min_duration.unwrap_or(if raw.sfreq() > HIGH_RATE_SFREQ {
        HIGH_RATE_MIN_DURATION
    } else {
        0.0
    });
    let min_samples = ((min_duration * raw.sfreq()).round() as usize).max(1);

    let mut events = Vec::new();
    if data.is_empty() {
        return Ok(events);
    }

    let value_at = |i: usize| data[i].round() as i32;

    let mut run_value = value_at(0);
    let mut run_start = 0usize;
    let mut prior = run_value;

    for i in 1..=data.len() {
        let value = if i < data.len() { value_at(i) } else { run_value.wrapping_add(1) };
        if value == run_value {
            continue;
        }

        // Run ended at i. The initial channel state is not an onset, so a
        // run starting at sample 0 never produces an event.
        let run_len = i - run_start;
        if run_value != 0 && run_start > 0 && run_len >= min_samples {
            events.push(Event {
                sample: raw.first_samp() + run_start,
                prior,
                code: run_value,
            });
        }

        prior = run_value;
        run_value = value;
        run_start = i;
    }

    if let Some(codes) = include {
        events.retain(|eve| codes.contains(&eve.code));
    }

    tracing::info!(
        count = events.len(),
        channel = stim_channel,
        min_samples,
        "trigger events extracted"
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_with_stim(stim: Vec<f64>, sfreq: f64, first_samp: usize) -> Recording {
        let n = stim.len();
        Recording::new(
            sfreq,
            first_samp,
            vec!["STI101".into(), "MISC001".into()],
            vec![stim, vec![0.0; n]],
        )
    }

    fn pulse(stim: &mut [f64], start: usize, len: usize, code: f64) {
        for v in &mut stim[start..start + len] {
            *v = code;
        }
    }

    #[test]
    fn test_unknown_channel_is_configuration_error() {
        let raw = recording_with_stim(vec![0.0; 10], 1000.0, 0);
        let err = find_events(&raw, "STI999", None, None).unwrap_err();
        assert!(matches!(err, DelayError::Configuration(_)));
    }

    #[test]
    fn test_single_pulse_onset_and_code() {
        let mut stim = vec![0.0; 200];
        pulse(&mut stim, 50, 20, 8.0);
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sample, 50);
        assert_eq!(events[0].code, 8);
        assert_eq!(events[0].prior, 0);
    }

    #[test]
    fn test_first_samp_offset_applied() {
        let mut stim = vec![0.0; 200];
        pulse(&mut stim, 50, 20, 2.0);
        let raw = recording_with_stim(stim, 1000.0, 3000);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events[0].sample, 3050);
        assert_eq!(events[0].relative_to(3000), 50);
    }

    #[test]
    fn test_ordering_is_non_decreasing() {
        let mut stim = vec![0.0; 1000];
        for (i, code) in [(100, 1.0), (300, 2.0), (500, 3.0), (700, 1.0)] {
            pulse(&mut stim, i, 30, code);
        }
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].sample <= w[1].sample));
    }

    #[test]
    fn test_short_pulse_debounced() {
        let mut stim = vec![0.0; 1000];
        pulse(&mut stim, 100, 2, 4.0); // 2 samples < 2 ms at 5 kHz
        pulse(&mut stim, 500, 60, 4.0);
        let raw = recording_with_stim(stim, 5000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 1, "Glitch pulse should be suppressed");
        assert_eq!(events[0].sample, 500);
    }

    #[test]
    fn test_low_rate_default_keeps_short_pulses() {
        let mut stim = vec![0.0; 1000];
        pulse(&mut stim, 100, 1, 4.0);
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 1, "No debounce expected at 1 kHz");
    }

    #[test]
    fn test_allow_list_drops_other_codes() {
        let mut stim = vec![0.0; 1000];
        pulse(&mut stim, 100, 30, 1.0);
        pulse(&mut stim, 300, 30, 2.0);
        pulse(&mut stim, 500, 30, 3.0);
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, Some(&[1, 3])).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].code, 1);
        assert_eq!(events[1].code, 3);
    }

    #[test]
    fn test_initial_nonzero_state_is_not_an_onset() {
        let mut stim = vec![5.0; 100];
        pulse(&mut stim, 60, 30, 2.0);
        for v in &mut stim[30..60] {
            *v = 0.0;
        }
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sample, 60);
    }

    #[test]
    fn test_pulse_running_to_buffer_end() {
        let mut stim = vec![0.0; 100];
        pulse(&mut stim, 80, 20, 7.0);
        let raw = recording_with_stim(stim, 1000.0, 0);

        let events = find_events(&raw, "STI101", None, None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sample, 80);
    }
}
