//! Proximity-based event thinning
//!
//! When stimuli are presented rapidly, delay estimation is often wanted for
//! the first trigger of a block only. This filter drops events that follow
//! their most recently kept predecessor too closely.

use crate::events::Event;

/// Drop events closer than `min_samples` to the previously kept event
///
/// The first event is always kept. After that, an event survives iff its
/// sample index is at least `min_samples` past the last kept event's, so the
/// result is stable under repeated filtering with the same separation.
///
/// # Arguments
/// * `events` - Ordered event sequence (non-decreasing sample index)
/// * `min_samples` - Minimum allowed separation in samples
pub fn filter_events_too_close(events: &[Event], min_samples: usize) -> Vec<Event> {
    let mut kept: Vec<Event> = Vec::with_capacity(events.len());
    let mut prev_kept = 0usize;

    for (i, eve) in events.iter().enumerate() {
        if i == 0 || eve.sample - prev_kept >= min_samples {
            kept.push(*eve);
            prev_kept = eve.sample;
        }
    }

    tracing::info!(
        retained = kept.len(),
        total = events.len(),
        min_samples,
        "events remain after proximity filtering"
    );
    kept
}
