//! Per-event aligned segment extraction
//!
//! Cuts one channel of a recording into fixed-length segments around each
//! event. Used for baseline statistics (threshold estimation) and for the
//! diagnostic amplitude scan in the statistics report. Events whose window
//! does not fit inside the buffer are dropped, mirroring how incomplete
//! trials at the recording edges are handled everywhere else.

use crate::events::Event;
use crate::recording::Recording;

/// Per-event aligned segments of one channel
#[derive(Debug, Clone)]
pub struct Epochs {
    /// One segment per surviving event, all the same length
    segments: Vec<Vec<f64>>,
    /// Events dropped because their window fell outside the buffer
    n_dropped: usize,
}

impl Epochs {
    /// Cut `channel` into segments on the inclusive window `[tmin, tmax]`
    /// (seconds) around each event
    pub fn new(raw: &Recording, events: &[Event], channel: usize, tmin: f64, tmax: f64) -> Self {
        let data = raw.channel(channel);
        let start_off = raw.time_to_samples(tmin);
        let end_off = raw.time_to_samples(tmax);

        let mut segments = Vec::with_capacity(events.len());
        let mut n_dropped = 0usize;

        for eve in events {
            let rel = eve.sample as i64 - raw.first_samp() as i64;
            let start = rel + start_off;
            let end = rel + end_off;
            if start < 0 || end < start || end >= data.len() as i64 {
                n_dropped += 1;
                continue;
            }
            segments.push(data[start as usize..=end as usize].to_vec());
        }

        if n_dropped > 0 {
            tracing::debug!(
                dropped = n_dropped,
                kept = segments.len(),
                "epochs outside the buffer were dropped"
            );
        }

        Self {
            segments,
            n_dropped,
        }
    }

    /// Surviving segments, one per event
    pub fn segments(&self) -> &[Vec<f64>] {
        &self.segments
    }

    /// Number of surviving segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if no event window fit inside the buffer
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of events dropped for falling outside the buffer
    pub fn n_dropped(&self) -> usize {
        self.n_dropped
    }

    /// Smallest sample value over all segments and times
    pub fn min_amplitude(&self) -> Option<f64> {
        self.segments
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.min(v))))
    }

    /// Largest sample value over all segments and times
    pub fn max_amplitude(&self) -> Option<f64> {
        self.segments
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}
