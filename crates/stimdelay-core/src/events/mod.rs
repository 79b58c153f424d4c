//! Digital trigger events
//!
//! This module contains everything operating on the trigger channel:
//! - Level-transition scanning with debounce ([`extract`])
//! - Proximity-based thinning of rapid trigger trains ([`filter`])

pub mod extract;
pub mod filter;

pub use extract::find_events;
pub use filter::filter_events_too_close;

use serde::{Deserialize, Serialize};

/// A digital trigger event
///
/// Sample indices are absolute: buffer index plus the recording's
/// first-sample offset. Sequences of events are ordered non-decreasing in
/// `sample` at every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Absolute sample index of the trigger onset
    pub sample: usize,
    /// Trigger-channel value before the transition; rewritten with the
    /// delay-sample correction term in corrected-event output
    pub prior: i32,
    /// Trigger code (channel value during the pulse)
    pub code: i32,
}

impl Event {
    /// Buffer-relative index of this event for a recording starting at
    /// `first_samp`
    pub fn relative_to(&self, first_samp: usize) -> usize {
        self.sample - first_samp
    }
}
