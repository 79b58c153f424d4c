//! Stimdelay - trigger-to-analogue delay estimation for EEG/MEG recordings
//!
//! This library re-exports the recording model, trigger extraction, and
//! delay-estimation functionality from `stimdelay-core`.

pub use stimdelay_core::delays;
pub use stimdelay_core::events;
pub use stimdelay_core::filters;
pub use stimdelay_core::recording;

pub use stimdelay_core::{
    extract_delays, DelayError, DelayOutput, DelayStats, Event, ExtractOptions, LoadError,
    OutputMode, Recording, Threshold,
};
pub use stimdelay_core::{DEFAULT_MAX_DELAY_SAMPLES, DEFAULT_SD_LIMIT, THRESHOLD_EVENT_CAP, VERSION};
