//! Stimdelay Core - recording model, trigger extraction, and delay estimation
//!
//! This library measures the timing delay between digital trigger events and
//! the corresponding analogue signal onsets in an EEG/MEG recording. It scans
//! a stimulus channel for trigger transitions, derives a detection threshold
//! from baseline statistics around the triggers, and searches the analogue
//! channel for the first sample crossing that threshold after each trigger.

pub mod delays;
pub mod error;
pub mod events;
pub mod filters;
pub mod recording;

pub use delays::{extract_delays, DelayOutput, DelayStats, ExtractOptions, OutputMode, Threshold};
pub use error::DelayError;
pub use events::Event;
pub use recording::{LoadError, Recording};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default lookahead window for the analogue crossing search (samples)
pub const DEFAULT_MAX_DELAY_SAMPLES: usize = 1000;

/// Maximum number of events examined when estimating the detection threshold
pub const THRESHOLD_EVENT_CAP: usize = 300;

/// Default crossing limit in baseline standard deviations
pub const DEFAULT_SD_LIMIT: f64 = 5.0;
