//! Errors produced by the delay-estimation pipeline

use thiserror::Error;

/// Errors that can occur during delay extraction
///
/// None of these are retried internally. Configuration problems are surfaced
/// before any computation starts; the other two reflect data-quality issues
/// the caller has to resolve by adjusting parameters or re-acquiring.
#[derive(Error, Debug)]
pub enum DelayError {
    /// Invalid caller-supplied configuration: unknown channel name, invalid
    /// output mode, malformed window
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Threshold statistics are degenerate (empty baseline, NaN, or zero
    /// variance); fatal for the whole call, no partial results
    #[error("threshold estimation failed: {0}")]
    Estimation(String),

    /// The crossing search exhausted its lookahead window on an event that is
    /// not the last in the sequence
    #[error(
        "no analogue trigger found within {lookahead} samples of event #{ordinal} \
         (code {code}), {sample} samples into the recording"
    )]
    NoCrossingFound {
        /// Ordinal position of the event in the filtered sequence
        ordinal: usize,
        /// Trigger code of the event
        code: i32,
        /// Recording-relative sample index of the event
        sample: usize,
        /// Lookahead window that was exhausted (samples)
        lookahead: usize,
    },
}
