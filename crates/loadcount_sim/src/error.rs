//! Simulation error types for the counter model kernel.
//!
//! The counter core itself is total; every variant here comes from the
//! surrounding machinery (clock setup, time budget, waveform output).

use std::io;

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The clock period cannot be split into a high and a low phase.
    #[error("invalid clock period: {period_fs} fs (must be at least 2 fs and fit twice in the time range)")]
    InvalidClockPeriod {
        /// The rejected period in femtoseconds.
        period_fs: u64,
    },

    /// A duration string could not be parsed.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The input string.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A waveform change was recorded for a signal that was never registered.
    #[error("unregistered waveform signal {0}")]
    UnregisteredSignal(u32),

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),

    /// The next event lies beyond the representable time range.
    #[error("simulation time overflow after {after_fs} fs")]
    TimeOverflow {
        /// The time the kernel could not advance past.
        after_fs: u64,
    },

    /// The simulation tried to advance past the configured time limit.
    #[error("time limit exceeded: {limit_fs} fs")]
    TimeLimitExceeded {
        /// The time limit in femtoseconds.
        limit_fs: u64,
    },
}
