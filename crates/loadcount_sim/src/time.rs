//! Simulation time with femtosecond precision and delta cycles.
//!
//! [`SimTime`] tracks both wall-clock simulation time (in femtoseconds) and
//! the delta cycle index within a single time step. Register updates queued
//! at a clock edge land one delta after the edge, which is what lets a reader
//! that samples exactly at the edge observe the pre-edge value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::SimError;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;
/// Femtoseconds per microsecond.
pub const FS_PER_US: u64 = 1_000_000_000;
/// Femtoseconds per millisecond.
pub const FS_PER_MS: u64 = 1_000_000_000_000;
/// Femtoseconds per second.
pub const FS_PER_S: u64 = FS_PER_MS * 1_000;

/// A simulation time point with femtosecond resolution and delta cycle tracking.
///
/// Ordered first by femtosecond timestamp, then by delta cycle index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Wall-clock simulation time in femtoseconds.
    pub fs: u64,
    /// Delta cycle index within the current time step.
    pub delta: u32,
}

impl SimTime {
    /// Creates a time point at time zero, delta zero.
    pub fn zero() -> Self {
        Self { fs: 0, delta: 0 }
    }

    /// Creates a time from a nanosecond value with delta 0.
    pub fn from_ns(ns: u64) -> Self {
        Self::from_fs(ns * FS_PER_NS)
    }

    /// Creates a time from a microsecond value with delta 0.
    pub fn from_us(us: u64) -> Self {
        Self::from_fs(us * FS_PER_US)
    }

    /// Creates a time from a femtosecond value with delta 0.
    pub fn from_fs(fs: u64) -> Self {
        Self { fs, delta: 0 }
    }

    /// Returns the next delta cycle at the same wall-clock time.
    pub fn next_delta(&self) -> Self {
        Self {
            fs: self.fs,
            delta: self.delta + 1,
        }
    }

    /// Advances to a new wall-clock time, resetting the delta counter.
    pub fn advance_to(&self, new_fs: u64) -> Self {
        debug_assert!(
            new_fs >= self.fs,
            "cannot advance backwards: {} -> {}",
            self.fs,
            new_fs
        );
        Self {
            fs: new_fs,
            delta: 0,
        }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fs.cmp(&other.fs).then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_fs(self.fs))?;
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}

/// Formats a femtosecond quantity with the largest unit that divides it evenly.
pub fn format_fs(fs: u64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (FS_PER_S, "s"),
        (FS_PER_MS, "ms"),
        (FS_PER_US, "us"),
        (FS_PER_NS, "ns"),
        (FS_PER_PS, "ps"),
    ];
    if fs == 0 {
        return "0 fs".to_string();
    }
    UNITS
        .iter()
        .find(|(scale, _)| fs >= *scale && fs % *scale == 0)
        .map(|(scale, unit)| format!("{} {unit}", fs / scale))
        .unwrap_or_else(|| format!("{fs} fs"))
}

/// Parses a human-readable duration string into femtoseconds.
///
/// Supports units `fs`, `ps`, `ns`, `us`, `ms`, `s`, e.g. `"1ns"`, `"10 us"`.
pub fn parse_duration(s: &str) -> Result<u64, SimError> {
    let s = s.trim();
    let invalid = |reason: &str| SimError::InvalidDuration {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let digit_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if digit_end == 0 {
        return Err(invalid("no numeric value"));
    }
    let number: u64 = s[..digit_end]
        .parse()
        .map_err(|_| invalid("number out of range"))?;

    let multiplier = match s[digit_end..].trim() {
        "fs" => 1,
        "ps" => FS_PER_PS,
        "ns" => FS_PER_NS,
        "us" => FS_PER_US,
        "ms" => FS_PER_MS,
        "s" => FS_PER_S,
        "" => return Err(invalid("missing unit (use fs, ps, ns, us, ms, or s)")),
        _ => return Err(invalid("unknown unit (use fs, ps, ns, us, ms, or s)")),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("duration overflows 64-bit femtoseconds"))
}
