//! Free-running clock generator.
//!
//! The clock starts high at time zero, falls after the high phase and rises
//! again at every multiple of the period. Time zero itself is not an edge, so
//! the first rising edge is at one full period.

use loadcount_common::Frequency;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Which way the clock moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Low to high; the counter samples on this edge.
    Rising,
    /// High to low.
    Falling,
}

/// A clock transition at an absolute time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockEdge {
    /// When the transition happens, in femtoseconds.
    pub time_fs: u64,
    /// The direction of the transition.
    pub kind: EdgeKind,
}

/// A fixed-period clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    period_fs: u64,
    high_fs: u64,
}

impl Clock {
    /// Creates a clock with the given period. The high phase is half the
    /// period, rounded down.
    ///
    /// At least two full periods must fit in the femtosecond time range.
    pub fn new(period_fs: u64) -> Result<Self, SimError> {
        if period_fs < 2 || period_fs.checked_mul(2).is_none() {
            return Err(SimError::InvalidClockPeriod { period_fs });
        }
        Ok(Self {
            period_fs,
            high_fs: period_fs / 2,
        })
    }

    /// Creates a clock running at `frequency`.
    pub fn from_frequency(frequency: Frequency) -> Result<Self, SimError> {
        let period_fs = frequency
            .period_fs()
            .ok_or(SimError::InvalidClockPeriod { period_fs: 0 })?;
        Self::new(period_fs)
    }

    /// The clock period in femtoseconds.
    pub fn period_fs(&self) -> u64 {
        self.period_fs
    }

    /// The clock level at `time_fs`, after any edge at that time.
    pub fn level_at(&self, time_fs: u64) -> bool {
        time_fs % self.period_fs < self.high_fs
    }

    /// The first edge strictly after `time_fs`.
    ///
    /// Fails with [`SimError::TimeOverflow`] when that edge is past `u64::MAX`.
    pub fn next_edge_after(&self, time_fs: u64) -> Result<ClockEdge, SimError> {
        let overflow = || SimError::TimeOverflow { after_fs: time_fs };
        let cycle_start = time_fs - time_fs % self.period_fs;
        let fall = cycle_start.checked_add(self.high_fs).ok_or_else(overflow)?;
        if time_fs < fall {
            return Ok(ClockEdge {
                time_fs: fall,
                kind: EdgeKind::Falling,
            });
        }
        let rise = cycle_start
            .checked_add(self.period_fs)
            .ok_or_else(overflow)?;
        Ok(ClockEdge {
            time_fs: rise,
            kind: EdgeKind::Rising,
        })
    }
}
