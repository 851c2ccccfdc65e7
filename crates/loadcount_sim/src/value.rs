//! Signal identifiers and multi-driver resolution for the shared bus.
//!
//! The bidirectional `uio` pads have two potential drivers: the counter core
//! (through `uio_out`/`uio_oe`) and whatever the testbench drives onto
//! `uio_in`. [`resolve_drivers`] combines them the way a wired net would,
//! so a harness can check that releasing the bus really avoids contention.

use loadcount_common::LogicVec;
use serde::{Deserialize, Serialize};

/// Opaque ID for a recorded simulation signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SimSignalId(u32);

impl SimSignalId {
    /// Creates a `SimSignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Drive strength levels, ordered from weakest to strongest.
///
/// When drivers disagree, the strongest wins; equal-strength disagreement
/// produces X on the affected bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DriveStrength {
    /// Not driven.
    HighImpedance,
    /// Normal output buffer drive.
    Strong,
}

/// A single driver contributing a value to a net.
#[derive(Clone, Debug, PartialEq)]
pub struct Driver {
    /// The value this driver is asserting.
    pub value: LogicVec,
    /// The strength of this driver.
    pub strength: DriveStrength,
}

impl Driver {
    /// A strong driver asserting `value` on a `width`-bit net.
    pub fn strong(value: u64, width: u32) -> Self {
        Self {
            value: LogicVec::from_u64(value, width),
            strength: DriveStrength::Strong,
        }
    }

    /// A released (tri-stated) driver on a `width`-bit net.
    pub fn released(width: u32) -> Self {
        Self {
            value: LogicVec::all_z(width),
            strength: DriveStrength::HighImpedance,
        }
    }
}

/// The value seen on a net after resolving all of its drivers.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// The resolved per-bit value.
    pub value: LogicVec,
    /// The winning drive strength.
    pub strength: DriveStrength,
}

impl Resolution {
    /// Returns true if two equally strong drivers disagreed on any bit.
    pub fn is_conflict(&self) -> bool {
        self.value.has_x()
    }
}

/// Resolves multiple drivers to a single value and strength.
///
/// Resolution rules:
/// 1. No drivers, or only released ones, yields all-Z at `HighImpedance`.
/// 2. Only drivers at the maximum strength participate.
/// 3. Participating drivers are folded together with [`LogicVec::resolve`],
///    so agreement keeps the value and disagreement yields X.
pub fn resolve_drivers(drivers: &[Driver], width: u32) -> Resolution {
    let max_strength = drivers
        .iter()
        .map(|d| d.strength)
        .max()
        .unwrap_or(DriveStrength::HighImpedance);

    if max_strength == DriveStrength::HighImpedance {
        return Resolution {
            value: LogicVec::all_z(width),
            strength: DriveStrength::HighImpedance,
        };
    }

    let value = drivers
        .iter()
        .filter(|d| d.strength == max_strength)
        .fold(LogicVec::all_z(width), |acc, d| acc.resolve(&d.value));

    Resolution {
        value,
        strength: max_strength,
    }
}
