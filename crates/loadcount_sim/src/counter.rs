//! Behavioral model of the counter / parallel-load / tri-state block.
//!
//! The block is one 8-bit register, a priority decode of its control inputs
//! and a tri-state output buffer:
//!
//! ```text
//! on rising edge:
//!     reset        -> count := 0
//!     !enable      -> count := count
//!     load         -> count := bus_in
//!     otherwise    -> count := count + 1 (mod 256)
//!
//! always:
//!     drive_enable := output_enable
//!     bus_out      := drive_enable ? count : Z
//! ```
//!
//! `load` samples `bus_in` even when `output_enable` is also set; the model
//! never reads back its own drive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ports::ControlWord;

/// Wrapping 8-bit increment: `(v + 1) mod 256`.
pub fn increment(value: u8) -> u8 {
    value.wrapping_add(1)
}

/// The value the core presents on the shared bus.
///
/// `None` is high-impedance: the core is not driving and the bus carries
/// whatever an external source puts on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusOut(Option<u8>);

impl BusOut {
    /// The released bus.
    pub const HIGH_Z: BusOut = BusOut(None);

    /// A bus driven with `value`.
    pub fn driven(value: u8) -> Self {
        Self(Some(value))
    }

    /// The driven value, or `None` when high-impedance.
    pub fn value(self) -> Option<u8> {
        self.0
    }

    /// Returns true if the core is driving the bus.
    pub fn is_driven(self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for BusOut {
    /// `0xA5` when driven, `Z` when released.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:#04X}"),
            None => f.write_str("Z"),
        }
    }
}

/// Logical inputs sampled by the core on a rising clock edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreInputs {
    /// Reset asserted (the port is active low; this is already decoded).
    pub reset: bool,
    /// Module-active gate.
    pub enable: bool,
    /// Load and output-enable bits.
    pub control: ControlWord,
    /// Value on the external input side of the bus.
    pub bus_in: u8,
}

/// Combinational outputs of the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreOutputs {
    /// True exactly when the core drives the bus.
    pub drive_enable: bool,
    /// The register value when driving, high-impedance otherwise.
    pub bus_out: BusOut,
}

/// The counter register and its next-state logic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterCore {
    count: u8,
}

impl CounterCore {
    /// Creates a core in its power-up state (register 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// The current register value.
    pub fn register(&self) -> u8 {
        self.count
    }

    /// Evaluates the transition rule without applying it.
    pub fn next_state(&self, inputs: &CoreInputs) -> u8 {
        if inputs.reset {
            0
        } else if !inputs.enable {
            self.count
        } else if inputs.control.load() {
            inputs.bus_in
        } else {
            increment(self.count)
        }
    }

    /// Applies one rising clock edge and returns the new register value.
    pub fn clock_edge(&mut self, inputs: &CoreInputs) -> u8 {
        self.count = self.next_state(inputs);
        self.count
    }

    /// Overwrites the register, as a non-blocking update landing after an edge.
    pub(crate) fn commit(&mut self, value: u8) {
        self.count = value;
    }

    /// Evaluates the output rule for the given control word.
    pub fn outputs(&self, control: ControlWord) -> CoreOutputs {
        let drive_enable = control.output_enable();
        CoreOutputs {
            drive_enable,
            bus_out: if drive_enable {
                BusOut::driven(self.count)
            } else {
                BusOut::HIGH_Z
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(reset: bool, enable: bool, control: ControlWord, bus_in: u8) -> CoreInputs {
        CoreInputs {
            reset,
            enable,
            control,
            bus_in,
        }
    }

    fn core_at(count: u8) -> CounterCore {
        let mut core = CounterCore::new();
        core.commit(count);
        core
    }

    #[test]
    fn increment_wraps_for_every_value() {
        for v in 0..=u8::MAX {
            assert_eq!(u16::from(increment(v)), (u16::from(v) + 1) % 256);
        }
        assert_eq!(increment(255), 0);
    }

    #[test]
    fn power_up_register_is_zero() {
        assert_eq!(CounterCore::new().register(), 0);
    }

    #[test]
    fn counts_when_enabled() {
        let mut core = core_at(41);
        let next = core.clock_edge(&inputs(false, true, ControlWord::DRIVE, 0));
        assert_eq!(next, 42);
        assert_eq!(core.register(), 42);
    }

    #[test]
    fn counter_wraps_at_255() {
        let mut core = core_at(255);
        core.clock_edge(&inputs(false, true, ControlWord::IDLE, 0));
        assert_eq!(core.register(), 0);
    }

    #[test]
    fn load_overrides_increment_from_any_value() {
        for prior in [0u8, 1, 0x7F, 0xA4, 0xFF] {
            let mut core = core_at(prior);
            core.clock_edge(&inputs(false, true, ControlWord::LOAD, 0xA5));
            assert_eq!(core.register(), 0xA5, "prior value {prior:#04x}");
        }
    }

    #[test]
    fn reset_dominates_every_other_input() {
        for control in [
            ControlWord::IDLE,
            ControlWord::LOAD,
            ControlWord::DRIVE,
            ControlWord::new(true, true),
        ] {
            for enable in [false, true] {
                let core = core_at(0x5A);
                assert_eq!(core.next_state(&inputs(true, enable, control, 0xFF)), 0);
            }
        }
    }

    #[test]
    fn disabled_module_holds_value() {
        let mut core = core_at(9);
        core.clock_edge(&inputs(false, false, ControlWord::IDLE, 0));
        core.clock_edge(&inputs(false, false, ControlWord::LOAD, 0xA5));
        assert_eq!(core.register(), 9);
    }

    #[test]
    fn load_while_driving_samples_external_input() {
        let mut core = core_at(3);
        core.clock_edge(&inputs(false, true, ControlWord::new(true, true), 0x11));
        assert_eq!(core.register(), 0x11);
    }

    #[test]
    fn next_state_does_not_mutate() {
        let core = core_at(7);
        let _ = core.next_state(&inputs(false, true, ControlWord::IDLE, 0));
        assert_eq!(core.register(), 7);
    }

    #[test]
    fn drive_enable_mirrors_output_enable() {
        let core = core_at(0xA5);
        let on = core.outputs(ControlWord::DRIVE);
        assert!(on.drive_enable);
        assert_eq!(on.bus_out, BusOut::driven(0xA5));

        let off = core.outputs(ControlWord::LOAD);
        assert!(!off.drive_enable);
        assert_eq!(off.bus_out, BusOut::HIGH_Z);
        assert!(!off.bus_out.is_driven());
    }

    #[test]
    fn bus_out_display() {
        assert_eq!(BusOut::driven(0xA5).to_string(), "0xA5");
        assert_eq!(BusOut::driven(7).to_string(), "0x07");
        assert_eq!(BusOut::HIGH_Z.to_string(), "Z");
    }

    #[test]
    fn released_bus_is_not_last_value() {
        let core = core_at(0x42);
        assert_eq!(core.outputs(ControlWord::IDLE).bus_out.value(), None);
    }
}
