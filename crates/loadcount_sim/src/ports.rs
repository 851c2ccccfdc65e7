//! The synchronous signal interface of the counter block.
//!
//! | Signal | Width | Direction |
//! |---|---|---|
//! | `clk` | 1 | in |
//! | `rst_n` | 1 | in (active low) |
//! | `ena` | 1 | in |
//! | `ui_in` | 8 | in (`[0]` = load, `[1]` = output enable) |
//! | `uio_in` | 8 | in |
//! | `uio_out` | 8 | out |
//! | `uio_oe` | 8 | out |

use std::fmt;

use loadcount_common::LogicVec;
use serde::{Deserialize, Serialize};

use crate::counter::{BusOut, CoreInputs, CoreOutputs};
use crate::value::SimSignalId;

/// The dedicated input byte `ui_in`, decoded as a control word.
///
/// Only bits 0 (`load`) and 1 (`output_enable`) are meaningful; the rest
/// are carried through unchanged and ignored by the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlWord(u8);

impl ControlWord {
    /// Bit position of the synchronous load strobe.
    pub const LOAD_BIT: u8 = 0;
    /// Bit position of the bus output enable.
    pub const OUTPUT_ENABLE_BIT: u8 = 1;

    /// All control bits deasserted.
    pub const IDLE: ControlWord = ControlWord(0b00);
    /// `load=1`, `output_enable=0`.
    pub const LOAD: ControlWord = ControlWord(0b01);
    /// `load=0`, `output_enable=1`.
    pub const DRIVE: ControlWord = ControlWord(0b10);

    /// Wraps a raw `ui_in` byte.
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Builds a control word from the two meaningful bits, reserved bits zero.
    pub fn new(load: bool, output_enable: bool) -> Self {
        Self((u8::from(load) << Self::LOAD_BIT) | (u8::from(output_enable) << Self::OUTPUT_ENABLE_BIT))
    }

    /// Returns the raw `ui_in` byte.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// The synchronous load strobe.
    pub fn load(self) -> bool {
        (self.0 >> Self::LOAD_BIT) & 1 != 0
    }

    /// The bus output enable.
    pub fn output_enable(self) -> bool {
        (self.0 >> Self::OUTPUT_ENABLE_BIT) & 1 != 0
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010b} (load={}, oe={})",
            self.0,
            u8::from(self.load()),
            u8::from(self.output_enable())
        )
    }
}

/// Values currently applied to the block's input ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInputs {
    /// Active-low reset.
    pub rst_n: bool,
    /// Module-active gate.
    pub ena: bool,
    /// Control word on `ui_in`.
    pub ui_in: ControlWord,
    /// External value on `uio_in`.
    pub uio_in: u8,
}

impl Default for PortInputs {
    /// Power-up stimulus: reset held, module disabled, everything else low.
    fn default() -> Self {
        Self {
            rst_n: false,
            ena: false,
            ui_in: ControlWord::IDLE,
            uio_in: 0,
        }
    }
}

impl PortInputs {
    /// Decodes the port values into the core's logical inputs.
    pub fn core_inputs(&self) -> CoreInputs {
        CoreInputs {
            reset: !self.rst_n,
            enable: self.ena,
            control: self.ui_in,
            bus_in: self.uio_in,
        }
    }
}

/// Values currently presented on the block's output ports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOutputs {
    /// `uio_out`: the register when driven, high-impedance otherwise.
    pub uio_out: BusOut,
    /// `uio_oe`: per-bit drive enable, `0xFF` or `0x00`.
    pub uio_oe: u8,
}

impl From<CoreOutputs> for PortOutputs {
    fn from(out: CoreOutputs) -> Self {
        Self {
            uio_out: out.bus_out,
            uio_oe: if out.drive_enable { 0xFF } else { 0x00 },
        }
    }
}

/// Every signal the kernel exposes to waveform recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortSignal {
    /// Clock.
    Clk,
    /// Active-low reset.
    RstN,
    /// Module enable.
    Ena,
    /// Dedicated inputs (control word).
    UiIn,
    /// Bidirectional inputs.
    UioIn,
    /// Bidirectional outputs.
    UioOut,
    /// Bidirectional output enables.
    UioOe,
    /// The internal counter register.
    Count,
}

impl PortSignal {
    /// All signals, in waveform declaration order.
    pub const ALL: [PortSignal; 8] = [
        PortSignal::Clk,
        PortSignal::RstN,
        PortSignal::Ena,
        PortSignal::UiIn,
        PortSignal::UioIn,
        PortSignal::UioOut,
        PortSignal::UioOe,
        PortSignal::Count,
    ];

    /// The signal's name as it appears in waveforms.
    pub fn name(self) -> &'static str {
        match self {
            PortSignal::Clk => "clk",
            PortSignal::RstN => "rst_n",
            PortSignal::Ena => "ena",
            PortSignal::UiIn => "ui_in",
            PortSignal::UioIn => "uio_in",
            PortSignal::UioOut => "uio_out",
            PortSignal::UioOe => "uio_oe",
            PortSignal::Count => "count",
        }
    }

    /// The signal's bit width.
    pub fn width(self) -> u32 {
        match self {
            PortSignal::Clk | PortSignal::RstN | PortSignal::Ena => 1,
            _ => 8,
        }
    }

    /// The waveform ID of this signal.
    pub fn id(self) -> SimSignalId {
        SimSignalId::from_raw(self as u32)
    }
}

impl BusOut {
    /// The 4-state value on the `uio_out` port.
    pub fn to_logic_vec(self) -> LogicVec {
        match self.value() {
            Some(v) => LogicVec::from_u64(u64::from(v), 8),
            None => LogicVec::all_z(8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_word_bits() {
        assert!(!ControlWord::IDLE.load());
        assert!(!ControlWord::IDLE.output_enable());
        assert!(ControlWord::LOAD.load());
        assert!(!ControlWord::LOAD.output_enable());
        assert!(!ControlWord::DRIVE.load());
        assert!(ControlWord::DRIVE.output_enable());
        assert_eq!(ControlWord::new(true, true).raw(), 0b11);
    }

    #[test]
    fn reserved_bits_are_ignored() {
        let cw = ControlWord::from_raw(0b1111_1100);
        assert!(!cw.load());
        assert!(!cw.output_enable());
        assert_eq!(cw.raw(), 0b1111_1100);
    }

    #[test]
    fn control_word_display() {
        assert_eq!(
            ControlWord::DRIVE.to_string(),
            "0b00000010 (load=0, oe=1)"
        );
    }

    #[test]
    fn core_inputs_decode_active_low_reset() {
        let inputs = PortInputs {
            rst_n: false,
            ena: true,
            ui_in: ControlWord::LOAD,
            uio_in: 0xA5,
        };
        let core = inputs.core_inputs();
        assert!(core.reset);
        assert!(core.enable);
        assert!(core.control.load());
        assert_eq!(core.bus_in, 0xA5);
    }

    #[test]
    fn outputs_mirror_drive_enable_on_all_bits() {
        let driving = PortOutputs::from(CoreOutputs {
            drive_enable: true,
            bus_out: BusOut::driven(7),
        });
        assert_eq!(driving.uio_oe, 0xFF);
        let released = PortOutputs::from(CoreOutputs {
            drive_enable: false,
            bus_out: BusOut::HIGH_Z,
        });
        assert_eq!(released.uio_oe, 0x00);
    }

    #[test]
    fn bus_out_logic_vec() {
        assert_eq!(BusOut::driven(0xA5).to_logic_vec().to_u64(), Some(0xA5));
        assert!(BusOut::HIGH_Z.to_logic_vec().is_all_z());
    }

    #[test]
    fn signal_ids_are_distinct() {
        let mut ids: Vec<u32> = PortSignal::ALL.iter().map(|s| s.id().as_raw()).collect();
        ids.dedup();
        assert_eq!(ids.len(), PortSignal::ALL.len());
        assert_eq!(PortSignal::Clk.width(), 1);
        assert_eq!(PortSignal::UioOut.width(), 8);
        assert_eq!(PortSignal::UioOe.name(), "uio_oe");
    }
}
