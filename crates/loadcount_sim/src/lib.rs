//! Cycle-accurate behavioral model of the loadcount counter block.
//!
//! The block is an 8-bit counter with a synchronous parallel load and an
//! output enable that tri-states a shared bidirectional bus. This crate holds
//! the model and the small simulation kernel that clocks it.
//!
//! # Architecture
//!
//! [`CounterCore`] is the pure next-state and output logic. [`SimKernel`]
//! wraps it with a free-running [`Clock`], the port values, non-blocking
//! register updates at delta cycles and optional waveform recording.
//!
//! # Usage
//!
//! ```ignore
//! use loadcount_sim::{build_kernel, ControlWord, SimConfig};
//!
//! let mut kernel = build_kernel(&SimConfig::default())?;
//! kernel.set_ena(true);
//! kernel.set_rst_n(true);
//! kernel.set_ui_in(ControlWord::DRIVE);
//! kernel.advance_by(100 * loadcount_sim::time::FS_PER_US)?;
//! let result = kernel.finish()?;
//! println!("Simulation ended at {}", result.final_time);
//! ```
//!
//! # Modules
//!
//! - `clock`: Free-running clock and edge computation
//! - `counter`: Counter/load/tri-state next-state and output logic
//! - `error`: Simulation error types
//! - `kernel`: Edge scheduling, settling and waveform dumping
//! - `ports`: Port-level signal contract
//! - `time`: Femtosecond-precision time with delta cycles
//! - `value`: Bus driver resolution
//! - `waveform`: Waveform recording (VCD format)

#![warn(missing_docs)]

pub mod clock;
pub mod counter;
pub mod error;
pub mod kernel;
pub mod ports;
pub mod time;
pub mod value;
pub mod waveform;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

pub use crate::counter::{increment, BusOut, CoreInputs, CoreOutputs, CounterCore};
pub use clock::{Clock, ClockEdge, EdgeKind};
pub use error::SimError;
pub use kernel::{SimKernel, SimResult};
pub use ports::{ControlWord, PortInputs, PortOutputs, PortSignal};
pub use time::SimTime;
pub use value::{resolve_drivers, DriveStrength, Driver, Resolution, SimSignalId};
pub use waveform::{VcdRecorder, WaveformRecorder};

/// Default clock period: 10 us (100 kHz).
pub const DEFAULT_CLOCK_PERIOD_FS: u64 = 10 * time::FS_PER_US;

/// Configuration for building a simulation kernel.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Clock period in femtoseconds.
    pub clock_period_fs: u64,
    /// Optional absolute time limit in femtoseconds.
    pub time_limit: Option<u64>,
    /// Optional path for VCD output.
    pub waveform_path: Option<PathBuf>,
    /// Whether to record waveform data. Ignored if `waveform_path` is `None`.
    pub record_waveform: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock_period_fs: DEFAULT_CLOCK_PERIOD_FS,
            time_limit: None,
            waveform_path: None,
            record_waveform: false,
        }
    }
}

/// Creates a kernel from `config`, attaching a VCD file recorder when
/// waveform recording is enabled. Parent directories of the waveform path
/// are created as needed.
pub fn build_kernel(config: &SimConfig) -> Result<SimKernel, SimError> {
    let mut kernel = SimKernel::new(Clock::new(config.clock_period_fs)?);

    if let Some(limit) = config.time_limit {
        kernel.set_time_limit(limit);
    }

    if config.record_waveform {
        if let Some(path) = &config.waveform_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let writer = BufWriter::new(File::create(path)?);
            kernel.set_recorder(Box::new(VcdRecorder::new(writer)))?;
        }
    }

    Ok(kernel)
}
