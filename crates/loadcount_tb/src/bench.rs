//! Drive / wait / sample wrapper around the simulation kernel.
//!
//! [`Testbench`] gives scenarios the small vocabulary a coroutine testbench
//! uses against a simulator: drive a port, wait for clock edges or a timer,
//! then sample. Waiting on an edge returns *at* the edge, before the
//! register update lands; [`Testbench::settle`] moves past it.

use std::path::Path;

use loadcount_config::BenchSettings;
use loadcount_sim::{
    build_kernel, BusOut, ControlWord, Resolution, SimConfig, SimError, SimKernel, SimResult,
    SimTime,
};
use tracing::trace;

use crate::check::{check_eq, check_that, hex, CheckError};

/// A running testbench around one [`SimKernel`].
pub struct Testbench {
    kernel: SimKernel,
    settle_fs: u64,
}

impl Testbench {
    /// Creates a testbench without waveform output.
    pub fn new(settings: &BenchSettings) -> Result<Self, SimError> {
        Self::build(settings, None)
    }

    /// Creates a testbench that writes a VCD waveform to `path`.
    pub fn with_waveform(settings: &BenchSettings, path: &Path) -> Result<Self, SimError> {
        Self::build(settings, Some(path))
    }

    fn build(settings: &BenchSettings, waveform: Option<&Path>) -> Result<Self, SimError> {
        let config = SimConfig {
            clock_period_fs: settings.clock_period_fs,
            time_limit: None,
            waveform_path: waveform.map(Path::to_path_buf),
            record_waveform: waveform.is_some(),
        };
        Ok(Self::from_kernel(build_kernel(&config)?, settings.settle_fs))
    }

    /// Wraps an existing kernel.
    pub fn from_kernel(kernel: SimKernel, settle_fs: u64) -> Self {
        Self { kernel, settle_fs }
    }

    /// The underlying kernel.
    pub fn kernel(&self) -> &SimKernel {
        &self.kernel
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.kernel.current_time()
    }

    // ---- drive ----

    /// Drives `rst_n`.
    pub fn set_rst_n(&mut self, rst_n: bool) {
        self.kernel.set_rst_n(rst_n);
    }

    /// Drives `ena`.
    pub fn set_ena(&mut self, ena: bool) {
        self.kernel.set_ena(ena);
    }

    /// Drives `ui_in`.
    pub fn set_ui_in(&mut self, control: ControlWord) {
        self.kernel.set_ui_in(control);
    }

    /// Drives `uio_in`.
    pub fn set_uio_in(&mut self, value: u8) {
        self.kernel.set_uio_in(value);
    }

    // ---- wait ----

    /// Waits for the next rising edge and returns at it.
    pub fn rising_edge(&mut self) -> Result<SimTime, SimError> {
        let t = self.kernel.wait_rising_edge()?;
        trace!(time = %t, "resumed at rising edge");
        Ok(t)
    }

    /// Waits for `n` rising edges, returning at the last one.
    pub fn clock_cycles(&mut self, n: u32) -> Result<SimTime, SimError> {
        let mut t = self.now();
        for _ in 0..n {
            t = self.rising_edge()?;
        }
        Ok(t)
    }

    /// Waits for a fixed delay.
    pub fn timer(&mut self, duration_fs: u64) -> Result<(), SimError> {
        self.kernel.advance_by(duration_fs)
    }

    /// Waits the settling delay.
    pub fn settle(&mut self) -> Result<(), SimError> {
        self.timer(self.settle_fs)
    }

    /// One rising edge followed by the settling delay.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.rising_edge()?;
        self.settle()
    }

    // ---- sample ----

    /// The value on `uio_out`.
    pub fn uio_out(&self) -> BusOut {
        self.kernel.outputs().uio_out
    }

    /// The value on `uio_oe`.
    pub fn uio_oe(&self) -> u8 {
        self.kernel.outputs().uio_oe
    }

    /// The resolved value on the shared `uio` pads.
    pub fn bus_pad(&self) -> Resolution {
        self.kernel.bus_pad()
    }

    /// White-box read of the counter register.
    pub fn register(&self) -> u8 {
        self.kernel.register()
    }

    // ---- check ----

    /// Samples `uio_out`, failing the check if the core is not driving.
    pub fn sample_driven(&self, check: &str) -> Result<u8, CheckError> {
        let out = self.uio_out();
        match out.value() {
            Some(v) => Ok(v),
            None => Err(CheckError::Mismatch {
                check: check.to_string(),
                time: self.now(),
                expected: "driven bus".to_string(),
                observed: out.to_string(),
            }),
        }
    }

    /// Checks the value on `uio_oe`.
    pub fn expect_uio_oe(&self, check: &str, expected: u8) -> Result<(), CheckError> {
        check_eq(check, self.now(), hex(expected), hex(self.uio_oe()))
    }

    /// Checks the value on `uio_out`.
    pub fn expect_uio_out(&self, check: &str, expected: BusOut) -> Result<(), CheckError> {
        check_eq(check, self.now(), expected, self.uio_out())
    }

    /// Checks that the shared pads resolve to `expected` without contention.
    pub fn expect_bus_pad(&self, check: &str, expected: u8) -> Result<(), CheckError> {
        let pad = self.bus_pad();
        check_that(
            check,
            self.now(),
            !pad.is_conflict() && pad.value.to_u64() == Some(u64::from(expected)),
            format!("{} without contention", hex(expected)),
            pad.value.to_string(),
        )
    }

    /// Settles, finalizes the waveform and returns the run summary.
    pub fn finish(mut self) -> Result<SimResult, SimError> {
        self.kernel.finish()
    }
}
