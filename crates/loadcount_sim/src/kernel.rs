//! Simulation kernel: clock scheduling, non-blocking register updates and
//! combinational output re-evaluation.
//!
//! [`SimKernel`] owns the counter core, the clock, the current port values
//! and an optional waveform recorder. Time only moves forward through
//! [`advance_to_next_edge`](SimKernel::advance_to_next_edge),
//! [`wait_rising_edge`](SimKernel::wait_rising_edge) and
//! [`advance_by`](SimKernel::advance_by).
//!
//! Scheduling follows the usual HDL event model:
//!
//! - At a rising edge the core samples its inputs and its next value is queued
//!   as a non-blocking update. A reader that resumes exactly at the edge sees
//!   the old register value.
//! - The queued update lands one delta cycle later, on [`settle`](SimKernel::settle)
//!   or on any further time advance.
//! - Driving an input re-evaluates the combinational outputs in a new delta
//!   cycle at the current time, with no clock edge involved.

use loadcount_common::LogicVec;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clock::{Clock, ClockEdge, EdgeKind};
use crate::counter::CounterCore;
use crate::error::SimError;
use crate::ports::{ControlWord, PortInputs, PortOutputs, PortSignal};
use crate::time::SimTime;
use crate::value::{resolve_drivers, Driver, Resolution};
use crate::waveform::WaveformRecorder;

/// Name of the waveform scope holding every recorded signal.
pub const WAVEFORM_SCOPE: &str = "loadcount";

/// Summary of a completed simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimResult {
    /// The simulation time when the run ended.
    pub final_time: SimTime,
    /// Number of rising clock edges simulated.
    pub rising_edges: u64,
    /// Total delta cycles executed.
    pub total_deltas: u64,
}

/// The simulation kernel for the counter block.
pub struct SimKernel {
    current_time: SimTime,
    clock: Clock,
    core: CounterCore,
    inputs: PortInputs,
    outputs: PortOutputs,
    /// Register value queued by the last rising edge, not yet applied.
    pending: Option<u8>,
    recorder: Option<Box<dyn WaveformRecorder>>,
    time_limit: Option<u64>,
    rising_edges: u64,
    total_deltas: u64,
}

impl SimKernel {
    /// Creates a kernel at time zero with the core in its power-up state and
    /// the default (reset-held) port inputs.
    pub fn new(clock: Clock) -> Self {
        let core = CounterCore::new();
        let inputs = PortInputs::default();
        let outputs = PortOutputs::from(core.outputs(inputs.ui_in));
        Self {
            current_time: SimTime::zero(),
            clock,
            core,
            inputs,
            outputs,
            pending: None,
            recorder: None,
            time_limit: None,
            rising_edges: 0,
            total_deltas: 0,
        }
    }

    /// Sets an absolute time limit; advancing past it is an error.
    pub fn set_time_limit(&mut self, limit_fs: u64) {
        self.time_limit = Some(limit_fs);
    }

    /// Attaches a waveform recorder, declares every port signal in the
    /// `loadcount` scope and dumps their current values.
    pub fn set_recorder(&mut self, mut recorder: Box<dyn WaveformRecorder>) -> Result<(), SimError> {
        recorder.begin_scope(WAVEFORM_SCOPE)?;
        for signal in PortSignal::ALL {
            recorder.register_signal(signal.id(), signal.name(), signal.width())?;
        }
        recorder.end_scope()?;
        self.recorder = Some(recorder);
        self.flush_waveform()
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// Returns the values currently applied to the input ports.
    pub fn inputs(&self) -> PortInputs {
        self.inputs
    }

    /// Returns the values currently on the output ports.
    pub fn outputs(&self) -> PortOutputs {
        self.outputs
    }

    /// White-box read of the counter register.
    pub fn register(&self) -> u8 {
        self.core.register()
    }

    /// The register update queued by the last rising edge, if not yet applied.
    pub fn pending_update(&self) -> Option<u8> {
        self.pending
    }

    /// Number of rising edges simulated so far.
    pub fn rising_edges(&self) -> u64 {
        self.rising_edges
    }

    /// Drives `rst_n`.
    pub fn set_rst_n(&mut self, rst_n: bool) {
        self.drive(|inputs| inputs.rst_n = rst_n);
    }

    /// Drives `ena`.
    pub fn set_ena(&mut self, ena: bool) {
        self.drive(|inputs| inputs.ena = ena);
    }

    /// Drives `ui_in`.
    pub fn set_ui_in(&mut self, control: ControlWord) {
        self.drive(|inputs| inputs.ui_in = control);
    }

    /// Drives `uio_in`.
    pub fn set_uio_in(&mut self, value: u8) {
        self.drive(|inputs| inputs.uio_in = value);
    }

    /// Applies an input change and re-evaluates outputs in a new delta cycle.
    fn drive(&mut self, apply: impl FnOnce(&mut PortInputs)) {
        let before = self.inputs;
        apply(&mut self.inputs);
        if self.inputs == before {
            return;
        }
        self.current_time = self.current_time.next_delta();
        self.total_deltas += 1;
        self.evaluate_outputs();
        trace!(time = %self.current_time, ui_in = %self.inputs.ui_in, "inputs changed");
    }

    fn evaluate_outputs(&mut self) {
        self.outputs = PortOutputs::from(self.core.outputs(self.inputs.ui_in));
    }

    /// Applies the queued register update, if any, one delta cycle later.
    pub fn settle(&mut self) {
        if let Some(next) = self.pending.take() {
            self.current_time = self.current_time.next_delta();
            self.total_deltas += 1;
            self.core.commit(next);
            self.evaluate_outputs();
            debug!(time = %self.current_time, count = next, "register updated");
        }
    }

    fn check_limit(&self, time_fs: u64) -> Result<(), SimError> {
        match self.time_limit {
            Some(limit) if time_fs > limit => Err(SimError::TimeLimitExceeded { limit_fs: limit }),
            _ => Ok(()),
        }
    }

    /// Settles, then moves time to the next clock edge and processes it.
    pub fn advance_to_next_edge(&mut self) -> Result<ClockEdge, SimError> {
        self.settle();
        let edge = self.clock.next_edge_after(self.current_time.fs)?;
        self.check_limit(edge.time_fs)?;
        self.flush_waveform()?;
        self.current_time = self.current_time.advance_to(edge.time_fs);

        if edge.kind == EdgeKind::Rising {
            let next = self.core.next_state(&self.inputs.core_inputs());
            self.pending = Some(next);
            self.rising_edges += 1;
            debug!(
                time = %self.current_time,
                count = self.core.register(),
                next,
                "rising edge"
            );
        } else {
            trace!(time = %self.current_time, "falling edge");
        }
        Ok(edge)
    }

    /// Advances to the next rising edge and returns its time.
    ///
    /// The register update sampled at that edge is still pending on return.
    pub fn wait_rising_edge(&mut self) -> Result<SimTime, SimError> {
        loop {
            if self.advance_to_next_edge()?.kind == EdgeKind::Rising {
                return Ok(self.current_time);
            }
        }
    }

    /// Advances time by `duration_fs`, processing every clock edge up to and
    /// including the target time, then settles.
    pub fn advance_by(&mut self, duration_fs: u64) -> Result<(), SimError> {
        let target = self.current_time.fs.checked_add(duration_fs).ok_or(
            SimError::TimeOverflow {
                after_fs: self.current_time.fs,
            },
        )?;
        self.check_limit(target)?;
        // An edge past u64::MAX is also past the target.
        while matches!(
            self.clock.next_edge_after(self.current_time.fs),
            Ok(edge) if edge.time_fs <= target
        ) {
            self.advance_to_next_edge()?;
        }
        self.settle();
        if target > self.current_time.fs {
            self.flush_waveform()?;
            self.current_time = self.current_time.advance_to(target);
        }
        Ok(())
    }

    /// The value seen on the shared `uio` pads, resolving the core's drive
    /// against the external value on `uio_in`.
    pub fn bus_pad(&self) -> Resolution {
        let core = match self.outputs.uio_out.value() {
            Some(v) => Driver::strong(u64::from(v), 8),
            None => Driver::released(8),
        };
        let external = Driver::strong(u64::from(self.inputs.uio_in), 8);
        resolve_drivers(&[core, external], 8)
    }

    /// The current 4-state value of a port signal.
    pub fn signal_value(&self, signal: PortSignal) -> LogicVec {
        match signal {
            PortSignal::Clk => LogicVec::from_bool(self.clock.level_at(self.current_time.fs)),
            PortSignal::RstN => LogicVec::from_bool(self.inputs.rst_n),
            PortSignal::Ena => LogicVec::from_bool(self.inputs.ena),
            PortSignal::UiIn => LogicVec::from_u64(u64::from(self.inputs.ui_in.raw()), 8),
            PortSignal::UioIn => LogicVec::from_u64(u64::from(self.inputs.uio_in), 8),
            PortSignal::UioOut => self.outputs.uio_out.to_logic_vec(),
            PortSignal::UioOe => LogicVec::from_u64(u64::from(self.outputs.uio_oe), 8),
            PortSignal::Count => LogicVec::from_u64(u64::from(self.core.register()), 8),
        }
    }

    /// Records every signal's value at the current time.
    fn flush_waveform(&mut self) -> Result<(), SimError> {
        if self.recorder.is_none() {
            return Ok(());
        }
        let time_fs = self.current_time.fs;
        let values: Vec<(PortSignal, LogicVec)> = PortSignal::ALL
            .iter()
            .map(|&s| (s, self.signal_value(s)))
            .collect();
        if let Some(rec) = &mut self.recorder {
            for (signal, value) in &values {
                rec.record_change(time_fs, signal.id(), value)?;
            }
        }
        Ok(())
    }

    /// Settles pending updates, writes the final waveform values, finalizes
    /// and detaches the recorder, and returns the run summary.
    pub fn finish(&mut self) -> Result<SimResult, SimError> {
        self.settle();
        self.flush_waveform()?;
        if let Some(mut rec) = self.recorder.take() {
            rec.finalize()?;
        }
        Ok(SimResult {
            final_time: self.current_time,
            rising_edges: self.rising_edges,
            total_deltas: self.total_deltas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::BusOut;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::value::SimSignalId;

    const PERIOD: u64 = 10;

    fn kernel() -> SimKernel {
        SimKernel::new(Clock::new(PERIOD).unwrap())
    }

    /// Kernel out of reset, enabled, driving the bus.
    fn counting_kernel() -> SimKernel {
        let mut k = kernel();
        k.set_ena(true);
        k.set_rst_n(true);
        k.set_ui_in(ControlWord::DRIVE);
        k
    }

    type Changes = Rc<RefCell<Vec<(u64, u32, String)>>>;

    struct CaptureRecorder {
        changes: Changes,
        names: Vec<String>,
        finalized: Rc<RefCell<bool>>,
    }

    impl WaveformRecorder for CaptureRecorder {
        fn register_signal(&mut self, _: SimSignalId, name: &str, _: u32) -> Result<(), SimError> {
            self.names.push(name.to_string());
            Ok(())
        }
        fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
            assert_eq!(name, WAVEFORM_SCOPE);
            Ok(())
        }
        fn end_scope(&mut self) -> Result<(), SimError> {
            assert_eq!(self.names.len(), PortSignal::ALL.len());
            Ok(())
        }
        fn record_change(&mut self, t: u64, id: SimSignalId, v: &LogicVec) -> Result<(), SimError> {
            self.changes.borrow_mut().push((t, id.as_raw(), v.to_string()));
            Ok(())
        }
        fn finalize(&mut self) -> Result<(), SimError> {
            *self.finalized.borrow_mut() = true;
            Ok(())
        }
    }

    #[test]
    fn power_up_state() {
        let k = kernel();
        assert_eq!(k.current_time(), SimTime::zero());
        assert_eq!(k.register(), 0);
        assert_eq!(k.outputs().uio_out, BusOut::HIGH_Z);
        assert_eq!(k.outputs().uio_oe, 0);
        assert!(!k.inputs().rst_n);
    }

    #[test]
    fn output_enable_takes_effect_without_an_edge() {
        let mut k = kernel();
        k.set_ui_in(ControlWord::DRIVE);
        assert_eq!(k.outputs().uio_oe, 0xFF);
        assert_eq!(k.outputs().uio_out, BusOut::driven(0));
        assert_eq!(k.current_time().fs, 0);
        assert_eq!(k.current_time().delta, 1);

        k.set_ui_in(ControlWord::IDLE);
        assert_eq!(k.outputs().uio_oe, 0);
        assert_eq!(k.outputs().uio_out, BusOut::HIGH_Z);
        assert_eq!(k.rising_edges(), 0);
    }

    #[test]
    fn unchanged_input_is_not_a_delta() {
        let mut k = kernel();
        k.set_uio_in(0);
        assert_eq!(k.current_time(), SimTime::zero());
    }

    #[test]
    fn first_rising_edge_is_one_period_in() {
        let mut k = counting_kernel();
        assert_eq!(k.wait_rising_edge().unwrap().fs, PERIOD);
        assert_eq!(k.wait_rising_edge().unwrap().fs, 2 * PERIOD);
    }

    #[test]
    fn read_at_edge_is_stale_until_settled() {
        let mut k = counting_kernel();
        k.wait_rising_edge().unwrap();
        assert_eq!(k.register(), 0);
        assert_eq!(k.outputs().uio_out, BusOut::driven(0));
        assert_eq!(k.pending_update(), Some(1));

        k.settle();
        assert_eq!(k.register(), 1);
        assert_eq!(k.outputs().uio_out, BusOut::driven(1));
        assert_eq!(k.pending_update(), None);
        assert_eq!(k.current_time().fs, PERIOD);
        assert_eq!(k.current_time().delta, 1);
    }

    #[test]
    fn advance_by_processes_edges_and_settles() {
        let mut k = counting_kernel();
        k.advance_by(25).unwrap();
        assert_eq!(k.current_time(), SimTime::from_fs(25));
        assert_eq!(k.register(), 2);
    }

    #[test]
    fn advance_by_includes_edge_at_target() {
        let mut k = counting_kernel();
        k.advance_by(PERIOD).unwrap();
        assert_eq!(k.register(), 1);
        assert_eq!(k.current_time().fs, PERIOD);
    }

    #[test]
    fn timer_after_edge_applies_pending_update() {
        let mut k = counting_kernel();
        k.wait_rising_edge().unwrap();
        k.advance_by(1).unwrap();
        assert_eq!(k.register(), 1);
        assert_eq!(k.current_time(), SimTime::from_fs(PERIOD + 1));
    }

    #[test]
    fn reset_holds_register_at_zero() {
        let mut k = counting_kernel();
        k.advance_by(3 * PERIOD).unwrap();
        assert_eq!(k.register(), 3);
        k.set_rst_n(false);
        k.wait_rising_edge().unwrap();
        k.settle();
        assert_eq!(k.register(), 0);
    }

    #[test]
    fn load_captures_external_bus() {
        let mut k = counting_kernel();
        k.set_ui_in(ControlWord::LOAD);
        k.set_uio_in(0xA5);
        k.wait_rising_edge().unwrap();
        k.settle();
        assert_eq!(k.register(), 0xA5);
    }

    #[test]
    fn time_limit_is_enforced() {
        let mut k = counting_kernel();
        k.set_time_limit(15);
        assert!(matches!(
            k.advance_by(20),
            Err(SimError::TimeLimitExceeded { limit_fs: 15 })
        ));
        k.wait_rising_edge().unwrap();
        assert!(k.wait_rising_edge().is_err());
    }

    #[test]
    fn edges_past_time_range_are_an_error() {
        let period = u64::MAX / 2;
        let mut k = SimKernel::new(Clock::new(period).unwrap());
        k.set_ena(true);
        k.set_rst_n(true);
        assert_eq!(k.wait_rising_edge().unwrap().fs, period);
        assert_eq!(k.wait_rising_edge().unwrap().fs, 2 * period);
        assert!(matches!(
            k.wait_rising_edge(),
            Err(SimError::TimeOverflow { after_fs }) if after_fs == 2 * period
        ));
        assert_eq!(k.rising_edges(), 2);
        assert_eq!(k.current_time().fs, 2 * period);
        assert_eq!(k.register(), 2);
    }

    #[test]
    fn advance_by_stops_at_end_of_time_range() {
        let period = u64::MAX / 2;
        let mut k = SimKernel::new(Clock::new(period).unwrap());
        k.advance_by(2 * period).unwrap();
        assert!(matches!(
            k.advance_by(u64::MAX),
            Err(SimError::TimeOverflow { .. })
        ));
        k.advance_by(1).unwrap();
        assert_eq!(k.current_time().fs, u64::MAX);
        assert_eq!(k.rising_edges(), 2);
    }

    #[test]
    fn bus_pad_resolution() {
        let mut k = counting_kernel();
        k.set_ui_in(ControlWord::IDLE);
        k.set_uio_in(0x3C);
        let pad = k.bus_pad();
        assert_eq!(pad.value.to_u64(), Some(0x3C));
        assert!(!pad.is_conflict());

        k.set_ui_in(ControlWord::DRIVE);
        assert!(k.bus_pad().is_conflict());
    }

    #[test]
    fn clock_signal_follows_edges() {
        let mut k = kernel();
        assert_eq!(k.signal_value(PortSignal::Clk).to_u64(), Some(1));
        let edge = k.advance_to_next_edge().unwrap();
        assert_eq!(edge.kind, EdgeKind::Falling);
        assert_eq!(k.signal_value(PortSignal::Clk).to_u64(), Some(0));
        assert_eq!(k.advance_to_next_edge().unwrap().kind, EdgeKind::Rising);
        assert_eq!(k.signal_value(PortSignal::Clk).to_u64(), Some(1));
    }

    #[test]
    fn recorder_sees_declarations_and_values() {
        let changes: Changes = Rc::default();
        let finalized = Rc::new(RefCell::new(false));
        let mut k = counting_kernel();
        k.set_recorder(Box::new(CaptureRecorder {
            changes: Rc::clone(&changes),
            names: Vec::new(),
            finalized: Rc::clone(&finalized),
        }))
        .unwrap();
        k.advance_by(PERIOD + 1).unwrap();
        let result = k.finish().unwrap();

        assert!(*finalized.borrow());
        assert_eq!(result.rising_edges, 1);
        assert_eq!(result.final_time, SimTime::from_fs(PERIOD + 1));

        let changes = changes.borrow();
        let count_id = PortSignal::Count.id().as_raw();
        assert!(changes
            .iter()
            .any(|(t, id, v)| *t == PERIOD && *id == count_id && v == "00000001"));
    }

    #[test]
    fn sim_result_serializes() {
        let mut k = counting_kernel();
        k.advance_by(2 * PERIOD).unwrap();
        let result = k.finish().unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: SimResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
