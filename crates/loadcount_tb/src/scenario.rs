//! Reference scenarios and the phases they are built from.
//!
//! Each phase drives the block through one behavior and checks it cycle by
//! cycle. [`Scenario::Reference`] runs them all in sequence, the way the
//! block's original sign-off test does; the other scenarios run reset plus a
//! single phase.

use std::path::Path;
use std::time::{Duration, Instant};

use loadcount_config::BenchSettings;
use loadcount_sim::{increment, BusOut, ControlWord, SimTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::bench::Testbench;
use crate::check::{check_eq, hex, CheckError};

/// Reset phase: enable the module, zero every input, hold reset for the
/// configured number of edges, release it and let one more edge pass.
pub fn reset_phase(tb: &mut Testbench, settings: &BenchSettings) -> Result<(), CheckError> {
    debug!(cycles = settings.reset_cycles, "reset");
    tb.set_ena(true);
    tb.set_ui_in(ControlWord::IDLE);
    tb.set_uio_in(0);
    tb.set_rst_n(false);
    tb.clock_cycles(settings.reset_cycles)?;
    tb.set_rst_n(true);
    tb.step()?;
    Ok(())
}

/// Increment phase: with the bus driven, two samples one edge apart must
/// differ by exactly one (mod 256). Returns both samples.
pub fn increment_phase(tb: &mut Testbench) -> Result<(u8, u8), CheckError> {
    tb.set_ui_in(ControlWord::DRIVE);
    tb.step()?;
    let a = tb.sample_driven("increment: first sample")?;
    tb.step()?;
    let b = tb.sample_driven("increment: second sample")?;
    info!("Counter step while oe=1: {a:02X} -> {b:02X}");
    check_eq("increment", tb.now(), hex(increment(a)), hex(b))?;
    Ok((a, b))
}

/// What the load phase observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    /// Bus value right after re-enabling the drive, before any edge.
    pub loaded: u8,
    /// Bus value once the post-load increment showed up.
    pub incremented: u8,
    /// Edges waited for the increment.
    pub poll_edges_used: u32,
}

/// Load phase: release the bus, load `load_value` on exactly one edge,
/// re-enable the drive and check the loaded value is visible before the next
/// edge. Then poll up to `poll_edges` edges for the increment.
pub fn load_phase(tb: &mut Testbench, settings: &BenchSettings) -> Result<LoadOutcome, CheckError> {
    let value = settings.load_value;
    let expected_next = increment(value);

    tb.set_ui_in(ControlWord::IDLE);
    tb.step()?;

    tb.set_uio_in(value);
    tb.set_ui_in(ControlWord::LOAD);
    tb.step()?;

    tb.set_ui_in(ControlWord::IDLE);
    tb.set_ui_in(ControlWord::DRIVE);
    tb.settle()?;
    let loaded = tb.sample_driven("load: drive after load")?;
    info!("Loaded value observed: {loaded:02X}");
    check_eq("load: value before next edge", tb.now(), hex(value), hex(loaded))?;

    let mut observed = loaded;
    let mut used = 0;
    while used < settings.poll_edges && observed != expected_next {
        tb.step()?;
        observed = tb.sample_driven("load: increment poll")?;
        used += 1;
    }
    info!("After load, observed: {observed:02X} (expected {expected_next:02X})");
    check_eq("load: increment after load", tb.now(), hex(expected_next), hex(observed))?;

    Ok(LoadOutcome {
        loaded,
        incremented: observed,
        poll_edges_used: used,
    })
}

/// Tri-state phase: drop the drive, check the core has released the bus,
/// then drive `release_value` from outside and check it wins without
/// contention and never reaches the register.
pub fn tristate_phase(tb: &mut Testbench, settings: &BenchSettings) -> Result<(), CheckError> {
    tb.set_ui_in(ControlWord::IDLE);
    tb.step()?;
    tb.expect_uio_oe("tristate: drive enable released", 0x00)?;
    tb.expect_uio_out("tristate: bus high-impedance", BusOut::HIGH_Z)?;

    let before = tb.register();
    tb.set_uio_in(settings.release_value);
    tb.expect_bus_pad("tristate: external value on pads", settings.release_value)?;
    tb.step()?;
    tb.expect_bus_pad("tristate: external value after edge", settings.release_value)?;
    check_eq(
        "tristate: register unaffected by bus",
        tb.now(),
        hex(increment(before)),
        hex(tb.register()),
    )?;
    Ok(())
}

/// A runnable scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Reset, increment, load and tri-state in one run.
    Reference,
    /// Reset, then the increment phase.
    Increment,
    /// Reset, then the load phase.
    Load,
    /// Reset, then the tri-state phase.
    Tristate,
}

impl Scenario {
    /// Every scenario, in run order.
    pub const ALL: [Scenario; 4] = [
        Scenario::Reference,
        Scenario::Increment,
        Scenario::Load,
        Scenario::Tristate,
    ];

    /// The scenario's name.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Reference => "reference",
            Scenario::Increment => "increment",
            Scenario::Load => "load",
            Scenario::Tristate => "tristate",
        }
    }

    /// Looks a scenario up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Runs the scenario's phases on `tb`.
    pub fn run(self, tb: &mut Testbench, settings: &BenchSettings) -> Result<(), CheckError> {
        match self {
            Scenario::Reference => {
                info!("Start");
                reset_phase(tb, settings)?;
                increment_phase(tb)?;
                load_phase(tb, settings)?;
                tristate_phase(tb, settings)?;
                info!("Test completed");
            }
            Scenario::Increment => {
                reset_phase(tb, settings)?;
                increment_phase(tb)?;
            }
            Scenario::Load => {
                reset_phase(tb, settings)?;
                load_phase(tb, settings)?;
            }
            Scenario::Tristate => {
                reset_phase(tb, settings)?;
                tristate_phase(tb, settings)?;
            }
        }
        Ok(())
    }
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario name.
    pub name: String,
    /// Whether every check passed.
    pub passed: bool,
    /// Simulation time when the scenario stopped.
    pub final_time: SimTime,
    /// Rising edges simulated.
    pub rising_edges: u64,
    /// Wall-clock run time.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    /// The failure, if any.
    pub error: Option<String>,
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1e3)
    }
}

/// Runs `scenario` on a fresh testbench, optionally writing a VCD to
/// `waveform`. Never fails: setup and check errors land in the result.
pub fn run_scenario(
    scenario: Scenario,
    settings: &BenchSettings,
    waveform: Option<&Path>,
) -> ScenarioResult {
    let start = Instant::now();
    let built = match waveform {
        Some(path) => Testbench::with_waveform(settings, path),
        None => Testbench::new(settings),
    };
    let mut tb = match built {
        Ok(tb) => tb,
        Err(e) => {
            return ScenarioResult {
                name: scenario.name().to_string(),
                passed: false,
                final_time: SimTime::zero(),
                rising_edges: 0,
                elapsed: start.elapsed(),
                error: Some(e.to_string()),
            }
        }
    };

    let outcome = scenario.run(&mut tb, settings);
    let stopped_at = tb.now();
    let edges = tb.kernel().rising_edges();
    let finished = tb.finish();

    let error = match (outcome, finished) {
        (Err(e), _) => Some(e.to_string()),
        (Ok(()), Err(e)) => Some(e.to_string()),
        (Ok(()), Ok(_)) => None,
    };
    if let Some(e) = &error {
        info!(scenario = scenario.name(), "failed: {e}");
    }

    ScenarioResult {
        name: scenario.name().to_string(),
        passed: error.is_none(),
        final_time: stopped_at,
        rising_edges: edges,
        elapsed: start.elapsed(),
        error,
    }
}
