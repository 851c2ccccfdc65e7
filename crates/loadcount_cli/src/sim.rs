//! `loadcount sim`: free-run the counter after reset.
//!
//! Resets the block with the project's bench settings, drives the bus and
//! lets the clock run for the requested time, optionally recording a VCD.

use std::path::PathBuf;

use loadcount_config::BenchSettings;
use loadcount_sim::time::parse_duration;
use loadcount_sim::{build_kernel, BusOut, ControlWord, SimConfig, SimError, SimResult};
use loadcount_tb::{reset_phase, Testbench};
use tracing::{info, warn};

use crate::project::{load_project, Project};
use crate::{GlobalArgs, SimArgs};

/// What a free run ended with.
#[derive(Debug)]
struct SimOutcome {
    result: SimResult,
    register: u8,
    bus: BusOut,
    waveform: Option<PathBuf>,
}

/// Runs the `loadcount sim` command.
pub fn run(args: &SimArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let duration_fs = parse_duration(&args.time)?;

    if !global.quiet {
        eprintln!(
            "   Simulating {} for {}",
            project.config.project.name, args.time
        );
    }

    let outcome = simulate(&project, args, duration_fs)?;

    if !global.quiet {
        eprintln!(
            "   Finished at {} after {} rising edge(s)",
            outcome.result.final_time, outcome.result.rising_edges
        );
        eprintln!(
            "   count = 0x{:02X}, uio_out = {}",
            outcome.register, outcome.bus
        );
        if let Some(path) = &outcome.waveform {
            eprintln!("   Waveform: {}", path.display());
        }
    }

    Ok(0)
}

fn simulate(
    project: &Project,
    args: &SimArgs,
    duration_fs: u64,
) -> Result<SimOutcome, Box<dyn std::error::Error>> {
    let settings = project.config.bench_settings()?;
    // An explicit output path asks for a waveform even if the config disables it.
    let waveform = match &args.output {
        _ if args.no_waveform => None,
        Some(path) => {
            if !settings.record_waveform {
                warn!(path = %path, "waveform disabled in config, recording anyway");
            }
            Some(PathBuf::from(path))
        }
        None if settings.record_waveform => Some(project.out_dir().join(format!(
            "loadcount.{}",
            project.config.test.waveform_format.extension()
        ))),
        None => None,
    };

    let config = SimConfig {
        clock_period_fs: settings.clock_period_fs,
        time_limit: Some(time_budget(&settings, duration_fs)?),
        record_waveform: waveform.is_some(),
        waveform_path: waveform.clone(),
    };
    let kernel = build_kernel(&config)?;
    let mut tb = Testbench::from_kernel(kernel, settings.settle_fs);

    reset_phase(&mut tb, &settings)?;
    tb.set_ui_in(ControlWord::DRIVE);
    tb.timer(duration_fs)?;

    let register = tb.register();
    let bus = tb.uio_out();
    let result = tb.finish()?;
    info!(count = register, time = %result.final_time, "free run finished");

    Ok(SimOutcome {
        result,
        register,
        bus,
        waveform,
    })
}

/// Absolute end time of a free run: the reset sequence (reset edges, the
/// release edge and one settle) followed by `duration_fs`.
fn time_budget(settings: &BenchSettings, duration_fs: u64) -> Result<u64, SimError> {
    u64::from(settings.reset_cycles)
        .checked_add(1)
        .and_then(|edges| edges.checked_mul(settings.clock_period_fs))
        .and_then(|t| t.checked_add(settings.settle_fs))
        .and_then(|t| t.checked_add(duration_fs))
        .ok_or(SimError::TimeOverflow { after_fs: 0 })
}
