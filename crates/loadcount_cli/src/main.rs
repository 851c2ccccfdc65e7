//! loadcount CLI: run the counter block's reference scenarios or free-run
//! the model.
//!
//! Provides `loadcount test` for running the verification scenarios and
//! `loadcount sim` for a free-running simulation with waveform output.

#![warn(missing_docs)]

mod project;
mod sim;

use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// loadcount: behavioral model and testbench for an 8-bit loadable counter.
#[derive(Parser, Debug)]
#[command(name = "loadcount", version, about = "Loadable counter model and testbench")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to a `loadcount.toml` file or the directory holding one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Free-run the model after reset with the bus driven.
    Sim(SimArgs),
    /// Run the verification scenarios.
    Test(TestArgs),
}

/// Arguments for the `loadcount sim` subcommand.
#[derive(Parser, Debug)]
pub struct SimArgs {
    /// Simulated time after reset (e.g., "100us", "2ms").
    #[arg(long, default_value = "100us")]
    pub time: String,

    /// Output path for the waveform file.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable waveform recording.
    #[arg(long)]
    pub no_waveform: bool,
}

/// Arguments for the `loadcount test` subcommand.
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Specific scenario to run (optional).
    pub name: Option<String>,

    /// Substring filter for scenario names.
    #[arg(long)]
    pub filter: Option<String>,

    /// Disable waveform recording for all scenarios.
    #[arg(long)]
    pub no_waveform: bool,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Verbosity level from repeated `-v`.
    pub verbose: u8,
    /// Optional path to a custom config file or directory.
    pub config: Option<String>,
}

/// The default log filter for the given flags.
fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(global.quiet, global.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Sim(ref args) => sim::run(args, &global),
        Command::Test(ref args) => test::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_test_default() {
        let cli = Cli::parse_from(["loadcount", "test"]);
        match cli.command {
            Command::Test(ref args) => {
                assert!(args.name.is_none());
                assert!(args.filter.is_none());
                assert!(!args.no_waveform);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Test command"),
        }
    }

    #[test]
    fn parse_test_with_args() {
        let cli = Cli::parse_from([
            "loadcount",
            "test",
            "load",
            "--filter",
            "lo",
            "--no-waveform",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Test(ref args) => {
                assert_eq!(args.name.as_deref(), Some("load"));
                assert_eq!(args.filter.as_deref(), Some("lo"));
                assert!(args.no_waveform);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Test command"),
        }
    }

    #[test]
    fn parse_sim_defaults() {
        let cli = Cli::parse_from(["loadcount", "sim"]);
        match cli.command {
            Command::Sim(ref args) => {
                assert_eq!(args.time, "100us");
                assert!(args.output.is_none());
                assert!(!args.no_waveform);
            }
            _ => panic!("expected Sim command"),
        }
    }

    #[test]
    fn parse_sim_with_args() {
        let cli = Cli::parse_from([
            "loadcount",
            "sim",
            "--time",
            "2ms",
            "-o",
            "waves/run.vcd",
            "--no-waveform",
        ]);
        match cli.command {
            Command::Sim(ref args) => {
                assert_eq!(args.time, "2ms");
                assert_eq!(args.output.as_deref(), Some("waves/run.vcd"));
                assert!(args.no_waveform);
            }
            _ => panic!("expected Sim command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["loadcount", "--quiet", "test"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::parse_from(["loadcount", "-vv", "sim"]);
        assert_eq!(cli.verbose, 2);
        let cli = Cli::parse_from(["loadcount", "test", "-v", "-v", "-v"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["loadcount", "--config", "/path/to/loadcount.toml", "test"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/loadcount.toml"));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(true, 3), "error");
        assert_eq!(log_level(false, 0), "warn");
        assert_eq!(log_level(false, 1), "info");
        assert_eq!(log_level(false, 2), "debug");
        assert_eq!(log_level(false, 9), "trace");
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["loadcount", "lint"]).is_err());
    }
}
