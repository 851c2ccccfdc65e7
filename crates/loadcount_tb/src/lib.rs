//! Verification harness for the loadcount counter block.
//!
//! The harness drives the block's ports through [`Testbench`], checks what it
//! observes with named checks that fail fast as [`CheckError`], and packages
//! the reference test sequence as [`Scenario`]s.
//!
//! # Usage
//!
//! ```ignore
//! use loadcount_config::BenchSettings;
//! use loadcount_tb::{run_scenario, Scenario};
//!
//! let result = run_scenario(Scenario::Reference, &BenchSettings::default(), None);
//! assert!(result.passed);
//! ```

#![warn(missing_docs)]

pub mod bench;
pub mod check;
pub mod scenario;

pub use bench::Testbench;
pub use check::{check_eq, check_that, hex, CheckError};
pub use loadcount_config::BenchSettings;
pub use scenario::{
    increment_phase, load_phase, reset_phase, run_scenario, tristate_phase, LoadOutcome, Scenario,
    ScenarioResult,
};
