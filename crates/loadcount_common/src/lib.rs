//! Shared foundational types for the loadcount counter model.
//!
//! This crate provides 4-state logic values (including high-impedance for the
//! shared bidirectional bus), packed logic vectors for port-level signals, and
//! clock frequency values.

#![warn(missing_docs)]

pub mod frequency;
pub mod logic;
pub mod logic_vec;

pub use frequency::{Frequency, ParseFrequencyError};
pub use logic::Logic;
pub use logic_vec::LogicVec;
