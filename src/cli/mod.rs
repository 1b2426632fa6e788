//! Command-line interface
//!
//! Argument parsing for the simulator binary and the layering of command-line
//! flags over file and environment configuration.

pub mod commands;

pub use commands::{Command, Opt, RunArgs};
