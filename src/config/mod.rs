//! Configuration management
//!
//! This module handles the settings for a simulation run and for each peer:
//! trial rates, parent selection, tie-breaking, orphan expiry and topology.
//! Values come from a TOML file, then `FORKCHAIN_*` environment variables,
//! then command-line flags.

pub mod settings;

pub use crate::core::{OrphanExpiry, ParentSelection, TieBreak};
pub use settings::{PeerConfig, SimulationConfig, Topology};
