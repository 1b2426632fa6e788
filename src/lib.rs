//! # Forkchain Sim - Longest-Chain Fork Choice Under Out-of-Order Delivery
//!
//! This is my simulator for how mining peers agree (or don't) on a chain when
//! blocks reach them late, twice, or before their parents.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Peer state machine**: submit transactions, mine blocks, link what arrives
//! - **Linker**: buffers orphan blocks until their parents show up
//! - **Fork choice**: longest root-to-tip path with a deterministic tie-break
//! - **Reorg accounting**: switches, flipped blocks and how often each size happens
//! - **Reference host**: round-based network with complete or ring topology
//! - **Reports**: per-round JSON statistics and a CSV summary per run
//!
//! ## How I Organized My Code
//! - `core/`: ids, blocks, messages, the linker, fork choice, reorg tracking, policies
//! - `storage/`: block store, orphan buffer, memory pool
//! - `network/`: the peer, the `Node` trait the host drives, outboxes, topology
//! - `simulation/`: the round loop that owns every peer
//! - `report/`: network summaries, the statistics log, CSV export
//! - `config/`: TOML configuration with environment overrides
//! - `cli/`: command-line interface
//!
//! ## Key Design Decisions I Made
//! - Each peer owns all of its state, so a round needs no locks
//! - Peers only talk through outboxes the host delivers after the round
//! - Only the id generator is shared, and it is a pair of atomics
//! - Randomness is injected, so a seed reproduces a sequential run exactly

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod report;
pub mod simulation;
pub mod storage;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, RunArgs};
pub use config::{
    OrphanExpiry, ParentSelection, PeerConfig, SimulationConfig, TieBreak, Topology,
};
pub use crate::core::{
    Block, BlockId, ChainSelector, ChainStats, ChainSwitch, IdGenerator, Linker, Message,
    PeerId, ReorgTracker, Transaction, TxId,
};
pub use error::{Result, SimError};
pub use network::{Node, Nodes, Outbox, Peer, PeerCounters, Transport};
pub use report::{NetworkSummary, StatsSink, TestLog};
pub use simulation::Simulation;
pub use storage::{BlockLookup, BlockStore, LinkOutcome, MemoryPool, UnlinkedBuffer};
