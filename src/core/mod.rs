//! Core consensus functionality
//!
//! This module contains the block and transaction types, the shared id
//! generator, and the fork-choice pieces a peer runs every round: linking,
//! chain selection, reorg tracking and the mining/submission policies.

pub mod block;
pub mod chain_selector;
pub mod ids;
pub mod linker;
pub mod message;
pub mod policy;
pub mod reorg;
pub mod transaction;

pub use block::Block;
pub use chain_selector::{ChainSelector, TieBreak};
pub use ids::{BlockId, IdGenerator, PeerId, TxId};
pub use linker::{LinkReport, Linker, OrphanExpiry};
pub use message::Message;
pub use policy::{BernoulliTrial, MiningPolicy, ParentSelection, SubmissionPolicy};
pub use reorg::{common_prefix_len, count_flipped_blocks, ChainStats, ChainSwitch, ReorgTracker};
pub use transaction::Transaction;
