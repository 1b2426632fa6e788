//! Per-peer storage
//!
//! Everything a peer keeps between rounds: linked blocks, blocks still waiting
//! for their parent, and pending transactions. All of it is owned by one peer.

pub mod block_store;
pub mod memory_pool;
pub mod unlinked;

pub use block_store::{BlockLookup, BlockStore, LinkOutcome};
pub use memory_pool::MemoryPool;
pub use unlinked::UnlinkedBuffer;
