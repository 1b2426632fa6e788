//! Test utilities for fork-choice testing

use crate::config::PeerConfig;
use crate::core::{Block, BlockId, IdGenerator, PeerId, Transaction, TxId};
use crate::network::Peer;
use crate::storage::BlockStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

// Generators used by test peers start here so they never collide with fixture ids
const TEST_GENERATOR_START: u64 = 1_000;

pub fn tx(id: u64) -> Transaction {
    Transaction::new(TxId::from(id), 0)
}

/// Root block whose transaction id equals its block id
pub fn root_block(id: u64) -> Block {
    Block::from_parts(BlockId::from(id), None, PeerId::from(0), tx(id), 1)
}

/// Block on `parent`. Height is left for the store to fill in.
pub fn block(id: u64, parent: u64) -> Block {
    Block::from_parts(
        BlockId::from(id),
        Some(BlockId::from(parent)),
        PeerId::from(0),
        tx(id),
        0,
    )
}

/// Store holding the chain `1 -> 2 -> ... -> length`
pub fn linear_store(length: u64) -> BlockStore {
    let mut store = BlockStore::new();
    if length == 0 {
        return store;
    }
    store.link(root_block(1));
    for id in 2..=length {
        store.link(block(id, id - 1));
    }
    store
}

/// Peer 0 with the given rates and a private id generator
pub fn peer_with_rates(submit_rate: u8, mine_rate: u8) -> Peer<StdRng> {
    let config = PeerConfig {
        submit_rate,
        mine_rate,
        ..PeerConfig::default()
    };
    Peer::new(
        PeerId::from(0),
        &config,
        Arc::new(IdGenerator::starting_at(
            TEST_GENERATOR_START,
            TEST_GENERATOR_START,
        )),
        StdRng::seed_from_u64(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_store() {
        let store = linear_store(5);
        assert_eq!(store.len(), 5);
        assert_eq!(store.tips().len(), 1);
        assert_eq!(store.get(BlockId::from(5)).unwrap().get_height(), 5);
        assert!(store.tips_consistent());
    }

    #[test]
    fn test_fixture_blocks() {
        assert!(root_block(3).is_genesis());
        assert_eq!(block(4, 3).get_parent(), Some(BlockId::from(3)));
        assert_eq!(block(4, 3).get_transaction().get_id(), TxId::from(4));
    }
}
