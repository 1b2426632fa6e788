// Identifiers for blocks, transactions and peers, plus the one piece of state
// that every peer in the network shares: the id counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// First id handed out by a fresh generator; 0 is never a valid block or transaction id
const FIRST_ID: u64 = 1;

/// Network-wide unique block identifier, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(u64);

/// Network-wide unique transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(u64);

/// Identity assigned to a peer by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(u64);

macro_rules! id_conversions {
    ($name:ident) => {
        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }

        impl $name {
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_conversions!(BlockId);
id_conversions!(TxId);
id_conversions!(PeerId);

/// Hands out block and transaction ids for the whole network.
///
/// Shared by reference (`Arc<IdGenerator>`) between every peer of a simulation.
/// Each allocation is a single atomic `fetch_add`, so ids stay unique and
/// increasing even when the host runs peers on several threads.
#[derive(Debug)]
pub struct IdGenerator {
    first_block: u64,
    first_transaction: u64,
    next_block: AtomicU64,
    next_transaction: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> IdGenerator {
        Self::starting_at(FIRST_ID, FIRST_ID)
    }

    pub fn starting_at(block: u64, transaction: u64) -> IdGenerator {
        IdGenerator {
            first_block: block,
            first_transaction: transaction,
            next_block: AtomicU64::new(block),
            next_transaction: AtomicU64::new(transaction),
        }
    }

    pub fn next_block_id(&self) -> BlockId {
        BlockId(self.next_block.fetch_add(1, Ordering::SeqCst))
    }

    pub fn next_transaction_id(&self) -> TxId {
        TxId(self.next_transaction.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of block ids allocated so far
    pub fn blocks_issued(&self) -> u64 {
        self.next_block
            .load(Ordering::SeqCst)
            .saturating_sub(self.first_block)
    }

    /// Number of transaction ids allocated so far
    pub fn transactions_issued(&self) -> u64 {
        self.next_transaction
            .load(Ordering::SeqCst)
            .saturating_sub(self.first_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_block_id(), BlockId::from(1));
        assert_eq!(ids.next_block_id(), BlockId::from(2));
        assert_eq!(ids.next_transaction_id(), TxId::from(1));
        assert_eq!(ids.blocks_issued(), 2);
        assert_eq!(ids.transactions_issued(), 1);
    }

    #[test]
    fn test_block_and_transaction_counters_are_independent() {
        let ids = IdGenerator::starting_at(10, 500);
        assert_eq!(ids.next_transaction_id().value(), 500);
        assert_eq!(ids.next_block_id().value(), 10);
        assert_eq!(ids.next_transaction_id().value(), 501);
    }

    #[test]
    fn test_issued_counts_from_custom_start() {
        let zero = IdGenerator::starting_at(0, 0);
        assert_eq!(zero.blocks_issued(), 0);
        assert_eq!(zero.transactions_issued(), 0);
        assert_eq!(zero.next_block_id(), BlockId::from(0));
        assert_eq!(zero.blocks_issued(), 1);

        let offset = IdGenerator::starting_at(100, 100);
        assert_eq!(offset.blocks_issued(), 0);
        assert_eq!(offset.transactions_issued(), 0);
        offset.next_block_id();
        offset.next_transaction_id();
        offset.next_transaction_id();
        assert_eq!(offset.blocks_issued(), 1);
        assert_eq!(offset.transactions_issued(), 2);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..1000).map(|_| ids.next_block_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate block id {id}");
            }
        }
        assert_eq!(seen.len(), 8000);
        assert_eq!(ids.blocks_issued(), 8000);
    }
}
