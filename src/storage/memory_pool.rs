use crate::core::{Transaction, TxId};
use log::debug;
use std::collections::{HashSet, VecDeque};

/// Transactions this peer knows about and has not mined or seen mined yet.
///
/// Owned by exactly one peer, so no locking. Every id is remembered once seen:
/// a repeated announcement, or an announcement for a transaction already mined
/// into a linked block, is dropped instead of being counted twice.
#[derive(Debug, Default)]
pub struct MemoryPool {
    pending: VecDeque<Transaction>,
    seen: HashSet<TxId>,
    mined: HashSet<TxId>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool::default()
    }

    /// Returns false when the id was already seen
    pub fn add(&mut self, tx: Transaction) -> bool {
        if !self.seen.insert(tx.get_id()) {
            debug!("Ignoring duplicate transaction {}", tx.get_id());
            return false;
        }
        self.pending.push_back(tx);
        true
    }

    /// Oldest pending transaction, removed from the pool
    pub fn take_next(&mut self) -> Option<Transaction> {
        let tx = self.pending.pop_front()?;
        self.mined.insert(tx.get_id());
        Some(tx)
    }

    /// Record that a linked block carries `txid`; it will never be handed out again
    pub fn mark_mined(&mut self, txid: TxId) {
        self.seen.insert(txid);
        if self.mined.insert(txid) {
            self.pending.retain(|tx| tx.get_id() != txid);
        }
    }

    pub fn contains(&self, txid: TxId) -> bool {
        self.pending.iter().any(|tx| tx.get_id() == txid)
    }

    pub fn is_mined(&self, txid: TxId) -> bool {
        self.mined.contains(&txid)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.pending.iter().copied().collect()
    }
}
