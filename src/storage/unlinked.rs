use crate::core::{Block, BlockId};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct PendingBlock {
    block: Block,
    received_round: u64,
}

/// Blocks received before their parent, in arrival order
#[derive(Debug, Default)]
pub struct UnlinkedBuffer {
    pending: VecDeque<PendingBlock>,
}

impl UnlinkedBuffer {
    pub fn new() -> UnlinkedBuffer {
        UnlinkedBuffer::default()
    }

    /// Queue a block; returns false if a block with the same id is already waiting
    pub fn push(&mut self, block: Block, received_round: u64) -> bool {
        if self.contains(block.get_id()) {
            return false;
        }
        self.pending.push_back(PendingBlock {
            block,
            received_round,
        });
        true
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.pending.iter().any(|p| p.block.get_id() == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.pending.iter().map(|p| p.block.get_id()).collect()
    }

    /// Remove and return every block for which `ready` holds, keeping the order of the rest
    pub(crate) fn drain_where<F>(&mut self, mut ready: F) -> Vec<Block>
    where
        F: FnMut(&Block) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if ready(&pending.block) {
                taken.push(pending.block);
            } else {
                kept.push_back(pending);
            }
        }
        self.pending = kept;
        taken
    }

    /// Drop blocks that have waited more than `max_age` rounds
    pub(crate) fn expire_older_than(&mut self, current_round: u64, max_age: u64) -> Vec<Block> {
        let mut expired = Vec::new();
        self.pending.retain(|p| {
            let stale = current_round.saturating_sub(p.received_round) > max_age;
            if stale {
                expired.push(p.block.clone());
            }
            !stale
        });
        expired
    }

    /// Drop the oldest blocks until at most `limit` remain
    pub(crate) fn truncate_oldest(&mut self, limit: usize) -> Vec<Block> {
        let mut expired = Vec::new();
        while self.pending.len() > limit {
            if let Some(p) = self.pending.pop_front() {
                expired.push(p.block);
            }
        }
        expired
    }
}
