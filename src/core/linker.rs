// Moves blocks from the unlinked buffer into the block store as their parents show up.

use crate::core::BlockId;
use crate::storage::{BlockStore, LinkOutcome, UnlinkedBuffer};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// What happens to blocks whose parent never arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanExpiry {
    /// Keep waiting forever
    #[default]
    Keep,
    /// Drop an orphan once it has waited more than this many rounds
    MaxAge(u64),
    /// Drop the oldest orphans while more than this many are buffered
    MaxBuffered(usize),
}

/// Blocks linked and dropped by one linker run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub linked: Vec<BlockId>,
    pub expired: Vec<BlockId>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Linker {
    expiry: OrphanExpiry,
}

impl Linker {
    pub fn new(expiry: OrphanExpiry) -> Linker {
        Linker { expiry }
    }

    pub fn expiry(&self) -> OrphanExpiry {
        self.expiry
    }

    /// Link everything that can be linked, then apply the orphan policy.
    ///
    /// Linking one block can make another buffered block linkable, so the buffer
    /// is rescanned until a full pass links nothing.
    pub fn link_pending(
        &self,
        store: &mut BlockStore,
        buffer: &mut UnlinkedBuffer,
        round: u64,
    ) -> LinkReport {
        let mut report = LinkReport::default();

        loop {
            let ready = buffer.drain_where(|block| store.can_link(block));
            if ready.is_empty() {
                break;
            }
            for block in ready {
                let id = block.get_id();
                match store.link(block) {
                    LinkOutcome::Linked => report.linked.push(id),
                    LinkOutcome::Duplicate => debug!("Block {id} was already linked"),
                    // can_link held, and nothing in this pass removes blocks
                    LinkOutcome::Orphan(block) => {
                        buffer.push(block, round);
                    }
                }
            }
        }

        let expired = match self.expiry {
            OrphanExpiry::Keep => Vec::new(),
            OrphanExpiry::MaxAge(max_age) => buffer.expire_older_than(round, max_age),
            OrphanExpiry::MaxBuffered(limit) => buffer.truncate_oldest(limit),
        };
        for block in &expired {
            warn!(
                "Dropping orphan block {} (parent {:?} never arrived, policy {:?})",
                block.get_id(),
                block.get_parent(),
                self.expiry
            );
        }
        report.expired = expired.iter().map(|b| b.get_id()).collect();

        report
    }
}
