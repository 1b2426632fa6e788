use crate::core::{BlockId, IdGenerator, PeerId, Transaction};
use serde::{Deserialize, Serialize};

/// Height of a block whose parent is the root sentinel
pub const ROOT_HEIGHT: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    block_id: BlockId,
    parent: Option<BlockId>, // None is the root sentinel
    miner_id: PeerId,
    transaction: Transaction,
    height: u64, // denormalized, always parent height + 1 once linked
}

impl Block {
    /// Mine a block on top of `parent`, taking a fresh id from the shared generator
    pub fn new_block(
        ids: &IdGenerator,
        parent: &Block,
        miner_id: PeerId,
        transaction: Transaction,
    ) -> Block {
        Block {
            block_id: ids.next_block_id(),
            parent: Some(parent.get_id()),
            miner_id,
            transaction,
            height: parent.get_height() + 1,
        }
    }

    /// The only way a root block is ever created: peers with an empty store call
    /// this when they win a mining trial.
    pub fn generate_genesis_block(
        ids: &IdGenerator,
        miner_id: PeerId,
        transaction: Transaction,
    ) -> Block {
        Block {
            block_id: ids.next_block_id(),
            parent: None,
            miner_id,
            transaction,
            height: ROOT_HEIGHT,
        }
    }

    /// Rebuild a block from its fields, e.g. when it arrives from another peer
    pub fn from_parts(
        block_id: BlockId,
        parent: Option<BlockId>,
        miner_id: PeerId,
        transaction: Transaction,
        height: u64,
    ) -> Block {
        Block {
            block_id,
            parent,
            miner_id,
            transaction,
            height,
        }
    }

    pub fn get_id(&self) -> BlockId {
        self.block_id
    }

    pub fn get_parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn get_miner(&self) -> PeerId {
        self.miner_id
    }

    pub fn get_transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn with_height(mut self, height: u64) -> Block {
        self.height = height;
        self
    }
}
