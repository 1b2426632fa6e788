// The linked part of a peer's block DAG.
// Blocks only get in here once their parent is already present, so every stored
// block has a complete ancestry back to a root. Nothing is ever removed or changed
// after insertion.

use crate::core::block::ROOT_HEIGHT;
use crate::core::{Block, BlockId};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Read access to blocks by id, used by chain selection
pub trait BlockLookup {
    fn lookup(&self, id: BlockId) -> Option<&Block>;

    fn block_count(&self) -> usize;

    /// Order in which the block was linked locally, when known
    fn link_sequence(&self, _id: BlockId) -> Option<u64> {
        None
    }
}

impl BlockLookup for HashMap<BlockId, Block> {
    fn lookup(&self, id: BlockId) -> Option<&Block> {
        self.get(&id)
    }

    fn block_count(&self) -> usize {
        self.len()
    }
}

/// Result of trying to link a single block
#[derive(Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// Same id is already stored; the store is unchanged
    Duplicate,
    /// Parent not stored yet; the block is handed back to the caller
    Orphan(Block),
}

#[derive(Debug, Default)]
pub struct BlockStore {
    blocks: HashMap<BlockId, Block>,
    children: HashMap<BlockId, Vec<BlockId>>,
    roots: Vec<BlockId>,
    tips: BTreeSet<BlockId>,
    link_order: HashMap<BlockId, u64>,
    next_sequence: u64,
}

impl BlockStore {
    pub fn new() -> BlockStore {
        BlockStore::default()
    }

    pub fn can_link(&self, block: &Block) -> bool {
        match block.get_parent() {
            None => true,
            Some(parent) => self.blocks.contains_key(&parent),
        }
    }

    /// Attach a block whose parent is present (or which is a root).
    ///
    /// The parent stops being a tip and the new block becomes one. A stored height
    /// that disagrees with the parent chain is corrected before insertion.
    pub fn link(&mut self, block: Block) -> LinkOutcome {
        let id = block.get_id();
        if self.blocks.contains_key(&id) {
            return LinkOutcome::Duplicate;
        }

        let expected_height = match block.get_parent() {
            None => ROOT_HEIGHT,
            Some(parent) => match self.blocks.get(&parent) {
                Some(parent_block) => parent_block.get_height() + 1,
                None => return LinkOutcome::Orphan(block),
            },
        };

        let block = if block.get_height() != expected_height {
            warn!(
                "Block {id} claims height {} but its parent chain gives {expected_height}; correcting",
                block.get_height()
            );
            block.with_height(expected_height)
        } else {
            block
        };

        match block.get_parent() {
            Some(parent) => {
                self.children.entry(parent).or_default().push(id);
                self.tips.remove(&parent);
            }
            None => self.roots.push(id),
        }
        self.tips.insert(id);
        self.link_order.insert(id, self.next_sequence);
        self.next_sequence += 1;

        debug!(
            "Linked block {id} at height {} (parent: {:?})",
            block.get_height(),
            block.get_parent()
        );
        self.blocks.insert(id, block);
        LinkOutcome::Linked
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks with no recorded children, in id order
    pub fn tips(&self) -> &BTreeSet<BlockId> {
        &self.tips
    }

    pub fn is_tip(&self, id: BlockId) -> bool {
        self.tips.contains(&id)
    }

    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    pub fn children_of(&self, id: BlockId) -> &[BlockId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Recount tips from the child edges; true when the tip set matches
    pub fn tips_consistent(&self) -> bool {
        let childless: BTreeSet<BlockId> = self
            .blocks
            .keys()
            .filter(|id| self.children_of(**id).is_empty())
            .copied()
            .collect();
        childless == self.tips
    }
}

impl BlockLookup for BlockStore {
    fn lookup(&self, id: BlockId) -> Option<&Block> {
        self.get(id)
    }

    fn block_count(&self) -> usize {
        self.len()
    }

    fn link_sequence(&self, id: BlockId) -> Option<u64> {
        self.link_order.get(&id).copied()
    }
}
