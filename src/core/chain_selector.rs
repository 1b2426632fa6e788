//! Longest-chain fork choice
//!
//! Every tip is walked back to its root and the longest resulting path wins.
//! Equal-length paths are ordered by an explicit [`TieBreak`], never by map
//! iteration order, so the same store always yields the same chain.

use crate::core::BlockId;
use crate::error::SimError;
use crate::storage::BlockLookup;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to choose between competing chains of the same length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lowest tip id wins, i.e. the tip created first anywhere in the network
    #[default]
    LowestTipId,
    /// The tip this peer linked first wins
    FirstLinked,
}

impl FromStr for TieBreak {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lowest_tip_id" => Ok(TieBreak::LowestTipId),
            "first_linked" => Ok(TieBreak::FirstLinked),
            _ => Err(SimError::Config(format!(
                "Invalid tie break: {s}. Valid options: lowest_tip_id, first_linked"
            ))),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::LowestTipId => write!(f, "lowest_tip_id"),
            TieBreak::FirstLinked => write!(f, "first_linked"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChainSelector {
    tie_break: TieBreak,
}

impl ChainSelector {
    pub fn new(tie_break: TieBreak) -> ChainSelector {
        ChainSelector { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Root-to-tip path ending at `tip`.
    ///
    /// If an ancestor is missing the path stops at the last block that exists, so
    /// the result only ever contains stored blocks. A walk longer than the store
    /// means the parent links loop; it is cut off there.
    pub fn path_to_root<L: BlockLookup>(lookup: &L, tip: BlockId) -> Vec<BlockId> {
        let mut path = Vec::new();
        let mut current = Some(tip);

        while let Some(id) = current {
            let Some(block) = lookup.lookup(id) else {
                warn!("Ancestry of tip {tip} breaks at missing block {id}; truncating");
                break;
            };
            path.push(id);
            if path.len() > lookup.block_count() {
                warn!("Ancestry of tip {tip} loops back on itself; truncating");
                path.pop();
                break;
            }
            current = block.get_parent();
        }

        path.reverse();
        path
    }

    /// Pick the canonical chain among the paths ending at `tips`
    pub fn select<L, I>(&self, lookup: &L, tips: I) -> Vec<BlockId>
    where
        L: BlockLookup,
        I: IntoIterator<Item = BlockId>,
    {
        let mut best: Option<(Vec<BlockId>, (u64, BlockId))> = None;

        for tip in tips {
            let path = Self::path_to_root(lookup, tip);
            if path.is_empty() {
                continue;
            }
            let rank = self.rank(lookup, tip);
            let better = match &best {
                None => true,
                Some((best_path, best_rank)) => {
                    path.len() > best_path.len()
                        || (path.len() == best_path.len() && rank < *best_rank)
                }
            };
            if better {
                best = Some((path, rank));
            }
        }

        best.map(|(path, _)| path).unwrap_or_default()
    }

    // Lower rank wins a tie
    fn rank<L: BlockLookup>(&self, lookup: &L, tip: BlockId) -> (u64, BlockId) {
        match self.tie_break {
            TieBreak::LowestTipId => (0, tip),
            TieBreak::FirstLinked => (lookup.link_sequence(tip).unwrap_or(u64::MAX), tip),
        }
    }
}
