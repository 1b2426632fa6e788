// Chain switch accounting.
// Every time the canonical chain is recomputed the tracker compares it with the
// previous one. Blocks of the old chain past the common prefix are "flipped".

use crate::core::BlockId;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// One recorded chain switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSwitch {
    pub round: u64,
    pub common_prefix: usize,
    pub flipped: usize,
    pub old_tip: Option<BlockId>,
    pub new_tip: Option<BlockId>,
}

/// Per-peer reorganization statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChainStats {
    pub total_switches: u64,
    pub total_flipped_blocks: u64,
    pub current_chain: Vec<BlockId>,
    /// flip count -> number of switches that flipped that many blocks
    pub flip_frequency: BTreeMap<usize, u64>,
    pub switch_history: Vec<ChainSwitch>,
}

/// Length of the longest common prefix of two chains
pub fn common_prefix_len(old_chain: &[BlockId], new_chain: &[BlockId]) -> usize {
    old_chain
        .iter()
        .zip(new_chain)
        .take_while(|(a, b)| a == b)
        .count()
}

/// Blocks of `old_chain` abandoned when moving to `new_chain`
pub fn count_flipped_blocks(old_chain: &[BlockId], new_chain: &[BlockId]) -> usize {
    old_chain.len() - common_prefix_len(old_chain, new_chain)
}

#[derive(Debug, Default)]
pub struct ReorgTracker {
    stats: ChainStats,
}

impl ReorgTracker {
    pub fn new() -> ReorgTracker {
        ReorgTracker::default()
    }

    pub fn stats(&self) -> &ChainStats {
        &self.stats
    }

    pub fn current_chain(&self) -> &[BlockId] {
        &self.stats.current_chain
    }

    /// Adopt `new_chain` as the canonical chain, recording a switch if blocks were flipped
    pub fn observe(&mut self, new_chain: Vec<BlockId>, round: u64) -> Option<ChainSwitch> {
        let old_chain = &self.stats.current_chain;
        if *old_chain == new_chain {
            return None;
        }

        let mut switch = None;
        if !old_chain.is_empty() && !new_chain.is_empty() {
            let k = common_prefix_len(old_chain, &new_chain);
            if k < old_chain.len() {
                let flipped = old_chain.len() - k;
                self.stats.total_switches += 1;
                self.stats.total_flipped_blocks += flipped as u64;
                *self.stats.flip_frequency.entry(flipped).or_insert(0) += 1;

                let record = ChainSwitch {
                    round,
                    common_prefix: k,
                    flipped,
                    old_tip: old_chain.last().copied(),
                    new_tip: new_chain.last().copied(),
                };
                info!(
                    "Round {round}: switched chain from tip {:?} to {:?}, {flipped} block(s) flipped",
                    record.old_tip, record.new_tip
                );
                self.stats.switch_history.push(record.clone());
                switch = Some(record);
            }
        }

        self.stats.current_chain = new_chain;
        switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(raw: &[u64]) -> Vec<BlockId> {
        raw.iter().map(|id| BlockId::from(*id)).collect()
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix_len(&chain(&[1, 2, 3]), &chain(&[1, 2, 4, 5])), 2);
        assert_eq!(common_prefix_len(&chain(&[1]), &chain(&[2])), 0);
        assert_eq!(common_prefix_len(&[], &chain(&[1])), 0);
        assert_eq!(count_flipped_blocks(&chain(&[1, 2, 3]), &chain(&[1, 4, 5, 6])), 2);
    }

    #[test]
    fn test_initial_chain_is_not_a_switch() {
        let mut tracker = ReorgTracker::new();
        assert!(tracker.observe(chain(&[1]), 0).is_none());
        assert_eq!(tracker.stats().total_switches, 0);
        assert_eq!(tracker.current_chain(), chain(&[1]).as_slice());
    }

    #[test]
    fn test_extension_is_not_a_switch() {
        let mut tracker = ReorgTracker::new();
        tracker.observe(chain(&[1, 2]), 0);
        assert!(tracker.observe(chain(&[1, 2, 3, 4]), 1).is_none());
        assert_eq!(tracker.stats().total_flipped_blocks, 0);
        assert_eq!(tracker.current_chain().len(), 4);
    }

    #[test]
    fn test_identical_chain_is_ignored() {
        let mut tracker = ReorgTracker::new();
        tracker.observe(chain(&[1, 2]), 0);
        assert!(tracker.observe(chain(&[1, 2]), 1).is_none());
        assert!(tracker.stats().switch_history.is_empty());
    }

    #[test]
    fn test_switch_accounting() {
        let mut tracker = ReorgTracker::new();
        tracker.observe(chain(&[1, 2, 3]), 0);

        let switch = tracker.observe(chain(&[1, 4, 5, 6]), 5).unwrap();
        assert_eq!(switch.flipped, 2);
        assert_eq!(switch.common_prefix, 1);
        assert_eq!(switch.old_tip, Some(BlockId::from(3)));
        assert_eq!(switch.new_tip, Some(BlockId::from(6)));

        tracker.observe(chain(&[1, 4, 7, 8, 9]), 6);
        tracker.observe(chain(&[1, 4, 7, 10, 11, 12]), 7);

        let stats = tracker.stats();
        assert_eq!(stats.total_switches, 3);
        assert_eq!(stats.total_flipped_blocks, 2 + 2 + 2);
        assert_eq!(stats.flip_frequency.get(&2), Some(&3));
        assert_eq!(stats.switch_history.len(), 3);
    }

    #[test]
    fn test_flipped_total_grows_by_old_len_minus_prefix() {
        let mut tracker = ReorgTracker::new();
        let sequence = [
            chain(&[1, 2]),
            chain(&[1, 3, 4]),
            chain(&[1, 3, 4, 5]),
            chain(&[6, 7, 8, 9, 10]),
        ];
        let mut previous: Vec<BlockId> = Vec::new();
        for (round, next) in sequence.iter().enumerate() {
            let before = tracker.stats().total_flipped_blocks;
            tracker.observe(next.clone(), round as u64);
            let expected = if previous.is_empty() {
                0
            } else {
                count_flipped_blocks(&previous, next) as u64
            };
            assert_eq!(tracker.stats().total_flipped_blocks - before, expected);
            previous = next.clone();
        }
        assert_eq!(tracker.stats().total_flipped_blocks, 1 + 4);
    }
}
