//! Per-round decisions: whether to submit a transaction, whether to mine, and
//! which block a new block builds on.

use crate::core::BlockId;
use crate::error::SimError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Rates are percentages
pub const MAX_RATE: u8 = 100;

/// Bernoulli trial succeeding with probability `rate / 100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BernoulliTrial {
    rate: u8,
}

impl BernoulliTrial {
    pub fn new(rate: u8) -> BernoulliTrial {
        BernoulliTrial {
            rate: rate.min(MAX_RATE),
        }
    }

    pub fn rate(&self) -> u8 {
        self.rate
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..MAX_RATE) < self.rate
    }
}

/// Which block a freshly mined block extends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSelection {
    /// Tip of this peer's canonical chain
    #[default]
    CanonicalTip,
    /// Any tip, uniformly at random
    RandomTip,
}

impl FromStr for ParentSelection {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "canonical_tip" | "canonical" => Ok(ParentSelection::CanonicalTip),
            "random_tip" | "random" => Ok(ParentSelection::RandomTip),
            _ => Err(SimError::Config(format!(
                "Invalid parent selection: {s}. Valid options: canonical_tip, random_tip"
            ))),
        }
    }
}

impl fmt::Display for ParentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentSelection::CanonicalTip => write!(f, "canonical_tip"),
            ParentSelection::RandomTip => write!(f, "random_tip"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionPolicy {
    trial: BernoulliTrial,
}

impl SubmissionPolicy {
    pub fn new(submit_rate: u8) -> SubmissionPolicy {
        SubmissionPolicy {
            trial: BernoulliTrial::new(submit_rate),
        }
    }

    pub fn should_submit<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.trial.sample(rng)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MiningPolicy {
    trial: BernoulliTrial,
    parent_selection: ParentSelection,
}

impl MiningPolicy {
    pub fn new(mine_rate: u8, parent_selection: ParentSelection) -> MiningPolicy {
        MiningPolicy {
            trial: BernoulliTrial::new(mine_rate),
            parent_selection,
        }
    }

    pub fn parent_selection(&self) -> ParentSelection {
        self.parent_selection
    }

    pub fn should_mine<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.trial.sample(rng)
    }

    /// Parent for the next block; `None` means mine a genesis block
    pub fn select_parent<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        canonical_chain: &[BlockId],
        tips: &BTreeSet<BlockId>,
    ) -> Option<BlockId> {
        match self.parent_selection {
            ParentSelection::CanonicalTip => canonical_chain.last().copied(),
            ParentSelection::RandomTip => {
                if tips.is_empty() {
                    return None;
                }
                let index = rng.gen_range(0..tips.len());
                tips.iter().nth(index).copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rate_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let never = BernoulliTrial::new(0);
        let always = BernoulliTrial::new(100);
        for _ in 0..1000 {
            assert!(!never.sample(&mut rng));
            assert!(always.sample(&mut rng));
        }
        assert_eq!(BernoulliTrial::new(250).rate(), 100);
    }

    #[test]
    fn test_rate_is_roughly_respected() {
        let mut rng = StdRng::seed_from_u64(7);
        let trial = BernoulliTrial::new(30);
        let hits = (0..10_000).filter(|_| trial.sample(&mut rng)).count();
        assert!((2_500..3_500).contains(&hits), "got {hits} hits");
    }

    #[test]
    fn test_canonical_parent() {
        let mut rng = StdRng::seed_from_u64(0);
        let policy = MiningPolicy::new(100, ParentSelection::CanonicalTip);
        let chain = vec![BlockId::from(1), BlockId::from(4)];
        let tips: BTreeSet<_> = [BlockId::from(4), BlockId::from(5)].into_iter().collect();

        assert_eq!(policy.select_parent(&mut rng, &chain, &tips), Some(BlockId::from(4)));
        assert_eq!(policy.select_parent(&mut rng, &[], &BTreeSet::new()), None);
    }

    #[test]
    fn test_random_parent_covers_every_tip() {
        let mut rng = StdRng::seed_from_u64(3);
        let policy = MiningPolicy::new(100, ParentSelection::RandomTip);
        let tips: BTreeSet<_> = (1..=3).map(BlockId::from).collect();

        let picked: BTreeSet<_> = (0..200)
            .filter_map(|_| policy.select_parent(&mut rng, &[], &tips))
            .collect();
        assert_eq!(picked, tips);
        assert_eq!(policy.select_parent(&mut rng, &[], &BTreeSet::new()), None);
    }

    #[test]
    fn test_parent_selection_parsing() {
        assert_eq!(
            "random-tip".parse::<ParentSelection>().unwrap(),
            ParentSelection::RandomTip
        );
        assert_eq!(
            "canonical".parse::<ParentSelection>().unwrap(),
            ParentSelection::CanonicalTip
        );
        assert!("heaviest".parse::<ParentSelection>().is_err());
    }
}
