use crate::core::policy::MAX_RATE;
use crate::core::{OrphanExpiry, ParentSelection, TieBreak};
use crate::error::{Result, SimError};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const DEFAULT_SUBMIT_RATE: u8 = 20;
const DEFAULT_MINE_RATE: u8 = 40;
const DEFAULT_PEERS: usize = 10;
const DEFAULT_ROUNDS: u64 = 100;
const DEFAULT_SEED: u64 = 42;

const SUBMIT_RATE_KEY: &str = "FORKCHAIN_SUBMIT_RATE";
const MINE_RATE_KEY: &str = "FORKCHAIN_MINE_RATE";
const PARENT_SELECTION_KEY: &str = "FORKCHAIN_PARENT_SELECTION";
const SEED_KEY: &str = "FORKCHAIN_SEED";
const PEERS_KEY: &str = "FORKCHAIN_PEERS";
const ROUNDS_KEY: &str = "FORKCHAIN_ROUNDS";

/// Behavior of a single mining peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Chance in percent of announcing a transaction each round
    pub submit_rate: u8,
    /// Chance in percent of mining a block each round
    pub mine_rate: u8,
    pub parent_selection: ParentSelection,
    pub tie_break: TieBreak,
    /// Forward every block and transaction seen for the first time to all neighbors
    pub relay: bool,
    pub orphan_expiry: OrphanExpiry,
}

impl Default for PeerConfig {
    fn default() -> Self {
        PeerConfig {
            submit_rate: DEFAULT_SUBMIT_RATE,
            mine_rate: DEFAULT_MINE_RATE,
            parent_selection: ParentSelection::default(),
            tie_break: TieBreak::default(),
            relay: true,
            orphan_expiry: OrphanExpiry::default(),
        }
    }
}

/// How peers are wired to their neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Every peer is a neighbor of every other peer
    #[default]
    Complete,
    /// Each peer talks to the peers directly before and after it
    Ring,
}

impl FromStr for Topology {
    type Err = SimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complete" => Ok(Topology::Complete),
            "ring" => Ok(Topology::Ring),
            _ => Err(SimError::Config(format!(
                "Invalid topology: {s}. Valid options: complete, ring"
            ))),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Complete => write!(f, "complete"),
            Topology::Ring => write!(f, "ring"),
        }
    }
}

/// Everything the reference host needs to run one experiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub peers: usize,
    pub rounds: u64,
    pub seed: u64,
    pub topology: Topology,
    /// Run the peers of a round on the rayon thread pool
    pub parallel: bool,
    /// Only emit statistics for this round; every round when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_round: Option<u64>,
    pub peer: PeerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            peers: DEFAULT_PEERS,
            rounds: DEFAULT_ROUNDS,
            seed: DEFAULT_SEED,
            topology: Topology::default(),
            parallel: false,
            report_round: None,
            peer: PeerConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(contents: &str) -> Result<SimulationConfig> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SimulationConfig> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Apply `FORKCHAIN_*` environment variables on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SUBMIT_RATE_KEY) {
            self.peer.submit_rate = parse_value(SUBMIT_RATE_KEY, &value)?;
        }
        if let Some(value) = lookup(MINE_RATE_KEY) {
            self.peer.mine_rate = parse_value(MINE_RATE_KEY, &value)?;
        }
        if let Some(value) = lookup(PARENT_SELECTION_KEY) {
            self.peer.parent_selection = value.parse()?;
        }
        if let Some(value) = lookup(SEED_KEY) {
            self.seed = parse_value(SEED_KEY, &value)?;
        }
        if let Some(value) = lookup(PEERS_KEY) {
            self.peers = parse_value(PEERS_KEY, &value)?;
        }
        if let Some(value) = lookup(ROUNDS_KEY) {
            self.rounds = parse_value(ROUNDS_KEY, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.peer.submit_rate > MAX_RATE {
            return Err(SimError::Config(format!(
                "submit_rate must be at most {MAX_RATE}, got {}",
                self.peer.submit_rate
            )));
        }
        if self.peer.mine_rate > MAX_RATE {
            return Err(SimError::Config(format!(
                "mine_rate must be at most {MAX_RATE}, got {}",
                self.peer.mine_rate
            )));
        }
        if self.topology == Topology::Ring && !self.peer.relay {
            return Err(SimError::Config(
                "ring topology requires relay = true".to_string(),
            ));
        }
        if self.peers == 0 {
            return Err(SimError::Config("peers must be at least 1".to_string()));
        }
        if self.rounds == 0 {
            return Err(SimError::Config("rounds must be at least 1".to_string()));
        }
        if let Some(round) = self.report_round {
            if round >= self.rounds {
                return Err(SimError::Config(format!(
                    "report_round {round} is past the last round {}",
                    self.rounds - 1
                )));
            }
        }
        Ok(())
    }

    pub fn should_report(&self, round: u64) -> bool {
        self.report_round.map_or(true, |r| r == round)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SimError::Config(format!("Invalid value for {key}: {value}")))
}
