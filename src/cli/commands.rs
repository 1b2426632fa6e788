use crate::config::{ParentSelection, SimulationConfig, TieBreak, Topology};
use crate::error::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forkchain-sim", about = "Longest-chain fork-choice simulator")]
pub struct Opt {
    /// More output per occurrence (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

impl Opt {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "run", about = "Run a simulation")]
    Run(RunArgs),
    #[command(
        name = "summarize",
        about = "Convert a statistics log into a CSV report"
    )]
    Summarize {
        #[arg(help = "Statistics log written by 'run --output'")]
        input: PathBuf,
        #[arg(help = "CSV file to write")]
        output: PathBuf,
    },
    #[command(
        name = "default-config",
        about = "Print the default configuration as TOML"
    )]
    DefaultConfig,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    #[arg(long = "config", help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long = "rounds", help = "Number of rounds to play")]
    pub rounds: Option<u64>,
    #[arg(long = "peers", help = "Number of peers")]
    pub peers: Option<usize>,
    #[arg(long = "seed", help = "Experiment seed")]
    pub seed: Option<u64>,
    #[arg(long = "submit-rate", help = "Transaction submission chance in percent")]
    pub submit_rate: Option<u8>,
    #[arg(long = "mine-rate", help = "Mining chance in percent")]
    pub mine_rate: Option<u8>,
    #[arg(
        long = "parent-selection",
        help = "Parent for mined blocks (canonical-tip, random-tip)"
    )]
    pub parent_selection: Option<ParentSelection>,
    #[arg(
        long = "tie-break",
        help = "Equal-length chain rule (lowest-tip-id, first-linked)"
    )]
    pub tie_break: Option<TieBreak>,
    #[arg(long = "topology", help = "Peer wiring (complete, ring)")]
    pub topology: Option<Topology>,
    #[arg(long = "report-round", help = "Only record statistics for this round")]
    pub report_round: Option<u64>,
    #[arg(long = "no-relay", help = "Peers do not forward what they receive")]
    pub no_relay: bool,
    #[arg(long = "parallel", help = "Run the peers of each round in parallel")]
    pub parallel: bool,
    #[arg(long = "output", help = "Write the statistics log to this JSON file")]
    pub output: Option<PathBuf>,
    #[arg(long = "csv", help = "Also write a CSV report to this file")]
    pub csv: Option<PathBuf>,
}

impl RunArgs {
    /// Configuration file (or defaults), then environment, then command-line flags
    pub fn resolve_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)?,
            None => SimulationConfig::default(),
        };
        config.apply_env_overrides()?;
        self.apply_to(&mut config)?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut SimulationConfig) -> Result<()> {
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(peers) = self.peers {
            config.peers = peers;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(rate) = self.submit_rate {
            config.peer.submit_rate = rate;
        }
        if let Some(rate) = self.mine_rate {
            config.peer.mine_rate = rate;
        }
        if let Some(selection) = self.parent_selection {
            config.peer.parent_selection = selection;
        }
        if let Some(tie_break) = self.tie_break {
            config.peer.tie_break = tie_break;
        }
        if let Some(topology) = self.topology {
            config.topology = topology;
        }
        if self.report_round.is_some() {
            config.report_round = self.report_round;
        }
        if self.no_relay {
            config.peer.relay = false;
        }
        if self.parallel {
            config.parallel = true;
        }
        config.validate()
    }
}
