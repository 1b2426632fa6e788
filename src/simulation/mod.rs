//! Reference round-based host
//!
//! Owns every peer, runs them once per round and delivers what they broadcast
//! to their neighbors before the next round starts. Peers never see each other
//! directly: each one writes into its own [`Outbox`] and the host fans those out
//! after the whole round has finished, which is what lets the parallel mode hand
//! every peer to a different rayon worker without locks.

use crate::config::SimulationConfig;
use crate::core::{IdGenerator, PeerId};
use crate::error::{Result, SimError};
use crate::network::{Node, Nodes, Outbox, Peer};
use crate::report::{NetworkSummary, StatsSink};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;

pub struct Simulation {
    config: SimulationConfig,
    ids: Arc<IdGenerator>,
    peers: Vec<Peer<StdRng>>,
    nodes: Nodes,
    round: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Simulation> {
        config.validate()?;
        let nodes = Nodes::new(config.peers, config.topology)?;
        let ids = Arc::new(IdGenerator::new());

        let peers = (0..config.peers as u64)
            .map(|i| {
                Peer::new(
                    PeerId::from(i),
                    &config.peer,
                    Arc::clone(&ids),
                    StdRng::seed_from_u64(peer_seed(config.seed, i)),
                )
            })
            .collect();

        Ok(Simulation {
            config,
            ids,
            peers,
            nodes,
            round: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn peers(&self) -> &[Peer<StdRng>] {
        &self.peers
    }

    pub fn peer(&self, id: PeerId) -> Result<&Peer<StdRng>> {
        self.peers
            .get(id.value() as usize)
            .ok_or(SimError::UnknownPeer(id))
    }

    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    /// Next round to be played
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Play one round: every peer computes, then outboxes are delivered and the
    /// round is closed.
    pub fn step(&mut self) -> Result<NetworkSummary> {
        let round = self.round;

        let mut outboxes = self
            .peers
            .iter()
            .map(|peer| {
                let id = peer.get_id();
                Ok(Outbox::new(id, self.nodes.neighbors_of(id)?.len()))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.config.parallel {
            self.peers
                .par_iter_mut()
                .zip(outboxes.par_iter_mut())
                .for_each(|(peer, outbox)| peer.perform_computation(round, outbox));
        } else {
            for (peer, outbox) in self.peers.iter_mut().zip(outboxes.iter_mut()) {
                peer.perform_computation(round, outbox);
            }
        }

        let delivered = self.deliver(outboxes)?;
        debug!("Round {round}: delivered {delivered} messages");

        for peer in &mut self.peers {
            peer.on_round_end(round);
        }

        self.round += 1;
        Ok(NetworkSummary::collect(round, &self.peers))
    }

    // Fans each outbox out to the sender's neighbors, in peer order
    fn deliver(&mut self, outboxes: Vec<Outbox>) -> Result<usize> {
        let mut delivered = 0;
        for outbox in outboxes {
            let from = outbox.get_from();
            let neighbors = self.nodes.neighbors_of(from)?.to_vec();
            for message in outbox.into_messages() {
                for neighbor in &neighbors {
                    let peer = self
                        .peers
                        .get_mut(neighbor.value() as usize)
                        .ok_or(SimError::UnknownPeer(*neighbor))?;
                    peer.on_message(message.clone());
                    delivered += 1;
                }
            }
        }
        Ok(delivered)
    }

    /// Play all configured rounds, emitting summaries for the reported rounds to `sink`
    pub fn run(&mut self, sink: &mut dyn StatsSink) -> Result<NetworkSummary> {
        info!(
            "Starting simulation: {} peers, {} rounds, seed {}, topology {}{}",
            self.config.peers,
            self.config.rounds,
            self.config.seed,
            self.config.topology,
            if self.config.parallel { ", parallel" } else { "" }
        );

        let mut last = NetworkSummary::default();
        while self.round < self.config.rounds {
            let summary = self.step()?;
            if self.config.should_report(summary.round) {
                summary.emit(sink);
            }
            last = summary;
        }

        info!(
            "Simulation finished after {} rounds: chain length {}, forks {}, {} switches, {} flipped blocks",
            self.round,
            last.chain_length,
            last.forks,
            last.total_switches,
            last.total_flipped_blocks
        );
        for peer in &self.peers {
            debug!("{}", peer.describe_chain());
        }
        Ok(last)
    }
}

/// Per-peer RNG seed derived from the experiment seed
pub fn peer_seed(seed: u64, peer: u64) -> u64 {
    seed ^ peer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PeerConfig, Topology};
    use crate::core::TxId;
    use crate::report::TestLog;

    fn config(peers: usize, rounds: u64) -> SimulationConfig {
        SimulationConfig {
            peers,
            rounds,
            seed: 7,
            peer: PeerConfig {
                submit_rate: 50,
                mine_rate: 50,
                ..PeerConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_peers_get_distinct_seeds() {
        assert_eq!(peer_seed(42, 0), 42);
        assert_ne!(peer_seed(42, 1), peer_seed(42, 2));
    }

    #[test]
    fn test_step_advances_round() {
        let mut sim = Simulation::new(config(3, 5)).unwrap();
        let summary = sim.step().unwrap();
        assert_eq!(summary.round, 0);
        assert_eq!(sim.round(), 1);
    }

    #[test]
    fn test_messages_arrive_next_round() {
        let mut cfg = config(3, 2);
        cfg.peer.submit_rate = 100;
        cfg.peer.mine_rate = 0;
        let mut sim = Simulation::new(cfg).unwrap();
        sim.step().unwrap();

        // Each peer queued one transaction from each of its two neighbors
        for peer in sim.peers() {
            assert_eq!(peer.pending_messages(), 2);
            assert_eq!(peer.mempool().len(), 1);
        }
        sim.step().unwrap();
        for peer in sim.peers() {
            assert_eq!(peer.mempool().len(), 4);
        }
    }

    #[test]
    fn test_run_reports_every_round_by_default() {
        let mut sim = Simulation::new(config(4, 6)).unwrap();
        let mut log = TestLog::new();
        let last = sim.run(&mut log).unwrap();

        assert_eq!(last.round, 5);
        assert_eq!(log.tests()[0]["Block Chain Length"].len(), 6);
    }

    #[test]
    fn test_run_reports_only_selected_round() {
        let mut cfg = config(4, 6);
        cfg.report_round = Some(5);
        let mut sim = Simulation::new(cfg).unwrap();
        let mut log = TestLog::new();
        sim.run(&mut log).unwrap();

        assert_eq!(log.tests()[0]["Forks"].len(), 1);
    }

    #[test]
    fn test_ring_network_runs() {
        let mut cfg = config(5, 20);
        cfg.topology = Topology::Ring;
        let mut sim = Simulation::new(cfg).unwrap();
        let mut log = TestLog::new();
        sim.run(&mut log).unwrap();

        for peer in sim.peers() {
            assert!(peer.store().tips_consistent());
            assert!(peer.unlinked().is_empty());
        }
    }

    #[test]
    fn test_ring_gossip_reaches_far_side() {
        let mut cfg = config(6, 4);
        cfg.topology = Topology::Ring;
        cfg.peer.submit_rate = 100;
        cfg.peer.mine_rate = 0;
        let mut sim = Simulation::new(cfg).unwrap();

        // Round 0 submissions take ids 1..=6; the far side of a 6-ring is 3 hops away
        for _ in 0..4 {
            sim.step().unwrap();
        }
        for peer in sim.peers() {
            for id in 1..=6 {
                assert!(
                    peer.mempool().contains(TxId::from(id)),
                    "peer {} lacks tx {id}",
                    peer.get_id()
                );
            }
        }
    }

    #[test]
    fn test_unknown_peer_lookup() {
        let sim = Simulation::new(config(2, 1)).unwrap();
        assert!(sim.peer(PeerId::from(1)).is_ok());
        assert!(matches!(
            sim.peer(PeerId::from(2)),
            Err(SimError::UnknownPeer(_))
        ));
    }
}
