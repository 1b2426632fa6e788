use crate::config::Topology;
use crate::core::{Message, PeerId};
use crate::error::{Result, SimError};
use crate::network::Transport;

/// What the host can ask of a peer. This is the only dispatch boundary between
/// the round scheduler and a peer's state machine.
pub trait Node {
    fn get_id(&self) -> PeerId;

    /// Queue an inbound message; it is processed at the start of the next round
    fn on_message(&mut self, message: Message);

    /// Run one full round to completion
    fn perform_computation(&mut self, round: u64, transport: &mut dyn Transport);

    fn on_round_end(&mut self, round: u64);
}

/// Neighbor lists for peers `0..n`, indexed by peer id
#[derive(Debug, Clone)]
pub struct Nodes {
    neighbors: Vec<Vec<PeerId>>,
}

impl Nodes {
    pub fn new(peer_count: usize, topology: Topology) -> Result<Nodes> {
        if peer_count == 0 {
            return Err(SimError::InvalidTopology(
                "a network needs at least one peer".to_string(),
            ));
        }

        let neighbors = (0..peer_count)
            .map(|i| match topology {
                Topology::Complete => (0..peer_count)
                    .filter(|j| *j != i)
                    .map(|j| PeerId::from(j as u64))
                    .collect(),
                Topology::Ring => {
                    let mut around = Vec::new();
                    if peer_count > 1 {
                        around.push((i + peer_count - 1) % peer_count);
                        around.push((i + 1) % peer_count);
                    }
                    around.sort_unstable();
                    around.dedup();
                    around.retain(|j| *j != i);
                    around.into_iter().map(|j| PeerId::from(j as u64)).collect()
                }
            })
            .collect();

        Nodes::from_lists(neighbors)
    }

    /// Explicit neighbor lists; every listed neighbor must be a known peer
    pub fn from_lists(neighbors: Vec<Vec<PeerId>>) -> Result<Nodes> {
        let count = neighbors.len() as u64;
        for (i, list) in neighbors.iter().enumerate() {
            if let Some(bad) = list.iter().find(|p| p.value() >= count) {
                return Err(SimError::InvalidTopology(format!(
                    "peer {i} lists unknown neighbor {bad}"
                )));
            }
        }
        Ok(Nodes { neighbors })
    }

    pub fn neighbors_of(&self, peer: PeerId) -> Result<&[PeerId]> {
        self.neighbors
            .get(peer.value() as usize)
            .map(Vec::as_slice)
            .ok_or(SimError::UnknownPeer(peer))
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
