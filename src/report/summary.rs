// Round-end statistics over the whole network.

use crate::network::Peer;
use crate::report::StatsSink;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

pub const CHAIN_LENGTH_KEY: &str = "Block Chain Length";
pub const FORKS_KEY: &str = "Forks";
pub const TOTAL_SWITCHES_KEY: &str = "Network Total Switches";
pub const TOTAL_FLIPPED_KEY: &str = "Network Total Flipped Blocks";
pub const FREQUENCY_KEY: &str = "Frequency";
pub const MESSAGES_SENT_KEY: &str = "Messages Sent";
pub const ORPHANS_EXPIRED_KEY: &str = "Orphans Expired";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub round: u64,
    /// Longest canonical chain held by any peer
    pub chain_length: usize,
    /// Sum of every peer's chain length minus the longest one
    pub forks: usize,
    pub total_switches: u64,
    pub total_flipped_blocks: u64,
    pub flip_frequency: BTreeMap<usize, u64>,
    pub messages_sent: u64,
    pub orphans_expired: u64,
}

impl NetworkSummary {
    pub fn collect<R: Rng>(round: u64, peers: &[Peer<R>]) -> NetworkSummary {
        let mut summary = NetworkSummary {
            round,
            ..NetworkSummary::default()
        };
        let mut total_chain_blocks = 0;

        for peer in peers {
            let stats = peer.stats();
            let length = peer.chain_length();
            total_chain_blocks += length;
            summary.chain_length = summary.chain_length.max(length);
            summary.total_switches += stats.total_switches;
            summary.total_flipped_blocks += stats.total_flipped_blocks;
            for (flipped, count) in &stats.flip_frequency {
                *summary.flip_frequency.entry(*flipped).or_insert(0) += count;
            }
            summary.messages_sent += peer.counters().messages_sent;
            summary.orphans_expired += peer.counters().orphans_expired;
        }

        summary.forks = total_chain_blocks - summary.chain_length;
        summary
    }

    pub fn frequency_summary(&self) -> String {
        frequency_summary(&self.flip_frequency)
    }

    pub fn emit(&self, sink: &mut dyn StatsSink) {
        sink.record(CHAIN_LENGTH_KEY, json!(self.chain_length));
        sink.record(FORKS_KEY, json!(self.forks));
        sink.record(TOTAL_SWITCHES_KEY, json!(self.total_switches));
        sink.record(TOTAL_FLIPPED_KEY, json!(self.total_flipped_blocks));
        sink.record(FREQUENCY_KEY, json!(self.frequency_summary()));
        sink.record(MESSAGES_SENT_KEY, json!(self.messages_sent));
        sink.record(ORPHANS_EXPIRED_KEY, json!(self.orphans_expired));
    }
}

/// `1 block flipped: 17, 2 blocks flipped: 7`, smallest flip count first
pub fn frequency_summary(frequency: &BTreeMap<usize, u64>) -> String {
    frequency
        .iter()
        .map(|(flipped, count)| {
            let noun = if *flipped == 1 { "block" } else { "blocks" };
            format!("{flipped} {noun} flipped: {count}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
