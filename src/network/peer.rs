// A single mining peer.
// Each round: drain the inbox, maybe submit a transaction, maybe mine a block,
// then recompute the canonical chain and account for any reorg. All state here is
// owned by this peer; only the id generator is shared.

use crate::config::PeerConfig;
use crate::core::{
    Block, BlockId, ChainSelector, ChainStats, ChainSwitch, IdGenerator, Linker, Message,
    MiningPolicy, PeerId, ReorgTracker, SubmissionPolicy, Transaction,
};
use crate::network::{Node, Transport};
use crate::storage::{BlockStore, LinkOutcome, MemoryPool, UnlinkedBuffer};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Running totals a peer keeps for traffic and bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeerCounters {
    /// Message copies sent, i.e. broadcasts times fan-out
    pub messages_sent: u64,
    /// Broadcasts that forwarded somebody else's block or transaction
    pub messages_relayed: u64,
    pub transactions_submitted: u64,
    pub blocks_mined: u64,
    pub blocks_received: u64,
    pub duplicates_ignored: u64,
    pub orphans_expired: u64,
    pub empty_mempool_skips: u64,
}

pub struct Peer<R: Rng = StdRng> {
    id: PeerId,
    ids: Arc<IdGenerator>,
    rng: R,
    inbox: VecDeque<Message>,
    relay: Option<VecDeque<Message>>,
    mempool: MemoryPool,
    store: BlockStore,
    unlinked: UnlinkedBuffer,
    linker: Linker,
    selector: ChainSelector,
    tracker: ReorgTracker,
    submission: SubmissionPolicy,
    mining: MiningPolicy,
    counters: PeerCounters,
}

impl<R: Rng> Peer<R> {
    pub fn new(id: PeerId, config: &PeerConfig, ids: Arc<IdGenerator>, rng: R) -> Peer<R> {
        Peer {
            id,
            ids,
            rng,
            inbox: VecDeque::new(),
            relay: config.relay.then(VecDeque::new),
            mempool: MemoryPool::new(),
            store: BlockStore::new(),
            unlinked: UnlinkedBuffer::new(),
            linker: Linker::new(config.orphan_expiry),
            selector: ChainSelector::new(config.tie_break),
            tracker: ReorgTracker::new(),
            submission: SubmissionPolicy::new(config.submit_rate),
            mining: MiningPolicy::new(config.mine_rate, config.parent_selection),
            counters: PeerCounters::default(),
        }
    }

    /// Process every queued message: transactions go to the mempool, blocks go
    /// through the linker.
    pub fn check_incoming_messages(&mut self, round: u64) {
        while let Some(message) = self.inbox.pop_front() {
            match message {
                Message::Mined(block) => self.receive_block(block, round),
                Message::Transaction(tx) => {
                    // I only pass a transaction on the first time I see it
                    if self.mempool.add(tx) {
                        self.queue_relay(Message::Transaction(tx));
                    } else {
                        self.counters.duplicates_ignored += 1;
                    }
                }
            }
        }
    }

    pub fn receive_block(&mut self, block: Block, round: u64) {
        self.counters.blocks_received += 1;
        let id = block.get_id();
        // A block I already linked or already buffered has been relayed before
        if self.store.contains(id) || self.unlinked.contains(id) {
            debug!("Peer {}: ignoring duplicate block {id}", self.id);
            self.counters.duplicates_ignored += 1;
            return;
        }
        self.queue_relay(Message::Mined(block.clone()));
        self.unlinked.push(block, round);
        self.link_blocks(round);
    }

    fn queue_relay(&mut self, message: Message) {
        if let Some(relay) = self.relay.as_mut() {
            relay.push_back(message);
        }
    }

    /// Forward everything seen for the first time since the last call.
    /// Returns how many messages were forwarded.
    pub fn relay_pending(&mut self, transport: &mut dyn Transport) -> usize {
        let Some(relay) = self.relay.as_mut() else {
            return 0;
        };
        let mut forwarded = 0;
        while let Some(message) = relay.pop_front() {
            let fanout = transport.broadcast(message);
            self.counters.messages_sent += fanout as u64;
            self.counters.messages_relayed += 1;
            forwarded += 1;
        }
        forwarded
    }

    pub fn pending_relays(&self) -> usize {
        self.relay.as_ref().map_or(0, VecDeque::len)
    }

    /// Run the linker to its fixed point and retire the transactions of newly linked blocks
    pub fn link_blocks(&mut self, round: u64) {
        // I let the linker run until nothing else attaches, since one new parent
        // can unlock a whole buffered branch
        let report = self
            .linker
            .link_pending(&mut self.store, &mut self.unlinked, round);

        for id in &report.linked {
            if let Some(block) = self.store.get(*id) {
                self.mempool.mark_mined(block.get_transaction().get_id());
            }
        }
        self.counters.orphans_expired += report.expired.len() as u64;
        debug_assert!(self.store.tips_consistent());
    }

    /// Create a transaction with a fresh id and announce it
    pub fn submit_transaction(&mut self, round: u64, transport: &mut dyn Transport) -> Transaction {
        let tx = Transaction::new(self.ids.next_transaction_id(), round);
        self.mempool.add(tx);
        let fanout = transport.broadcast(Message::Transaction(tx));
        self.counters.messages_sent += fanout as u64;
        self.counters.transactions_submitted += 1;
        debug!("Peer {} submitted transaction {} in round {round}", self.id, tx.get_id());
        tx
    }

    /// Mine one block on the selected parent. Does nothing when the mempool is empty.
    pub fn mine_block(&mut self, round: u64, transport: &mut dyn Transport) -> Option<BlockId> {
        if self.mempool.is_empty() {
            debug!("Peer {}: no transactions to mine in round {round}", self.id);
            self.counters.empty_mempool_skips += 1;
            return None;
        }

        // I pick the parent before taking a transaction, so a failed lookup
        // leaves the mempool untouched
        let canonical = match self.mining.parent_selection() {
            crate::core::ParentSelection::CanonicalTip => self.select_chain(),
            crate::core::ParentSelection::RandomTip => Vec::new(),
        };
        let parent = match self
            .mining
            .select_parent(&mut self.rng, &canonical, self.store.tips())
        {
            Some(parent_id) => match self.store.get(parent_id) {
                Some(parent) => Some(parent.clone()),
                None => {
                    warn!("Peer {}: selected parent {parent_id} is not stored", self.id);
                    return None;
                }
            },
            None => None,
        };

        let tx = self.mempool.take_next()?;
        // No parent candidate at all means my store is empty: I start a new root
        let block = match &parent {
            Some(parent) => Block::new_block(&self.ids, parent, self.id, tx),
            None => Block::generate_genesis_block(&self.ids, self.id, tx),
        };
        let id = block.get_id();

        match self.store.link(block.clone()) {
            LinkOutcome::Linked => {}
            outcome => {
                warn!("Peer {}: freshly mined block {id} not linked: {outcome:?}", self.id);
                return None;
            }
        }

        info!(
            "Peer {} mined block {id} at height {} (parent: {:?}, tx: {})",
            self.id,
            block.get_height(),
            block.get_parent(),
            tx.get_id()
        );
        let fanout = transport.broadcast(Message::Mined(block));
        self.counters.messages_sent += fanout as u64;
        self.counters.blocks_mined += 1;
        Some(id)
    }

    /// Longest chain over the current store, without touching reorg statistics
    pub fn select_chain(&self) -> Vec<BlockId> {
        self.selector
            .select(&self.store, self.store.tips().iter().copied())
    }

    /// Recompute the canonical chain and let the reorg tracker compare it with the last one
    pub fn update_longest_chain(&mut self, round: u64) -> Option<ChainSwitch> {
        let chain = self.select_chain();
        self.tracker.observe(chain, round)
    }

    pub fn longest_chain(&self) -> &[BlockId] {
        self.tracker.current_chain()
    }

    pub fn chain_length(&self) -> usize {
        self.tracker.current_chain().len()
    }

    pub fn stats(&self) -> &ChainStats {
        self.tracker.stats()
    }

    pub fn counters(&self) -> &PeerCounters {
        &self.counters
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn mempool(&self) -> &MemoryPool {
        &self.mempool
    }

    pub fn unlinked(&self) -> &UnlinkedBuffer {
        &self.unlinked
    }

    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    /// `1 -> 2 -> 5` plus the chain length
    pub fn describe_chain(&self) -> String {
        let path = self
            .longest_chain()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        format!(
            "Longest chain for peer {}: {path} (length {})",
            self.id,
            self.chain_length()
        )
    }
}

impl<R: Rng> Node for Peer<R> {
    fn get_id(&self) -> PeerId {
        self.id
    }

    fn on_message(&mut self, message: Message) {
        self.inbox.push_back(message);
    }

    fn perform_computation(&mut self, round: u64, transport: &mut dyn Transport) {
        // First I catch up on everything my neighbors sent last round, and pass
        // on whatever was new to me so it reaches peers further away
        self.check_incoming_messages(round);
        self.relay_pending(transport);

        // Then I roll my two dice: one for announcing a transaction, one for mining.
        // Mining goes second so a transaction I just created can already be mined.
        if self.submission.should_submit(&mut self.rng) {
            self.submit_transaction(round, transport);
        }
        if self.mining.should_mine(&mut self.rng) {
            self.mine_block(round, transport);
        }

        // Finally I recompute my canonical chain; this is where reorgs get counted
        self.update_longest_chain(round);
    }

    fn on_round_end(&mut self, round: u64) {
        debug!(
            "Round {round} end, peer {}: chain {}, tips {}, orphans {}, mempool {}",
            self.id,
            self.chain_length(),
            self.store.tips().len(),
            self.unlinked.len(),
            self.mempool.len()
        );
    }
}

impl<R: Rng> fmt::Display for Peer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer ID: {} | Blocks: {}", self.id, self.chain_length())
    }
}
