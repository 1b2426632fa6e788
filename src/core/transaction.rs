use crate::core::TxId;
use serde::{Deserialize, Serialize};

/// A transaction announced by a peer and waiting to be mined into exactly one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TxId,
    submitted_round: u64,
}

impl Transaction {
    pub fn new(id: TxId, submitted_round: u64) -> Transaction {
        Transaction {
            id,
            submitted_round,
        }
    }

    pub fn get_id(&self) -> TxId {
        self.id
    }

    pub fn get_submitted_round(&self) -> u64 {
        self.submitted_round
    }
}
