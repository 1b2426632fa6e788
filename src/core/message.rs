use crate::core::{Block, Transaction};

/// What peers broadcast to their neighbors: a fresh transaction, or a block
/// somebody just mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Transaction(Transaction),
    Mined(Block),
}

impl Message {
    /// The `mined` discriminator: true for block announcements
    pub fn is_mined(&self) -> bool {
        matches!(self, Message::Mined(_))
    }

    pub fn get_block(&self) -> Option<&Block> {
        match self {
            Message::Mined(block) => Some(block),
            Message::Transaction(_) => None,
        }
    }

    pub fn get_transaction(&self) -> &Transaction {
        match self {
            Message::Mined(block) => block.get_transaction(),
            Message::Transaction(tx) => tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlockId, PeerId, TxId};

    #[test]
    fn test_discriminator_and_payload() {
        let tx = Transaction::new(TxId::from(4), 2);
        let block = Block::from_parts(BlockId::from(1), None, PeerId::from(0), tx, 1);

        let announced = Message::Transaction(tx);
        let mined = Message::Mined(block.clone());

        assert!(!announced.is_mined());
        assert!(announced.get_block().is_none());
        assert!(mined.is_mined());
        assert_eq!(mined.get_block(), Some(&block));
        assert_eq!(mined.get_transaction(), announced.get_transaction());
    }
}
