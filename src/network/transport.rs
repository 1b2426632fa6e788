use crate::core::{Message, PeerId};

/// Outbound side of the host's message delivery
pub trait Transport {
    /// Send `message` to every neighbor; returns how many copies went out
    fn broadcast(&mut self, message: Message) -> usize;
}

/// Messages one peer broadcast during a round, held until the host delivers them.
///
/// Each peer gets its own outbox, so a peer never calls into another peer
/// while it is running its round.
#[derive(Debug, Clone)]
pub struct Outbox {
    from: PeerId,
    fanout: usize,
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new(from: PeerId, fanout: usize) -> Outbox {
        Outbox {
            from,
            fanout,
            messages: Vec::new(),
        }
    }

    pub fn get_from(&self) -> PeerId {
        self.from
    }

    pub fn get_messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Transport for Outbox {
    fn broadcast(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.fanout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Transaction, TxId};

    #[test]
    fn test_outbox_collects_and_reports_fanout() {
        let mut outbox = Outbox::new(PeerId::from(2), 4);
        let sent = outbox.broadcast(Message::Transaction(Transaction::new(TxId::from(1), 0)));
        assert_eq!(sent, 4);
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.get_from(), PeerId::from(2));
        assert!(!outbox.get_messages()[0].is_mined());
    }
}
