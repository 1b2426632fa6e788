//! Peer-side networking
//!
//! The peer state machine, the capability trait the host drives it through,
//! the outbound transport, and the neighbor lists that decide where broadcasts go.

pub mod node;
pub mod peer;
pub mod transport;

pub use node::{Node, Nodes};
pub use peer::{Peer, PeerCounters};
pub use transport::{Outbox, Transport};
