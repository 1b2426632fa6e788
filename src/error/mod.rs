//! Error handling for the simulator
//!
//! The peer core never fails a round: orphans, empty mempools and duplicates are
//! handled locally. These errors cover everything around it (configuration,
//! topology and report I/O).

use crate::core::PeerId;
use std::fmt;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Error types for configuration, hosting and reporting
#[derive(Debug, Clone)]
pub enum SimError {
    /// Invalid or unreadable configuration
    Config(String),
    /// File I/O errors
    Io(String),
    /// TOML/JSON/CSV encoding errors
    Serialization(String),
    /// Malformed statistics or report input
    Report(String),
    /// A peer id the host does not know about
    UnknownPeer(PeerId),
    /// Topology that cannot be built for the requested peer count
    InvalidTopology(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "Configuration error: {msg}"),
            SimError::Io(msg) => write!(f, "I/O error: {msg}"),
            SimError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            SimError::Report(msg) => write!(f, "Report error: {msg}"),
            SimError::UnknownPeer(id) => write!(f, "Unknown peer: {id}"),
            SimError::InvalidTopology(msg) => write!(f, "Invalid topology: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SimError {
    fn from(err: toml::ser::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SimError {
    fn from(err: csv::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}
