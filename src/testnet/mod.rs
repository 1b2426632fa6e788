//! Testnet fixtures
//!
//! Small builders for blocks, stores and peers shared by the unit tests.

pub mod test_utils;

pub use test_utils::*;
