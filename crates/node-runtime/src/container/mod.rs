//! # Node Container
//!
//! Configuration, single-party nodes and the in-process network that hosts
//! them.

pub mod config;
pub mod network;
pub mod node;

pub use config::NodeConfig;
pub use network::LocalNetwork;
pub use node::{LedgerNode, NodeError, NodeResult};
