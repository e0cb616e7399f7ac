//! # Node Runtime Library
//!
//! Wires LedgerFlow parties together. The `ledger-node` binary in `main.rs`
//! is a thin demo on top of this library.
//!
//! ## Structure
//!
//! - `container/` - configuration, `LedgerNode`, `LocalNetwork`
//! - `handlers/` - background loops: responder dispatch, redelivery,
//!   metrics recording
//!
//! ## Startup Sequence
//!
//! 1. Load `NodeConfig` from the environment
//! 2. Initialize telemetry (metrics registry, log subscriber)
//! 3. Create the notary, identity directory, session router and event bus
//! 4. Start each party: vault, identity, checkpoints, service hub,
//!    responder dispatch, redelivery
//! 5. Resume checkpointed flows a previous run left unfinished
//! 6. Run flows through `LedgerNode::start_flow`

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;
pub mod handlers;

pub use container::{LedgerNode, LocalNetwork, NodeConfig, NodeError, NodeResult};
pub use handlers::{MetricsRecorder, RedeliveryTask, ResponderDispatcher};
