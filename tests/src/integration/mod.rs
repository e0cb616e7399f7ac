//! # Cross-Crate Scenarios
//!
//! Every scenario runs a real in-process network: notary, session router,
//! identity directory, event bus and one responder dispatch loop per party.

#[cfg(test)]
mod harness;

pub mod commit;
pub mod delivery;
pub mod double_spend;
pub mod notary_retry;
pub mod recovery;
pub mod rejection;
