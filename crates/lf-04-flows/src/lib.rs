//! # LF-04: Flows
//!
//! One multi-party commit, from proposal to finality, as two explicit
//! state machines.
//!
//! ```text
//!  Initiator                                   Counterparties           Notary
//!  ─────────                                   ──────────────           ──────
//!  Building / Verifying / Signing
//!  Collecting ──── Propose ──────────────────▶ Checking
//!             ◀─── Signed | Reject ─────────── (sign or reject)
//!  Notarising ─────────────────────────────────────────────────────────▶ commit inputs
//!             ◀─────────────────────────────────────────────────────────  Accepted | Conflict
//!  Finalising ──── Finalized ────────────────▶ record
//!             ◀─── FinalityAck ─────────────── Recorded
//!  record locally ─▶ Done
//! ```
//!
//! ## Guarantees
//!
//! - A single rejection, invalid signature or notary conflict aborts the
//!   attempt for every party; no vault records anything.
//! - The initiator records a notarized transaction even when some
//!   participants never acknowledge; those are reported as a partial
//!   delivery and queued for redelivery.
//! - The initiator checkpoints every phase and can resume after a restart.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod collector;
pub mod config;
pub mod domain;
pub mod finality;
pub mod flows;
pub mod hub;
pub mod initiator;
pub mod notarise;
pub mod ports;
pub mod responder;

#[cfg(test)]
mod testkit;

pub use adapters::{InMemoryCheckpointStore, KvCheckpointStore, NetworkMap};
pub use config::FlowConfig;
pub use domain::checkpoint::{FlowCheckpoint, FlowPhase};
pub use domain::error::{FlowError, FlowOutcome, FlowResult, FlowWarning};
pub use domain::wire::{FlowKind, FlowMessage};
pub use finality::{redeliver_pending, RedeliveryQueue};
pub use flows::{CreateGameFlow, DealFlow, RevealCommunityCardFlow, CARDS_PER_PLAYER};
pub use hub::{ServiceHub, ServiceHubBuilder};
pub use initiator::InitiatorFlow;
pub use ports::outbound::{CheckpointStore, IdentityService};
pub use responder::ResponderFlow;
