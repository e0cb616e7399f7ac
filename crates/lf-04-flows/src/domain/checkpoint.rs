//! # Flow Checkpoints
//!
//! The initiator's entire resumable state. A checkpoint is written at every
//! phase transition and after every collected signature, so a restarted
//! process can continue from the last suspension boundary using nothing
//! but this record.

use crate::domain::wire::FlowKind;
use serde::{Deserialize, Serialize};
use shared_bus::ProgressStep;
use shared_types::{NotarizedTransaction, PartyName, SignedTransaction, TransactionProposal};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowPhase {
    Building,
    Verifying,
    Signing,
    Collecting,
    Notarising,
    Finalising,
    Done,
    Failed(String),
}

impl FlowPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowPhase::Done | FlowPhase::Failed(_))
    }

    pub fn step(&self) -> ProgressStep {
        match self {
            FlowPhase::Building => ProgressStep::Building,
            FlowPhase::Verifying => ProgressStep::Verifying,
            FlowPhase::Signing => ProgressStep::Signing,
            FlowPhase::Collecting => ProgressStep::Collecting,
            FlowPhase::Notarising => ProgressStep::Notarising,
            FlowPhase::Finalising => ProgressStep::Finalising,
            FlowPhase::Done => ProgressStep::Done,
            FlowPhase::Failed(_) => ProgressStep::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCheckpoint {
    pub flow_id: Uuid,
    pub party: PartyName,
    pub kind: FlowKind,
    pub phase: FlowPhase,
    pub proposal: TransactionProposal,
    /// Present from `Signing` on; accumulates counterparty signatures.
    pub signed: Option<SignedTransaction>,
    /// Present from `Finalising` on.
    pub notarized: Option<NotarizedTransaction>,
    /// Counterparties whose signature is still outstanding.
    pub pending_signers: Vec<PartyName>,
    /// Participants that have not acknowledged the finalized transaction.
    pub unconfirmed: Vec<PartyName>,
}

impl FlowCheckpoint {
    pub fn new(party: PartyName, kind: FlowKind, proposal: TransactionProposal) -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            party,
            kind,
            phase: FlowPhase::Building,
            proposal,
            signed: None,
            notarized: None,
            pending_signers: Vec::new(),
            unconfirmed: Vec::new(),
        }
    }
}
