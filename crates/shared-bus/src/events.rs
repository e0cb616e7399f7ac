//! # Ledger Events
//!
//! Observational events emitted by flows and vaults. Nothing in the
//! commitment protocol depends on these being delivered; they exist for
//! progress tracking, metrics and tests.

use serde::{Deserialize, Serialize};
use shared_types::{PartyName, TxId};
use uuid::Uuid;

/// Which side of a flow emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowRole {
    Initiator,
    Responder,
}

/// Protocol phases reported as progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressStep {
    // Initiator
    Building,
    Verifying,
    Signing,
    Collecting,
    Notarising,
    Finalising,
    Done,
    // Responder
    AwaitingProposal,
    Checking,
    AwaitingFinality,
    Recorded,
    // Either
    Failed,
}

/// Notary verdict as seen by the submitting flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotaryOutcome {
    Accepted,
    Conflict,
    Rejected,
    Unavailable,
}

impl NotaryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotaryOutcome::Accepted => "accepted",
            NotaryOutcome::Conflict => "conflict",
            NotaryOutcome::Rejected => "rejected",
            NotaryOutcome::Unavailable => "unavailable",
        }
    }
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// An initiator flow was started.
    FlowStarted {
        flow_id: Uuid,
        party: PartyName,
        kind: String,
    },

    /// A flow entered a new phase.
    FlowProgress {
        flow_id: Uuid,
        party: PartyName,
        role: FlowRole,
        step: ProgressStep,
    },

    /// An initiator flow reached DONE.
    FlowCompleted {
        flow_id: Uuid,
        party: PartyName,
        tx_id: TxId,
    },

    /// A flow reached FAILED.
    FlowFailed {
        flow_id: Uuid,
        party: PartyName,
        role: FlowRole,
        reason: String,
    },

    /// A counterparty signature passed verification.
    SignatureCollected {
        flow_id: Uuid,
        party: PartyName,
        from: PartyName,
    },

    /// The notary answered (or failed to answer) one submission attempt.
    NotaryVerdict {
        flow_id: Uuid,
        party: PartyName,
        tx_id: TxId,
        outcome: NotaryOutcome,
        attempt: u32,
    },

    /// A vault appended a new transaction.
    TransactionRecorded { party: PartyName, tx_id: TxId },

    /// Finality reached locally but some participants never acknowledged.
    PartialDelivery {
        flow_id: Uuid,
        party: PartyName,
        tx_id: TxId,
        unconfirmed: Vec<PartyName>,
    },

    /// A queued transaction was re-delivered and acknowledged.
    Redelivered {
        party: PartyName,
        to: PartyName,
        tx_id: TxId,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::FlowStarted { .. }
            | Self::FlowProgress { .. }
            | Self::FlowCompleted { .. }
            | Self::FlowFailed { .. }
            | Self::SignatureCollected { .. } => EventTopic::Flow,
            Self::NotaryVerdict { .. } => EventTopic::Notary,
            Self::TransactionRecorded { .. } => EventTopic::Vault,
            Self::PartialDelivery { .. } | Self::Redelivered { .. } => EventTopic::Delivery,
        }
    }

    /// The party whose node emitted this event.
    #[must_use]
    pub fn party(&self) -> &PartyName {
        match self {
            Self::FlowStarted { party, .. }
            | Self::FlowProgress { party, .. }
            | Self::FlowCompleted { party, .. }
            | Self::FlowFailed { party, .. }
            | Self::SignatureCollected { party, .. }
            | Self::NotaryVerdict { party, .. }
            | Self::TransactionRecorded { party, .. }
            | Self::PartialDelivery { party, .. }
            | Self::Redelivered { party, .. } => party,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Flow lifecycle and progress.
    Flow,
    /// Notary verdicts.
    Notary,
    /// Vault appends.
    Vault,
    /// Finality delivery and re-delivery.
    Delivery,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Emitting parties to include. Empty means every party.
    pub parties: Vec<PartyName>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            parties: Vec::new(),
        }
    }

    /// Restrict to events emitted by `party`.
    #[must_use]
    pub fn for_party(mut self, party: PartyName) -> Self {
        self.parties.push(party);
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let party_match = self.parties.is_empty() || self.parties.contains(event.party());

        topic_match && party_match
    }
}
