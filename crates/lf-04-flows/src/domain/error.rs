//! Error types for flows
//!
//! Every fatal outcome leaves no vault of any party updated. The one
//! non-fatal outcome, partial delivery, is a [`FlowWarning`] on a
//! successful [`FlowOutcome`].

use lf_02_vault::VaultError;
use lf_03_notary::NotaryConflict;
use shared_bus::SessionError;
use shared_types::{NotarizedTransaction, PartyName, PublicKey, TxId, TypesError};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A contract or acceptance rule refused the transaction, locally or
    /// at the notary.
    #[error("Verification rejected: {0}")]
    VerificationRejected(String),

    /// A signature failed its cryptographic check.
    #[error("Invalid signature from {party}")]
    SignatureInvalid { party: PartyName },

    /// A counterparty explicitly declined, or never replied in time.
    #[error("{party} rejected the transaction: {reason}")]
    CounterpartyRejected { party: PartyName, reason: String },

    /// The notary reports at least one input already consumed.
    #[error("Double spend: {0}")]
    DoubleSpendConflict(NotaryConflict),

    /// The notary stayed unavailable for every attempt.
    #[error("Notary unavailable after {attempts} attempts")]
    TransientUnavailable { attempts: u32 },

    /// A required signer has no known party.
    #[error("No party known for key {0}")]
    UnknownParty(PublicKey),

    /// An input reference resolves neither locally nor from the supplied
    /// dependencies.
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Codec error: {0}")]
    Codec(#[from] TypesError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// The peer sent something the protocol does not allow here.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Misconfigured: {0}")]
    Misconfigured(String),
}

impl FlowError {
    /// Only notary unavailability is worth trying again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::TransientUnavailable { .. })
    }

    /// The transaction that won the race, for a double spend.
    pub fn consuming_tx_id(&self) -> Option<TxId> {
        match self {
            FlowError::DoubleSpendConflict(conflict) => conflict.consuming_tx_id(),
            _ => None,
        }
    }

    /// Short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::VerificationRejected(_) => "verification_rejected",
            FlowError::SignatureInvalid { .. } => "signature_invalid",
            FlowError::CounterpartyRejected { .. } => "counterparty_rejected",
            FlowError::DoubleSpendConflict(_) => "double_spend",
            FlowError::TransientUnavailable { .. } => "unavailable",
            FlowError::UnknownParty(_) => "unknown_party",
            FlowError::MissingInput(_) => "missing_input",
            FlowError::Session(_) => "session",
            FlowError::Vault(_) => "vault",
            FlowError::Codec(_) => "codec",
            FlowError::Checkpoint(_) => "checkpoint",
            FlowError::Protocol(_) => "protocol",
            FlowError::Misconfigured(_) => "misconfigured",
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

/// Non-fatal conditions attached to a completed flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowWarning {
    /// Finality reached locally; these participants never acknowledged and
    /// are queued for redelivery.
    PartialDelivery { unconfirmed: Vec<PartyName> },
}

/// A flow that reached `Done`.
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub flow_id: Uuid,
    pub transaction: NotarizedTransaction,
    pub warnings: Vec<FlowWarning>,
}

impl FlowOutcome {
    pub fn tx_id(&self) -> FlowResult<TxId> {
        Ok(self.transaction.id()?)
    }

    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}
