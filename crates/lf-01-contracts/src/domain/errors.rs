//! # Verification Errors

use crate::domain::constraints::StructuralConstraint;
use shared_types::{ContractId, PartyName};
use thiserror::Error;

/// Why a transaction was rejected by contract verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// The transaction carries no states at all.
    #[error("Transaction has no states to verify.")]
    NoStates,

    /// Rule 1: not exactly one command for the contract.
    #[error("No single matching command for {contract} (found {found}).")]
    NoSingleMatchingCommand { contract: ContractId, found: usize },

    /// Rule 2: a named structural predicate does not hold.
    #[error("{0}")]
    Constraint(StructuralConstraint),

    /// Rule 3: a domain invariant over the payloads does not hold.
    #[error("{reason}")]
    DomainInvariant {
        contract: ContractId,
        reason: String,
    },

    /// Rule 4: an output participant is missing from the command signers.
    #[error("All of the participants must be signers.")]
    ParticipantsMustSign { missing: Vec<PartyName> },
}

impl VerificationError {
    pub(crate) fn invariant(contract: ContractId, reason: impl Into<String>) -> Self {
        VerificationError::DomainInvariant {
            contract,
            reason: reason.into(),
        }
    }

    /// The violated structural predicate, if that is why verification failed.
    pub fn constraint(&self) -> Option<StructuralConstraint> {
        match self {
            VerificationError::Constraint(c) => Some(*c),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type VerifyResult = Result<(), VerificationError>;
