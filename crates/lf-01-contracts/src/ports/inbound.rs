//! # Inbound Ports
//!
//! The verification capability flows and notaries call into.

use crate::domain::errors::VerifyResult;
use shared_types::LedgerTransaction;

/// Pluggable contract verification.
///
/// Implementations must be pure and deterministic: the same transaction
/// yields the same verdict on every party.
pub trait ContractVerifier: Send + Sync {
    fn verify(&self, tx: &LedgerTransaction) -> VerifyResult;
}
