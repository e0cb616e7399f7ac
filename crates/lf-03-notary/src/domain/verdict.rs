//! # Notary Verdicts

use serde::{Deserialize, Serialize};
use shared_types::{Signature, StateRef, TxId};
use std::collections::BTreeMap;
use std::fmt;

/// Inputs that were already consumed, with the transaction that consumed each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotaryConflict {
    pub consumed: BTreeMap<StateRef, TxId>,
}

impl NotaryConflict {
    /// The consuming transaction of the first conflicting input.
    pub fn consuming_tx_id(&self) -> Option<TxId> {
        self.consumed.values().next().copied()
    }
}

impl fmt::Display for NotaryConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self
            .consumed
            .iter()
            .map(|(input, by)| format!("{input} consumed by {}", by.short()))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Outcome of one notarisation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotaryVerdict {
    /// Inputs are now consumed by this transaction; signature over its id.
    Accepted(Signature),
    /// At least one input was already consumed. Fatal for this attempt.
    Conflict(NotaryConflict),
    /// The request itself is unacceptable. Fatal, never retried.
    Rejected { reason: String },
    /// Transient failure; safe to retry.
    Unavailable,
}
