//! # Notary Service

use crate::domain::uniqueness::UniquenessProvider;
use crate::domain::verdict::NotaryVerdict;
use shared_crypto::SigningCapability;
use shared_types::{Party, PartyName, Signature, SignedTransaction, StateRef};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

pub struct NotaryService {
    identity: Party,
    signer: Arc<dyn SigningCapability>,
    uniqueness: UniquenessProvider,
}

impl NotaryService {
    pub fn new(name: PartyName, signer: Arc<dyn SigningCapability>) -> Self {
        let identity = Party::new(name, signer.public_key().into());
        Self {
            identity,
            signer,
            uniqueness: UniquenessProvider::new(),
        }
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    pub fn uniqueness(&self) -> &UniquenessProvider {
        &self.uniqueness
    }

    /// Commit-or-reject one fully signed transaction.
    pub fn notarise(&self, stx: &SignedTransaction) -> NotaryVerdict {
        let id = match stx.id() {
            Ok(id) => id,
            Err(e) => return self.reject(e.to_string()),
        };

        if stx.proposal.notary != self.identity {
            return self.reject(format!(
                "Transaction names notary {}, not {}",
                stx.proposal.notary, self.identity
            ));
        }

        let inputs = &stx.proposal.inputs;
        let distinct: BTreeSet<&StateRef> = inputs.iter().collect();
        if distinct.len() != inputs.len() {
            return self.reject("Transaction references the same input more than once.".into());
        }

        if let Err(e) = stx.verify_required_signatures() {
            return self.reject(e.to_string());
        }

        if let Err(conflict) = self.uniqueness.commit(inputs, id) {
            warn!(
                tx_id = %id.short(),
                conflict = %conflict,
                "[lf-03] Double spend rejected"
            );
            return NotaryVerdict::Conflict(conflict);
        }

        info!(
            tx_id = %id.short(),
            inputs = inputs.len(),
            "[lf-03] Transaction notarised"
        );
        NotaryVerdict::Accepted(Signature::from(self.signer.sign(&id.0)))
    }

    fn reject(&self, reason: String) -> NotaryVerdict {
        warn!(reason = %reason, "[lf-03] Notarisation request rejected");
        NotaryVerdict::Rejected { reason }
    }
}
