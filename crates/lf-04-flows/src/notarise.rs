//! # Notarisation with Retry
//!
//! `Unavailable` (or no verdict within `notary_timeout`) is retried with
//! exponential backoff up to `notary_max_attempts`. `Conflict` and
//! `Rejected` end the attempt immediately. Retrying is safe because the
//! notary commit is idempotent per transaction id.

use crate::domain::error::{FlowError, FlowResult};
use crate::hub::ServiceHub;
use lf_03_notary::NotaryVerdict;
use shared_bus::{LedgerEvent, NotaryOutcome};
use shared_types::{NotarizedTransaction, SignedTransaction};
use tracing::{info, warn};
use uuid::Uuid;

pub async fn notarise_with_retry(
    hub: &ServiceHub,
    flow_id: Uuid,
    stx: &SignedTransaction,
) -> FlowResult<NotarizedTransaction> {
    let tx_id = stx.id()?;
    let config = hub.config();
    let max_attempts = config.notary_max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let verdict = tokio::time::timeout(config.notary_timeout, hub.notary().notarise(stx))
            .await
            .unwrap_or(NotaryVerdict::Unavailable);

        let outcome = match &verdict {
            NotaryVerdict::Accepted(_) => NotaryOutcome::Accepted,
            NotaryVerdict::Conflict(_) => NotaryOutcome::Conflict,
            NotaryVerdict::Rejected { .. } => NotaryOutcome::Rejected,
            NotaryVerdict::Unavailable => NotaryOutcome::Unavailable,
        };
        hub.emit(LedgerEvent::NotaryVerdict {
            flow_id,
            party: hub.name().clone(),
            tx_id,
            outcome,
            attempt,
        })
        .await;

        match verdict {
            NotaryVerdict::Accepted(notary_signature) => {
                let ntx = NotarizedTransaction {
                    signed: stx.clone(),
                    notary_signature,
                };
                if ntx.verify().is_err() {
                    return Err(FlowError::SignatureInvalid {
                        party: hub.notary().notary().name.clone(),
                    });
                }
                info!(flow_id = %flow_id, tx_id = %tx_id.short(), attempt, "[lf-04] Notarised");
                return Ok(ntx);
            }
            NotaryVerdict::Conflict(conflict) => {
                warn!(flow_id = %flow_id, tx_id = %tx_id.short(), %conflict, "[lf-04] Notary conflict");
                return Err(FlowError::DoubleSpendConflict(conflict));
            }
            NotaryVerdict::Rejected { reason } => {
                return Err(FlowError::VerificationRejected(reason));
            }
            NotaryVerdict::Unavailable if attempt < max_attempts => {
                let backoff = config.notary_backoff(attempt);
                warn!(
                    flow_id = %flow_id,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "[lf-04] Notary unavailable, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            NotaryVerdict::Unavailable => {}
        }
    }

    Err(FlowError::TransientUnavailable {
        attempts: max_attempts,
    })
}
