//! # Finality Distributor
//!
//! Deliver a notarized transaction to every participant, wait for each to
//! acknowledge persistence, then persist locally. Local persistence happens
//! whatever the acknowledgements say: the fact is already notarized.
//! Silent participants become a partial-delivery warning and an entry in
//! the [`RedeliveryQueue`].

use crate::domain::error::FlowResult;
use crate::domain::wire::FlowMessage;
use crate::hub::ServiceHub;
use lf_02_vault::RecordOutcome;
use parking_lot::Mutex;
use shared_bus::{FlowSession, LedgerEvent};
use shared_types::{NotarizedTransaction, PartyName, TxId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Participants still owed a finalized transaction.
#[derive(Debug, Default)]
pub struct RedeliveryQueue {
    pending: Mutex<BTreeMap<TxId, BTreeSet<PartyName>>>,
}

impl RedeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, tx_id: TxId, parties: impl IntoIterator<Item = PartyName>) {
        let mut pending = self.pending.lock();
        let entry = pending.entry(tx_id).or_default();
        entry.extend(parties);
        if entry.is_empty() {
            pending.remove(&tx_id);
        }
    }

    pub fn confirm(&self, tx_id: &TxId, party: &PartyName) {
        let mut pending = self.pending.lock();
        if let Some(parties) = pending.get_mut(tx_id) {
            parties.remove(party);
            if parties.is_empty() {
                pending.remove(tx_id);
            }
        }
    }

    pub fn pending(&self) -> Vec<(TxId, Vec<PartyName>)> {
        self.pending
            .lock()
            .iter()
            .map(|(id, parties)| (*id, parties.iter().cloned().collect()))
            .collect()
    }

    /// Outstanding (transaction, party) deliveries.
    pub fn len(&self) -> usize {
        self.pending.lock().values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

/// Deliver, persist locally, and report who never acknowledged.
///
/// `sessions` are reused for recipients they already connect to; every
/// other recipient gets a fresh session.
pub async fn finalise(
    hub: &ServiceHub,
    flow_id: Uuid,
    ntx: &NotarizedTransaction,
    sessions: Vec<Box<dyn FlowSession>>,
    recipients: &[PartyName],
) -> FlowResult<Vec<PartyName>> {
    let tx_id = ntx.id()?;
    let unconfirmed = distribute(hub, ntx, sessions, recipients).await?;

    record_locally(hub, ntx).await?;

    if unconfirmed.is_empty() {
        info!(flow_id = %flow_id, tx_id = %tx_id.short(), "[lf-04] Finality reached");
    } else {
        warn!(
            flow_id = %flow_id,
            tx_id = %tx_id.short(),
            unconfirmed = ?unconfirmed,
            "[lf-04] Partial delivery, queued for redelivery"
        );
        hub.redelivery().enqueue(tx_id, unconfirmed.iter().cloned());
        hub.emit(LedgerEvent::PartialDelivery {
            flow_id,
            party: hub.name().clone(),
            tx_id,
            unconfirmed: unconfirmed.clone(),
        })
        .await;
    }
    Ok(unconfirmed)
}

/// Retry every queued delivery over fresh sessions. Returns how many were
/// acknowledged.
pub async fn redeliver_pending(hub: &ServiceHub) -> FlowResult<usize> {
    let mut delivered = 0;
    for (tx_id, parties) in hub.redelivery().pending() {
        let Some(ntx) = hub.vault().transaction(&tx_id) else {
            warn!(tx_id = %tx_id.short(), "[lf-04] Queued transaction missing from vault");
            continue;
        };
        let unconfirmed = distribute(hub, &ntx, Vec::new(), &parties).await?;
        for party in parties.iter().filter(|p| !unconfirmed.contains(p)) {
            hub.redelivery().confirm(&tx_id, party);
            delivered += 1;
            hub.emit(LedgerEvent::Redelivered {
                party: hub.name().clone(),
                to: party.clone(),
                tx_id,
            })
            .await;
        }
    }
    Ok(delivered)
}

/// Append to this party's vault and announce it. Idempotent.
pub(crate) async fn record_locally(
    hub: &ServiceHub,
    ntx: &NotarizedTransaction,
) -> FlowResult<RecordOutcome> {
    let outcome = hub.vault().record(ntx)?;
    if let RecordOutcome::Recorded { .. } = outcome {
        hub.emit(LedgerEvent::TransactionRecorded {
            party: hub.name().clone(),
            tx_id: ntx.id()?,
        })
        .await;
    }
    Ok(outcome)
}

async fn distribute(
    hub: &ServiceHub,
    ntx: &NotarizedTransaction,
    sessions: Vec<Box<dyn FlowSession>>,
    recipients: &[PartyName],
) -> FlowResult<Vec<PartyName>> {
    let tx_id = ntx.id()?;
    let frame = FlowMessage::Finalized(ntx.clone()).to_bytes()?;
    let ack_timeout = hub.config().finality_timeout;

    let mut open: HashMap<PartyName, Box<dyn FlowSession>> = sessions
        .into_iter()
        .map(|s| (s.counterparty().clone(), s))
        .collect();

    let mut tasks = JoinSet::new();
    for recipient in recipients {
        let session = match open.remove(recipient) {
            Some(session) => session,
            None => match hub.open_session(recipient) {
                Ok(session) => session,
                Err(e) => {
                    debug!(to = %recipient, error = %e, "[lf-04] Cannot reach participant");
                    continue;
                }
            },
        };
        let frame = frame.clone();
        let recipient = recipient.clone();
        tasks.spawn(async move {
            let mut session = session;
            let acked = deliver(session.as_mut(), frame, tx_id, ack_timeout).await;
            session.close();
            (recipient, acked)
        });
    }

    let mut acked = BTreeSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((recipient, Ok(()))) => {
                acked.insert(recipient);
            }
            Ok((recipient, Err(reason))) => {
                debug!(to = %recipient, %reason, "[lf-04] No finality acknowledgement");
            }
            Err(e) => warn!(error = %e, "[lf-04] Delivery task failed"),
        }
    }

    let unconfirmed: BTreeSet<PartyName> = recipients
        .iter()
        .filter(|r| !acked.contains(*r))
        .cloned()
        .collect();
    Ok(unconfirmed.into_iter().collect())
}

async fn deliver(
    session: &mut dyn FlowSession,
    frame: Vec<u8>,
    tx_id: TxId,
    ack_timeout: Duration,
) -> Result<(), String> {
    session.send(frame).await.map_err(|e| e.to_string())?;
    let bytes = tokio::time::timeout(ack_timeout, session.receive())
        .await
        .map_err(|_| format!("no acknowledgement within {ack_timeout:?}"))?
        .map_err(|e| e.to_string())?;
    match FlowMessage::from_bytes(&bytes).map_err(|e| e.to_string())? {
        FlowMessage::FinalityAck { tx_id: acked } if acked == tx_id => Ok(()),
        FlowMessage::FinalityAck { tx_id: acked } => {
            Err(format!("acknowledged {} instead", acked.short()))
        }
        other => Err(format!("expected FinalityAck, got {}", other.name())),
    }
}
