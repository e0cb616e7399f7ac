//! # Signature Collector
//!
//! Fan the proposal out to every counterparty at once, fan the replies in
//! behind a join barrier.
//!
//! ```text
//!            ┌── task(session A) ── Propose ─▶ ... ◀─ Signed ──┐
//! stx ──────►├── task(session B) ── Propose ─▶ ... ◀─ Signed ──┼──► fully signed stx
//!            └── task(session C) ── Propose ─▶ ... ◀─ Reject ──┘      or first rejection
//! ```
//!
//! Every returned signature is checked against the counterparty's owning
//! key and the exact canonical proposal bytes before it is attached. The
//! first failure aborts the outstanding tasks and closes every session, so
//! waiting counterparties observe the close and persist nothing.

use crate::domain::error::{FlowError, FlowResult};
use crate::domain::wire::{FlowKind, FlowMessage};
use crate::hub::ServiceHub;
use shared_bus::{FlowSession, LedgerEvent, SessionError};
use shared_types::{NotarizedTransaction, Party, PublicKey, Signature, SignedTransaction};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// A counterparty and the session opened to it.
pub struct Counterparty {
    pub party: Party,
    pub session: Box<dyn FlowSession>,
}

/// Result of a successful collection. The sessions stay open for finality.
pub struct Collected {
    pub stx: SignedTransaction,
    pub sessions: Vec<Box<dyn FlowSession>>,
}

type Reply = (Party, Box<dyn FlowSession>, FlowResult<(PublicKey, Signature)>);

/// Collect one signature from each counterparty.
///
/// `on_signature` runs after every accepted signature, with the
/// transaction as signed so far; an error from it aborts the collection.
pub async fn collect_signatures<F>(
    hub: &ServiceHub,
    flow_id: Uuid,
    kind: FlowKind,
    mut stx: SignedTransaction,
    dependencies: Vec<NotarizedTransaction>,
    counterparties: Vec<Counterparty>,
    mut on_signature: F,
) -> FlowResult<Collected>
where
    F: FnMut(&Party, &SignedTransaction) -> FlowResult<()>,
{
    let bytes = stx.proposal.canonical_bytes()?;
    let frame = FlowMessage::Propose {
        kind,
        stx: stx.clone(),
        dependencies,
    }
    .to_bytes()?;
    let reply_timeout = hub.config().session_timeout;

    let mut tasks: JoinSet<Reply> = JoinSet::new();
    for Counterparty { party, mut session } in counterparties {
        let frame = frame.clone();
        tasks.spawn(async move {
            let reply = request_signature(session.as_mut(), frame, reply_timeout).await;
            (party, session, reply)
        });
    }

    let mut sessions = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (party, session, reply) = match joined {
            Ok(reply) => reply,
            Err(e) => {
                abort(&mut tasks, &mut sessions);
                return Err(FlowError::Protocol(format!("signature task failed: {e}")));
            }
        };

        let accepted = reply
            .and_then(|(key, signature)| check_signature(&party, &bytes, key, &signature))
            .and_then(|signature| {
                stx.add_signature(party.owning_key, signature);
                on_signature(&party, &stx)
            });

        match accepted {
            Ok(()) => {
                debug!(
                    flow_id = %flow_id,
                    from = %party.name,
                    "[lf-04] Signature accepted"
                );
                sessions.push(session);
                hub.emit(LedgerEvent::SignatureCollected {
                    flow_id,
                    party: hub.name().clone(),
                    from: party.name.clone(),
                })
                .await;
            }
            Err(err) => {
                warn!(
                    flow_id = %flow_id,
                    from = %party.name,
                    error = %err,
                    outstanding = tasks.len(),
                    "[lf-04] Signature collection aborted"
                );
                drop(session);
                abort(&mut tasks, &mut sessions);
                return Err(err);
            }
        }
    }

    Ok(Collected { stx, sessions })
}

async fn request_signature(
    session: &mut dyn FlowSession,
    frame: Vec<u8>,
    reply_timeout: Duration,
) -> FlowResult<(PublicKey, Signature)> {
    let party = session.counterparty().clone();
    session.send(frame).await?;

    let bytes = match tokio::time::timeout(reply_timeout, session.receive()).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(SessionError::Closed(_))) => {
            return Err(FlowError::CounterpartyRejected {
                party,
                reason: "session closed before replying".into(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(FlowError::CounterpartyRejected {
                party,
                reason: format!("no reply within {reply_timeout:?}"),
            })
        }
    };

    match FlowMessage::from_bytes(&bytes)? {
        FlowMessage::Signed { key, signature } => Ok((key, signature)),
        FlowMessage::Reject { reason } => Err(FlowError::CounterpartyRejected { party, reason }),
        other => Err(FlowError::Protocol(format!(
            "expected Signed or Reject from {party}, got {}",
            other.name()
        ))),
    }
}

/// A signature counts only under the counterparty's own key and over the
/// exact proposal bytes.
fn check_signature(
    party: &Party,
    bytes: &[u8],
    key: PublicKey,
    signature: &Signature,
) -> FlowResult<Signature> {
    if key != party.owning_key || !key.verify(bytes, signature) {
        return Err(FlowError::SignatureInvalid {
            party: party.name.clone(),
        });
    }
    Ok(*signature)
}

fn abort(tasks: &mut JoinSet<Reply>, sessions: &mut Vec<Box<dyn FlowSession>>) {
    tasks.abort_all();
    for session in sessions.iter_mut() {
        session.close();
    }
    sessions.clear();
}
