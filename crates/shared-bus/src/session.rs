//! # Flow Sessions
//!
//! Reliable, ordered, bidirectional point-to-point channels between two
//! parties for one protocol run.
//!
//! ```text
//!  Initiator                    SessionRouter                    Counterparty
//!  open(me, them) ─────────────▶ inbox[them] ─── accept() ─────▶ session
//!  session.send(frame) ══════════════════════════════════════▶ receive()
//!  receive()        ◀══════════════════════════════════════════ send(frame)
//!  close() / drop   ──────────────────────────────────────────▶ Err(Closed)
//! ```
//!
//! Frames within one session are strictly ordered. Nothing is guaranteed
//! across sessions. Frames already sent before a close are still delivered.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::PartyName;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Errors from session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No inbox is registered for the party.
    #[error("Unknown party: {0}")]
    UnknownParty(PartyName),

    /// The channel to the counterparty is closed.
    #[error("Session with {0} closed")]
    Closed(PartyName),
}

/// One end of a session.
#[async_trait]
pub trait FlowSession: Send + Sync {
    fn session_id(&self) -> Uuid;

    /// The party at the other end.
    fn counterparty(&self) -> &PartyName;

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), SessionError>;

    /// Suspend until the next frame arrives or the peer closes.
    async fn receive(&mut self) -> Result<Vec<u8>, SessionError>;

    /// Tear the session down. Idempotent.
    fn close(&mut self);
}

/// Opens sessions to named parties.
pub trait SessionTransport: Send + Sync {
    fn open(&self, from: &PartyName, to: &PartyName)
        -> Result<Box<dyn FlowSession>, SessionError>;
}

/// Session over a pair of unbounded tokio channels.
pub struct ChannelSession {
    id: Uuid,
    counterparty: PartyName,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl ChannelSession {
    /// Two connected ends: the first faces `b`, the second faces `a`.
    pub fn pair(a: PartyName, b: PartyName) -> (ChannelSession, ChannelSession) {
        let id = Uuid::new_v4();
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let a_end = ChannelSession {
            id,
            counterparty: b,
            outbound: Some(a_tx),
            inbound: b_rx,
        };
        let b_end = ChannelSession {
            id,
            counterparty: a,
            outbound: Some(b_tx),
            inbound: a_rx,
        };
        (a_end, b_end)
    }
}

#[async_trait]
impl FlowSession for ChannelSession {
    fn session_id(&self) -> Uuid {
        self.id
    }

    fn counterparty(&self) -> &PartyName {
        &self.counterparty
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), SessionError> {
        let closed = || SessionError::Closed(self.counterparty.clone());
        let outbound = self.outbound.as_ref().ok_or_else(closed)?;
        trace!(session = %self.id, to = %self.counterparty, bytes = payload.len(), "Frame sent");
        outbound.send(payload).map_err(|_| closed())
    }

    async fn receive(&mut self) -> Result<Vec<u8>, SessionError> {
        self.inbound
            .recv()
            .await
            .ok_or_else(|| SessionError::Closed(self.counterparty.clone()))
    }

    fn close(&mut self) {
        if self.outbound.take().is_some() {
            debug!(session = %self.id, counterparty = %self.counterparty, "Session closed");
        }
        self.inbound.close();
    }
}

impl Drop for ChannelSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Incoming sessions for one party.
pub struct SessionInbox {
    party: PartyName,
    receiver: mpsc::UnboundedReceiver<Box<dyn FlowSession>>,
}

impl SessionInbox {
    pub fn party(&self) -> &PartyName {
        &self.party
    }

    /// Wait for the next session opened towards this party.
    pub async fn accept(&mut self) -> Option<Box<dyn FlowSession>> {
        self.receiver.recv().await
    }

    pub fn try_accept(&mut self) -> Option<Box<dyn FlowSession>> {
        self.receiver.try_recv().ok()
    }
}

/// In-process directory of party inboxes.
#[derive(Default)]
pub struct SessionRouter {
    inboxes: RwLock<HashMap<PartyName, mpsc::UnboundedSender<Box<dyn FlowSession>>>>,
    sessions_opened: AtomicU64,
}

impl SessionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the inbox for `party`.
    pub fn register(&self, party: PartyName) -> SessionInbox {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inboxes.write().insert(party.clone(), sender);
        debug!(party = %party, "Session inbox registered");
        SessionInbox { party, receiver }
    }

    /// Stop routing sessions to `party`.
    pub fn deregister(&self, party: &PartyName) {
        self.inboxes.write().remove(party);
    }

    pub fn is_registered(&self, party: &PartyName) -> bool {
        self.inboxes.read().contains_key(party)
    }

    /// Total sessions successfully opened through this router.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions_opened.load(Ordering::Relaxed)
    }
}

impl SessionTransport for SessionRouter {
    fn open(
        &self,
        from: &PartyName,
        to: &PartyName,
    ) -> Result<Box<dyn FlowSession>, SessionError> {
        let inbox = self
            .inboxes
            .read()
            .get(to)
            .cloned()
            .ok_or_else(|| SessionError::UnknownParty(to.clone()))?;

        let (local, remote) = ChannelSession::pair(from.clone(), to.clone());
        if inbox.send(Box::new(remote)).is_err() {
            self.inboxes.write().remove(to);
            return Err(SessionError::UnknownParty(to.clone()));
        }

        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        debug!(session = %local.id, from = %from, to = %to, "Session opened");
        Ok(Box::new(local))
    }
}
