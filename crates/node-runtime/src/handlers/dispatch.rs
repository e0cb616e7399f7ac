//! # Responder Dispatch
//!
//! Accepts sessions opened to this party and runs one `ResponderFlow` per
//! session on its own task, so a slow counterparty never blocks the next.

use std::sync::Arc;

use lf_04_flows::{ResponderFlow, ServiceHub};
use shared_bus::SessionInbox;
use tracing::{debug, info, warn};

/// Handler that turns incoming sessions into responder flows.
pub struct ResponderDispatcher {
    hub: Arc<ServiceHub>,
    inbox: SessionInbox,
}

impl ResponderDispatcher {
    pub fn new(hub: Arc<ServiceHub>, inbox: SessionInbox) -> Self {
        Self { hub, inbox }
    }

    /// Run until the inbox closes (the party was deregistered).
    pub async fn run(mut self) {
        info!(party = %self.hub.name(), "[lf-04] Responder dispatch started");

        while let Some(session) = self.inbox.accept().await {
            let hub = Arc::clone(&self.hub);
            let counterparty = session.counterparty().clone();
            tokio::spawn(async move {
                let responder = ResponderFlow::new(hub, session);
                let flow_id = responder.flow_id();
                match responder.run().await {
                    Ok(tx_id) => debug!(
                        %flow_id,
                        tx_id = %tx_id.short(),
                        from = %counterparty,
                        "[lf-04] Responder flow finished"
                    ),
                    Err(e) => warn!(
                        %flow_id,
                        from = %counterparty,
                        error = %e,
                        "[lf-04] Responder flow failed"
                    ),
                }
            });
        }

        info!(party = %self.hub.name(), "[lf-04] Responder inbox closed");
    }
}
