//! # Outbound Ports
//!
//! How a flow reaches a notary. The transport is opaque; implementations
//! must keep `Unavailable` retries safe, which the idempotent commit
//! provides.

use crate::domain::verdict::NotaryVerdict;
use async_trait::async_trait;
use shared_types::{Party, SignedTransaction};

#[async_trait]
pub trait NotaryClient: Send + Sync {
    /// Identity of the notary this client talks to.
    fn notary(&self) -> &Party;

    async fn notarise(&self, stx: &SignedTransaction) -> NotaryVerdict;
}
