//! # Outbound Ports
//!
//! Collaborators a flow needs besides sessions, vault, verifier and notary.

use crate::domain::checkpoint::FlowCheckpoint;
use crate::domain::error::FlowResult;
use shared_types::{Party, PartyName, PublicKey};
use uuid::Uuid;

/// Durable home for initiator checkpoints.
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite the checkpoint for `checkpoint.flow_id`.
    fn save(&self, checkpoint: &FlowCheckpoint) -> FlowResult<()>;

    fn load(&self, flow_id: &Uuid) -> FlowResult<Option<FlowCheckpoint>>;

    fn remove(&self, flow_id: &Uuid) -> FlowResult<()>;

    /// Checkpoints of flows that have not reached a terminal phase.
    fn unfinished(&self) -> FlowResult<Vec<FlowCheckpoint>>;
}

/// Resolves names and keys to network identities.
pub trait IdentityService: Send + Sync {
    fn party_from_key(&self, key: &PublicKey) -> Option<Party>;

    fn party_from_name(&self, name: &PartyName) -> Option<Party>;
}
