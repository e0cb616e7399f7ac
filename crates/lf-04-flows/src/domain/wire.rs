//! # Wire Messages
//!
//! Frames exchanged over a flow session, bincode-encoded.
//!
//! ```text
//! Initiator                               Counterparty
//!   Propose { kind, stx, dependencies } ──▶
//!                                        ◀── Signed { key, signature } | Reject { reason }
//!   Finalized(ntx)                      ──▶
//!                                        ◀── FinalityAck { tx_id }
//! ```
//!
//! A session whose first frame is `Finalized` is an observer delivery.

use crate::domain::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use shared_types::{
    decode, encode, CardCommand, CommandKind, GameCommand, NotarizedTransaction, PublicKey,
    Signature, SignedTransaction, TxId,
};
use std::fmt;

/// Which business flow a proposal belongs to. Counterparties select their
/// acceptance policy from the commands a transaction carries, never from
/// the label in `Propose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlowKind {
    CreateGame,
    Deal,
    RevealCommunityCard,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::CreateGame => "create-game",
            FlowKind::Deal => "deal",
            FlowKind::RevealCommunityCard => "reveal-community-card",
        }
    }

    /// The flow that issues `command`.
    pub fn of_command(command: &CommandKind) -> Self {
        match command {
            CommandKind::Card(CardCommand::Create) => FlowKind::Deal,
            CommandKind::Game(GameCommand::Create) => FlowKind::CreateGame,
            CommandKind::Game(GameCommand::RevealCommunityCard { .. }) => {
                FlowKind::RevealCommunityCard
            }
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowMessage {
    /// A partially signed transaction plus the notarized transactions that
    /// produced its inputs.
    Propose {
        kind: FlowKind,
        stx: SignedTransaction,
        dependencies: Vec<NotarizedTransaction>,
    },
    Signed {
        key: PublicKey,
        signature: Signature,
    },
    Reject {
        reason: String,
    },
    Finalized(NotarizedTransaction),
    FinalityAck {
        tx_id: TxId,
    },
}

impl FlowMessage {
    pub fn name(&self) -> &'static str {
        match self {
            FlowMessage::Propose { .. } => "Propose",
            FlowMessage::Signed { .. } => "Signed",
            FlowMessage::Reject { .. } => "Reject",
            FlowMessage::Finalized(_) => "Finalized",
            FlowMessage::FinalityAck { .. } => "FinalityAck",
        }
    }

    pub fn to_bytes(&self) -> FlowResult<Vec<u8>> {
        Ok(encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> FlowResult<Self> {
        decode(bytes).map_err(FlowError::from)
    }
}
