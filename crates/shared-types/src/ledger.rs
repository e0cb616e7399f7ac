//! # Ledger States and References
//!
//! A [`LedgerState`] exists only as an output of some transaction and is
//! addressed by its [`StateRef`]. The payload is a tagged union over the
//! contract families this ledger understands.

use crate::identity::Party;
use crate::states::{CardState, GameState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA-256 transaction id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.short())
    }
}

/// Pointer to output `index` of transaction `txhash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    pub txhash: TxId,
    pub index: u32,
}

impl StateRef {
    pub fn new(txhash: TxId, index: u32) -> Self {
        Self { txhash, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash.short(), self.index)
    }
}

/// Contract family owning a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractId {
    Card,
    Game,
}

impl ContractId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractId::Card => "lf.contracts.CardContract",
            ContractId::Game => "lf.contracts.GameContract",
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain payload of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatePayload {
    Card(CardState),
    Game(GameState),
}

/// Immutable fact on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub contract: ContractId,
    pub payload: StatePayload,
}

impl LedgerState {
    pub fn card(state: CardState) -> Self {
        Self {
            contract: ContractId::Card,
            payload: StatePayload::Card(state),
        }
    }

    pub fn game(state: GameState) -> Self {
        Self {
            contract: ContractId::Game,
            payload: StatePayload::Game(state),
        }
    }

    /// Parties entitled to see and act on this state.
    pub fn participants(&self) -> Vec<Party> {
        match &self.payload {
            StatePayload::Card(card) => card.participants(),
            StatePayload::Game(game) => game.participants(),
        }
    }

    pub fn as_card(&self) -> Option<&CardState> {
        match &self.payload {
            StatePayload::Card(card) => Some(card),
            StatePayload::Game(_) => None,
        }
    }

    pub fn as_game(&self) -> Option<&GameState> {
        match &self.payload {
            StatePayload::Game(game) => Some(game),
            StatePayload::Card(_) => None,
        }
    }
}

/// A state together with the reference it lives at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub state: LedgerState,
    pub reference: StateRef,
}
