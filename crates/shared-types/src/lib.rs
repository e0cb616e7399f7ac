//! # Shared Types Crate
//!
//! The ledger data model every LedgerFlow crate speaks.
//!
//! ## Design Principles
//!
//! - **Content addressing**: a transaction id is the SHA-256 of the proposal's
//!   canonical encoding; a state is addressed by `(tx id, output index)`.
//! - **Immutability**: states are never mutated. "Consumed" is a property of
//!   a [`StateRef`] recorded by the notary, never of the state itself.
//! - **Deterministic encoding**: only ordered collections appear in signed
//!   structures so every party derives identical canonical bytes.
//!
//! ```text
//! TransactionProposal ──sign──▶ SignedTransaction ──notarise──▶ NotarizedTransaction
//!   inputs: [StateRef]            + {key → sig}                  + notary sig over id
//!   outputs: [LedgerState]
//!   commands, notary, salt
//! ```

pub mod cards;
pub mod codec;
pub mod commands;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod states;
pub mod transaction;

pub use cards::{Card, Deck, Rank, Suit};
pub use codec::{decode, encode};
pub use commands::{CardCommand, Command, CommandKind, GameCommand};
pub use errors::{TypesError, TypesResult};
pub use identity::{Party, PartyName, PublicKey, Signature};
pub use ledger::{ContractId, LedgerState, StateAndRef, StatePayload, StateRef, TxId};
pub use states::{CardState, GameId, GameState};
pub use transaction::{
    LedgerTransaction, NotarizedTransaction, SignedTransaction, StateResolver,
    TransactionProposal,
};
