//! # Commands
//!
//! The stated intent of a transaction plus the keys that must sign it.
//! Command kinds form a tagged union; contract rules are selected by an
//! explicit match on the kind.

use crate::cards::Card;
use crate::identity::PublicKey;
use crate::ledger::ContractId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardCommand {
    /// Deal a new card to a player.
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameCommand {
    /// Open a new game with an empty table.
    Create,
    /// Turn one community card face up.
    RevealCommunityCard { card: Card },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Card(CardCommand),
    Game(GameCommand),
}

impl CommandKind {
    /// Contract family this command belongs to.
    pub fn contract(&self) -> ContractId {
        match self {
            CommandKind::Card(_) => ContractId::Card,
            CommandKind::Game(_) => ContractId::Game,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Card(CardCommand::Create) => f.write_str("Card.Create"),
            CommandKind::Game(GameCommand::Create) => f.write_str("Game.Create"),
            CommandKind::Game(GameCommand::RevealCommunityCard { card }) => {
                write!(f, "Game.RevealCommunityCard({card})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub signers: BTreeSet<PublicKey>,
}

impl Command {
    pub fn new(kind: CommandKind, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            kind,
            signers: signers.into_iter().collect(),
        }
    }
}
