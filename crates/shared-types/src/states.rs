//! # Domain States
//!
//! Payloads for the two contract families: a single dealt card, and the
//! table-level game record.

use crate::cards::Card;
use crate::identity::{Party, PartyName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identifier shared by every state of one game.
pub type GameId = Uuid;

/// A card dealt face down from `dealer` to `player`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardState {
    pub card: Card,
    pub dealer: Party,
    pub player: Party,
    pub game_id: GameId,
}

impl CardState {
    pub fn participants(&self) -> Vec<Party> {
        vec![self.dealer.clone(), self.player.clone()]
    }
}

/// Table-level record of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub community_cards: Vec<Card>,
    pub dealer: Party,
    pub players: Vec<Party>,
    pub game_id: GameId,
    pub cards_revealed_by_player: BTreeMap<PartyName, Vec<Card>>,
}

impl GameState {
    /// A fresh game with an empty table.
    pub fn new(dealer: Party, players: Vec<Party>) -> Self {
        Self {
            community_cards: Vec::new(),
            dealer,
            players,
            game_id: Uuid::new_v4(),
            cards_revealed_by_player: BTreeMap::new(),
        }
    }

    pub fn participants(&self) -> Vec<Party> {
        std::iter::once(self.dealer.clone())
            .chain(self.players.iter().cloned())
            .collect()
    }

    /// Successor state with `card` turned face up on the table.
    pub fn with_community_card(&self, card: Card) -> Self {
        let mut next = self.clone();
        next.community_cards.push(card);
        next
    }
}
