//! # Counterparty Acceptance Policies
//!
//! Beyond contract validity, a counterparty may refuse to sign for its own
//! reasons. Policies are configuration: the exact predicate a party applies
//! is chosen by whoever runs the node.

use shared_types::{Card, CardCommand, CommandKind, GameCommand, LedgerTransaction};
use std::collections::BTreeSet;

/// A counterparty-specific acceptance predicate.
pub trait AcceptancePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err(reason)` to refuse signing.
    fn check(&self, tx: &LedgerTransaction) -> Result<(), String>;
}

/// Accept anything the contracts accept.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl AcceptancePolicy for AcceptAll {
    fn name(&self) -> &'static str {
        "accept-all"
    }

    fn check(&self, _tx: &LedgerTransaction) -> Result<(), String> {
        Ok(())
    }
}

/// A player's check on a card being dealt to them.
///
/// With `valid_cards` unset every well-formed card is accepted.
#[derive(Debug, Clone, Default)]
pub struct DealAcceptance {
    pub valid_cards: Option<BTreeSet<Card>>,
}

impl DealAcceptance {
    pub fn restricted_to(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            valid_cards: Some(cards.into_iter().collect()),
        }
    }
}

impl AcceptancePolicy for DealAcceptance {
    fn name(&self) -> &'static str {
        "deal"
    }

    fn check(&self, tx: &LedgerTransaction) -> Result<(), String> {
        let is_deal = !tx.commands.is_empty()
            && tx
                .commands
                .iter()
                .all(|c| c.kind == CommandKind::Card(CardCommand::Create));
        if !is_deal {
            return Err("This must be a Deal transaction.".into());
        }
        if let Some(valid) = &self.valid_cards {
            let all_valid = tx
                .outputs
                .iter()
                .filter_map(|o| o.as_card())
                .all(|c| valid.contains(&c.card));
            if !all_valid {
                return Err("I won't accept invalid cards.".into());
            }
        }
        Ok(())
    }
}

/// A player's check on game-level transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameAcceptance;

impl AcceptancePolicy for GameAcceptance {
    fn name(&self) -> &'static str {
        "game"
    }

    fn check(&self, tx: &LedgerTransaction) -> Result<(), String> {
        let is_game = !tx.commands.is_empty()
            && tx.commands.iter().all(|c| {
                matches!(
                    c.kind,
                    CommandKind::Game(GameCommand::Create)
                        | CommandKind::Game(GameCommand::RevealCommunityCard { .. })
                )
            });
        if is_game {
            Ok(())
        } else {
            Err("This must be a create or reveal game transaction.".into())
        }
    }
}
