//! # Game Contract
//!
//! Governs the table-level game record: opening a game and revealing
//! community cards. A reveal consumes the previous game state, so two
//! concurrent reveals of the same game conflict at the notary.

use crate::domain::constraints::StructuralConstraint;
use crate::domain::errors::{VerificationError, VerifyResult};
use shared_types::{ContractId, GameCommand, GameState, LedgerState};
use std::collections::BTreeSet;

pub fn constraints(command: GameCommand) -> &'static [StructuralConstraint] {
    match command {
        GameCommand::Create => &[
            StructuralConstraint::ZeroInputs,
            StructuralConstraint::ExactlyOneOutput,
        ],
        GameCommand::RevealCommunityCard { .. } => &[
            StructuralConstraint::ExactlyOneInput,
            StructuralConstraint::ExactlyOneOutput,
        ],
    }
}

fn reject(reason: &str) -> VerificationError {
    VerificationError::invariant(ContractId::Game, reason)
}

fn game_of<'a>(state: &'a LedgerState, what: &str) -> Result<&'a GameState, VerificationError> {
    state
        .as_game()
        .ok_or_else(|| reject(&format!("{what} must be a game state.")))
}

pub fn check_invariants(
    command: GameCommand,
    inputs: &[&LedgerState],
    outputs: &[&LedgerState],
) -> VerifyResult {
    match command {
        GameCommand::Create => {
            for output in outputs {
                let game = game_of(output, "Output")?;
                if game.players.is_empty() {
                    return Err(reject("A game needs at least one player."));
                }
                if game.players.iter().any(|p| p.name == game.dealer.name) {
                    return Err(reject("The dealer cannot also be a player."));
                }
                let distinct: BTreeSet<_> = game.players.iter().map(|p| &p.name).collect();
                if distinct.len() != game.players.len() {
                    return Err(reject("Players must be distinct."));
                }
                if !game.community_cards.is_empty() {
                    return Err(reject("A new game must start with no community cards."));
                }
            }
            Ok(())
        }
        GameCommand::RevealCommunityCard { card } => {
            // Structural constraints guarantee exactly one of each.
            let (Some(input), Some(output)) = (inputs.first(), outputs.first()) else {
                return Ok(());
            };
            let before = game_of(input, "Input")?;
            let after = game_of(output, "Output")?;

            if before.game_id != after.game_id
                || before.dealer != after.dealer
                || before.players != after.players
            {
                return Err(reject("Game id, dealer and players cannot change."));
            }
            if before.community_cards.contains(&card) {
                return Err(reject("The revealed card is already on the table."));
            }
            if *after != before.with_community_card(card) {
                return Err(reject("The output must add exactly the revealed card."));
            }
            Ok(())
        }
    }
}
