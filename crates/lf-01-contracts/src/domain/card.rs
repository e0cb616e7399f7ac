//! # Card Contract
//!
//! Governs dealing a single card from a dealer to a player.

use crate::domain::constraints::StructuralConstraint;
use crate::domain::errors::{VerificationError, VerifyResult};
use shared_types::{CardCommand, ContractId, LedgerState};

/// Structural predicates declared by each card command.
pub fn constraints(command: CardCommand) -> &'static [StructuralConstraint] {
    match command {
        CardCommand::Create => &[
            StructuralConstraint::ZeroInputs,
            StructuralConstraint::ExactlyOneOutput,
        ],
    }
}

/// Domain invariants over card payloads.
pub fn check_invariants(
    command: CardCommand,
    _inputs: &[&LedgerState],
    outputs: &[&LedgerState],
) -> VerifyResult {
    match command {
        CardCommand::Create => {
            for output in outputs {
                let card = output.as_card().ok_or_else(|| {
                    VerificationError::invariant(ContractId::Card, "Output must be a card state.")
                })?;
                if card.dealer.name == card.player.name
                    || card.dealer.owning_key == card.player.owning_key
                {
                    return Err(VerificationError::invariant(
                        ContractId::Card,
                        "The dealer and player cannot be the same entity.",
                    ));
                }
            }
            Ok(())
        }
    }
}
