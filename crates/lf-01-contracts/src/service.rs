//! # Contract Verification Service
//!
//! Dispatches each referenced contract to its rule set.

use crate::domain::constraints::StructuralConstraint;
use crate::domain::errors::{VerificationError, VerifyResult};
use crate::domain::{card, game};
use crate::ports::inbound::ContractVerifier;
use shared_types::{Command, CommandKind, ContractId, LedgerState, LedgerTransaction};
use tracing::debug;

/// The built-in card and game contracts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerContracts;

impl ContractVerifier for LedgerContracts {
    fn verify(&self, tx: &LedgerTransaction) -> VerifyResult {
        verify(tx)
    }
}

/// Verify every contract referenced by `tx`.
pub fn verify(tx: &LedgerTransaction) -> VerifyResult {
    let contracts = tx.contracts();
    if contracts.is_empty() {
        return Err(VerificationError::NoStates);
    }
    for contract in contracts {
        if let Err(e) = verify_contract(tx, contract) {
            debug!(tx_id = %tx.id.short(), contract = %contract, error = %e, "[lf-01] Contract rejected transaction");
            return Err(e);
        }
    }
    Ok(())
}

fn verify_contract(tx: &LedgerTransaction, contract: ContractId) -> VerifyResult {
    // 1. exactly one matching command
    let commands = tx.commands_of(contract);
    let [command] = commands.as_slice() else {
        return Err(VerificationError::NoSingleMatchingCommand {
            contract,
            found: commands.len(),
        });
    };

    let inputs = tx.inputs_of(contract);
    let outputs = tx.outputs_of(contract);

    // 2. structural predicates
    let declared: &[StructuralConstraint] = match command.kind {
        CommandKind::Card(c) => card::constraints(c),
        CommandKind::Game(g) => game::constraints(g),
    };
    if let Some(violated) = declared
        .iter()
        .find(|c| !c.holds(inputs.len(), outputs.len()))
    {
        return Err(VerificationError::Constraint(*violated));
    }

    // 3. domain invariants
    match command.kind {
        CommandKind::Card(c) => card::check_invariants(c, &inputs, &outputs)?,
        CommandKind::Game(g) => game::check_invariants(g, &inputs, &outputs)?,
    }

    // 4. participants must sign
    check_participants_sign(command, &outputs)
}

fn check_participants_sign(command: &Command, outputs: &[&LedgerState]) -> VerifyResult {
    let mut missing: Vec<_> = outputs
        .iter()
        .flat_map(|state| state.participants())
        .filter(|party| !command.signers.contains(&party.owning_key))
        .map(|party| party.name)
        .collect();
    missing.sort();
    missing.dedup();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(VerificationError::ParticipantsMustSign { missing })
    }
}
