//! # Transactions
//!
//! ```text
//! TransactionProposal        canonical bytes = bincode(proposal)
//!        │                   id              = sha256(canonical bytes)
//!        ▼
//! SignedTransaction          signatures: required signer key → sig over canonical bytes
//!        │
//!        ▼
//! NotarizedTransaction       + notary sig over id  (the unit persisted in vaults)
//! ```

use crate::codec::encode;
use crate::commands::Command;
use crate::errors::{TypesError, TypesResult};
use crate::identity::{Party, PublicKey, Signature};
use crate::ledger::{ContractId, LedgerState, StateAndRef, StateRef, TxId};
use serde::{Deserialize, Serialize};
use shared_crypto::sha256;
use std::collections::{BTreeMap, BTreeSet};

/// Resolves input references to the states they point at.
pub trait StateResolver {
    fn resolve(&self, state_ref: &StateRef) -> Option<LedgerState>;
}

impl StateResolver for BTreeMap<StateRef, LedgerState> {
    fn resolve(&self, state_ref: &StateRef) -> Option<LedgerState> {
        self.get(state_ref).cloned()
    }
}

/// Unsigned transaction: what every signer agrees to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProposal {
    pub inputs: Vec<StateRef>,
    pub outputs: Vec<LedgerState>,
    pub commands: Vec<Command>,
    pub notary: Party,
    /// Random salt so otherwise identical proposals get distinct ids.
    pub privacy_salt: [u8; 32],
}

impl TransactionProposal {
    /// Empty proposal for `notary` with a fresh random salt.
    pub fn new(notary: Party) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            notary,
            privacy_salt: rand::random(),
        }
    }

    pub fn with_input(mut self, input: StateRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: LedgerState) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn canonical_bytes(&self) -> TypesResult<Vec<u8>> {
        encode(self)
    }

    pub fn id(&self) -> TypesResult<TxId> {
        Ok(TxId(sha256(&self.canonical_bytes()?)))
    }

    /// Union of the signer sets of every command.
    pub fn required_signers(&self) -> BTreeSet<PublicKey> {
        self.commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }

    /// References the outputs of this proposal will have once committed.
    pub fn output_refs(&self) -> TypesResult<Vec<StateAndRef>> {
        let id = self.id()?;
        Ok(self
            .outputs
            .iter()
            .enumerate()
            .map(|(index, state)| StateAndRef {
                state: state.clone(),
                reference: StateRef::new(id, index as u32),
            })
            .collect())
    }

    /// Resolve every input and produce the view contracts verify.
    pub fn to_ledger_transaction(
        &self,
        resolver: &dyn StateResolver,
    ) -> TypesResult<LedgerTransaction> {
        let inputs = self
            .inputs
            .iter()
            .map(|reference| {
                resolver
                    .resolve(reference)
                    .map(|state| StateAndRef {
                        state,
                        reference: *reference,
                    })
                    .ok_or(TypesError::UnresolvedInput(*reference))
            })
            .collect::<TypesResult<Vec<_>>>()?;

        Ok(LedgerTransaction {
            id: self.id()?,
            inputs,
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            notary: self.notary.clone(),
        })
    }
}

/// A proposal with its inputs resolved; the argument of contract verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub id: TxId,
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<LedgerState>,
    pub commands: Vec<Command>,
    pub notary: Party,
}

impl LedgerTransaction {
    pub fn inputs_of(&self, contract: ContractId) -> Vec<&LedgerState> {
        self.inputs
            .iter()
            .map(|input| &input.state)
            .filter(|state| state.contract == contract)
            .collect()
    }

    pub fn outputs_of(&self, contract: ContractId) -> Vec<&LedgerState> {
        self.outputs
            .iter()
            .filter(|state| state.contract == contract)
            .collect()
    }

    pub fn commands_of(&self, contract: ContractId) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|command| command.kind.contract() == contract)
            .collect()
    }

    /// Every contract referenced by an input or output state, in order.
    pub fn contracts(&self) -> BTreeSet<ContractId> {
        self.inputs
            .iter()
            .map(|input| input.state.contract)
            .chain(self.outputs.iter().map(|output| output.contract))
            .collect()
    }
}

/// Proposal plus the signatures gathered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub proposal: TransactionProposal,
    pub signatures: BTreeMap<PublicKey, Signature>,
}

impl SignedTransaction {
    pub fn new(proposal: TransactionProposal) -> Self {
        Self {
            proposal,
            signatures: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TypesResult<TxId> {
        self.proposal.id()
    }

    pub fn add_signature(&mut self, key: PublicKey, signature: Signature) {
        self.signatures.insert(key, signature);
    }

    pub fn with_signature(mut self, key: PublicKey, signature: Signature) -> Self {
        self.add_signature(key, signature);
        self
    }

    /// Required signers that have not signed yet.
    pub fn missing_signers(&self) -> BTreeSet<PublicKey> {
        self.proposal
            .required_signers()
            .into_iter()
            .filter(|key| !self.signatures.contains_key(key))
            .collect()
    }

    /// Every attached signature belongs to a required signer and verifies
    /// over the exact canonical proposal bytes. Missing signatures are fine.
    pub fn verify_signatures(&self) -> TypesResult<()> {
        let required = self.proposal.required_signers();
        let bytes = self.proposal.canonical_bytes()?;
        for (key, signature) in &self.signatures {
            if !required.contains(key) {
                return Err(TypesError::UnexpectedSigner { key: *key });
            }
            if !key.verify(&bytes, signature) {
                return Err(TypesError::InvalidSignature { key: *key });
            }
        }
        Ok(())
    }

    /// Exactly one valid signature per required signer.
    pub fn verify_required_signatures(&self) -> TypesResult<()> {
        self.verify_signatures()?;
        let missing = self.missing_signers();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TypesError::MissingSignatures {
                missing: missing.into_iter().collect(),
            })
        }
    }

    pub fn is_fully_signed(&self) -> bool {
        self.verify_required_signatures().is_ok()
    }
}

/// Fully signed transaction attested by the notary. Terminal and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizedTransaction {
    pub signed: SignedTransaction,
    pub notary_signature: Signature,
}

impl NotarizedTransaction {
    pub fn id(&self) -> TypesResult<TxId> {
        self.signed.id()
    }

    pub fn proposal(&self) -> &TransactionProposal {
        &self.signed.proposal
    }

    /// Check every required signature and the notary's attestation.
    pub fn verify(&self) -> TypesResult<()> {
        self.signed.verify_required_signatures()?;
        let id = self.id()?;
        if self
            .proposal()
            .notary
            .owning_key
            .verify(&id.0, &self.notary_signature)
        {
            Ok(())
        } else {
            Err(TypesError::InvalidNotarySignature)
        }
    }
}
