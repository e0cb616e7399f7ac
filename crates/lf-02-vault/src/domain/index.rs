//! # Live-State Index
//!
//! Derived view over the append-only log. A state is live iff some recorded
//! transaction produced it and no recorded transaction consumes it. The
//! consumer may be recorded before the producer (a party can learn of a
//! spend before it learns of the state); the index is order-insensitive.

use shared_types::{LedgerState, NotarizedTransaction, StateAndRef, StateRef, TxId};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct VaultIndex {
    order: Vec<TxId>,
    transactions: HashMap<TxId, NotarizedTransaction>,
    produced: BTreeMap<StateRef, LedgerState>,
    consumed_by: BTreeMap<StateRef, TxId>,
}

impl VaultIndex {
    pub fn contains(&self, id: &TxId) -> bool {
        self.transactions.contains_key(id)
    }

    /// Sequence number the next appended transaction will get.
    pub fn next_sequence(&self) -> u64 {
        self.order.len() as u64
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fold one transaction into the index. Caller guarantees `id` is the
    /// transaction's id and that it is not yet present.
    pub fn apply(&mut self, id: TxId, tx: NotarizedTransaction) {
        for input in &tx.proposal().inputs {
            self.consumed_by.entry(*input).or_insert(id);
        }
        for (index, output) in tx.proposal().outputs.iter().enumerate() {
            self.produced
                .insert(StateRef::new(id, index as u32), output.clone());
        }
        self.order.push(id);
        self.transactions.insert(id, tx);
    }

    pub fn transaction(&self, id: &TxId) -> Option<&NotarizedTransaction> {
        self.transactions.get(id)
    }

    /// Transactions in append order.
    pub fn transactions(&self) -> impl Iterator<Item = &NotarizedTransaction> {
        self.order.iter().filter_map(|id| self.transactions.get(id))
    }

    pub fn state(&self, reference: &StateRef) -> Option<&LedgerState> {
        self.produced.get(reference)
    }

    pub fn consumed_by(&self, reference: &StateRef) -> Option<TxId> {
        self.consumed_by.get(reference).copied()
    }

    pub fn is_live(&self, reference: &StateRef) -> bool {
        self.produced.contains_key(reference) && !self.consumed_by.contains_key(reference)
    }

    /// Every produced state with its liveness.
    pub fn states(&self) -> impl Iterator<Item = (StateAndRef, bool)> + '_ {
        self.produced.iter().map(|(reference, state)| {
            (
                StateAndRef {
                    state: state.clone(),
                    reference: *reference,
                },
                !self.consumed_by.contains_key(reference),
            )
        })
    }
}
