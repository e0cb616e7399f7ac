//! # Uniqueness Provider
//!
//! The consumed-reference map and its one atomic operation.

use crate::domain::verdict::NotaryConflict;
use parking_lot::Mutex;
use shared_types::{StateRef, TxId};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct UniquenessProvider {
    consumed: Mutex<HashMap<StateRef, TxId>>,
}

impl UniquenessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every input consumed by `tx_id`, or none of them.
    ///
    /// Re-committing the same `tx_id` succeeds without change.
    pub fn commit(&self, inputs: &[StateRef], tx_id: TxId) -> Result<(), NotaryConflict> {
        let mut consumed = self.consumed.lock();

        let conflicts: BTreeMap<StateRef, TxId> = inputs
            .iter()
            .filter_map(|input| match consumed.get(input) {
                Some(by) if *by != tx_id => Some((*input, *by)),
                _ => None,
            })
            .collect();

        if !conflicts.is_empty() {
            return Err(NotaryConflict {
                consumed: conflicts,
            });
        }

        for input in inputs {
            consumed.insert(*input, tx_id);
        }
        Ok(())
    }

    pub fn consumed_by(&self, input: &StateRef) -> Option<TxId> {
        self.consumed.lock().get(input).copied()
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.lock().len()
    }
}
