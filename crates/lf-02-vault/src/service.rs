//! # Vault Service

use crate::adapters::InMemoryKVStore;
use crate::domain::errors::{VaultError, VaultResult};
use crate::domain::index::VaultIndex;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::{Mutex, RwLock};
use shared_types::{
    decode, encode, ContractId, LedgerState, NotarizedTransaction, PartyName, StateAndRef,
    StateRef, StateResolver, TxId,
};
use tracing::{debug, info};

const LOG_PREFIX: &[u8] = b"log/";
const TX_PREFIX: &[u8] = b"tx/";

fn log_key(sequence: u64) -> Vec<u8> {
    format!("log/{sequence:020}").into_bytes()
}

fn tx_key(id: &TxId) -> Vec<u8> {
    [TX_PREFIX, id.to_string().as_bytes()].concat()
}

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Newly appended at `sequence`.
    Recorded { sequence: u64 },
    /// Already present; nothing changed.
    AlreadyRecorded,
}

/// Which states a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStatus {
    Live,
    Consumed,
    All,
}

/// One party's vault.
pub struct Vault {
    owner: PartyName,
    /// Held for the whole append so appends are serialized.
    store: Mutex<Box<dyn KeyValueStore>>,
    index: RwLock<VaultIndex>,
}

impl Vault {
    /// Open a vault over `store`, rebuilding the index from the log.
    pub fn open(owner: PartyName, store: Box<dyn KeyValueStore>) -> VaultResult<Self> {
        let mut index = VaultIndex::default();
        for (key, id_bytes) in store.prefix_scan(LOG_PREFIX)? {
            let id = TxId(id_bytes.as_slice().try_into().map_err(|_| {
                VaultError::Corrupt(format!(
                    "log entry {} is not a transaction id",
                    String::from_utf8_lossy(&key)
                ))
            })?);
            let bytes = store
                .get(&tx_key(&id))?
                .ok_or_else(|| VaultError::Corrupt(format!("missing transaction {id}")))?;
            let tx: NotarizedTransaction = decode(&bytes)?;
            index.apply(id, tx);
        }

        info!(
            "[lf-02] Vault for {} opened with {} transaction(s)",
            owner,
            index.len()
        );

        Ok(Self {
            owner,
            store: Mutex::new(store),
            index: RwLock::new(index),
        })
    }

    /// Empty vault on an in-memory store.
    pub fn in_memory(owner: PartyName) -> Self {
        Self {
            owner,
            store: Mutex::new(Box::new(InMemoryKVStore::new())),
            index: RwLock::new(VaultIndex::default()),
        }
    }

    pub fn owner(&self) -> &PartyName {
        &self.owner
    }

    /// Append a notarized transaction. Idempotent on the transaction id.
    pub fn record(&self, tx: &NotarizedTransaction) -> VaultResult<RecordOutcome> {
        let id = tx.id()?;
        let mut store = self.store.lock();

        let sequence = {
            let index = self.index.read();
            if index.contains(&id) {
                debug!(party = %self.owner, tx_id = %id.short(), "[lf-02] Already recorded");
                return Ok(RecordOutcome::AlreadyRecorded);
            }
            index.next_sequence()
        };

        store.atomic_batch_write(vec![
            BatchOperation::put(tx_key(&id), encode(tx)?),
            BatchOperation::put(log_key(sequence), id.0.to_vec()),
        ])?;
        self.index.write().apply(id, tx.clone());

        info!(
            party = %self.owner,
            tx_id = %id.short(),
            sequence,
            "[lf-02] Transaction recorded"
        );
        Ok(RecordOutcome::Recorded { sequence })
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.index.read().contains(id)
    }

    pub fn transaction(&self, id: &TxId) -> Option<NotarizedTransaction> {
        self.index.read().transaction(id).cloned()
    }

    /// Every recorded transaction, in append order.
    pub fn transactions(&self) -> Vec<NotarizedTransaction> {
        self.index.read().transactions().cloned().collect()
    }

    pub fn transaction_count(&self) -> usize {
        self.index.read().len()
    }

    /// States matching `status` and `predicate`, in reference order.
    pub fn query<F>(&self, status: StateStatus, predicate: F) -> Vec<StateAndRef>
    where
        F: Fn(&StateAndRef) -> bool,
    {
        self.index
            .read()
            .states()
            .filter(|(_, live)| match status {
                StateStatus::Live => *live,
                StateStatus::Consumed => !*live,
                StateStatus::All => true,
            })
            .map(|(state, _)| state)
            .filter(|state| predicate(state))
            .collect()
    }

    pub fn live_states(&self) -> Vec<StateAndRef> {
        self.query(StateStatus::Live, |_| true)
    }

    pub fn live_states_of(&self, contract: ContractId) -> Vec<StateAndRef> {
        self.query(StateStatus::Live, |s| s.state.contract == contract)
    }

    pub fn consumed_states(&self) -> Vec<StateAndRef> {
        self.query(StateStatus::Consumed, |_| true)
    }

    pub fn is_live(&self, reference: &StateRef) -> bool {
        self.index.read().is_live(reference)
    }

    /// The recorded transaction that consumed `reference`, if any.
    pub fn consumed_by(&self, reference: &StateRef) -> Option<TxId> {
        self.index.read().consumed_by(reference)
    }
}

impl StateResolver for Vault {
    fn resolve(&self, state_ref: &StateRef) -> Option<LedgerState> {
        self.index.read().state(state_ref).cloned()
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("owner", &self.owner)
            .field("transactions", &self.transaction_count())
            .finish()
    }
}
