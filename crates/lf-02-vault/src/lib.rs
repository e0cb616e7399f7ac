//! # LF-02: Vault
//!
//! Each party's private copy of the ledger.
//!
//! ```text
//!             record(ntx)                       query(status, predicate)
//!                 │                                      ▲
//!        ┌────────▼─────────┐   atomic batch   ┌─────────┴────────┐
//!        │  writer mutex    │ ───────────────▶ │   KeyValueStore   │
//!        └────────┬─────────┘  log/<seq>       └──────────────────┘
//!                 │            tx/<id>
//!        ┌────────▼─────────┐
//!        │  VaultIndex      │  produced refs, consumed_by, append order
//!        │  (RwLock)        │  live = produced − consumed
//!        └──────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - Entries are never deleted. Consumed states stay queryable for audit.
//! - Appending an already recorded transaction is a no-op.
//! - Appends are serialized per vault; readers never block each other.
//! - The index is derived: [`Vault::open`] rebuilds it from the log.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileBackedKVStore, InMemoryKVStore};
pub use domain::errors::{KVStoreError, VaultError, VaultResult};
pub use domain::index::VaultIndex;
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::{RecordOutcome, StateStatus, Vault};
