//! # LF-03: Notary
//!
//! The system's sole source of global ordering. A notary is trusted only to
//! prevent double-consumption of state references, never to judge business
//! rules.
//!
//! ```text
//! notarise(stx)
//!   ├─ names a different notary?          → Rejected
//!   ├─ duplicate input references?        → Rejected
//!   ├─ not fully & validly signed?        → Rejected
//!   ├─ UniquenessProvider::commit(inputs, id)
//!   │     any input consumed by other tx  → Conflict { ref → consuming tx }
//!   └─ sign(id)                           → Accepted(signature)
//! ```
//!
//! Commit is all-or-none and idempotent per transaction id, so a client may
//! safely resubmit after a timeout.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::LocalNotaryClient;
pub use domain::uniqueness::UniquenessProvider;
pub use domain::verdict::{NotaryConflict, NotaryVerdict};
pub use ports::outbound::NotaryClient;
pub use service::NotaryService;
