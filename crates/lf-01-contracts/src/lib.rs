//! # LF-01: Contract Verification
//!
//! `verify(tx) -> Ok | Reject(reason)`: pure, deterministic, no I/O.
//!
//! For every contract referenced by an input or output state the checks run
//! in this order and the first failure wins:
//!
//! ```text
//! 1. exactly one command of the contract's kind   → NoSingleMatchingCommand
//! 2. structural constraints of that command kind  → Constraint(<predicate>)
//! 3. domain invariants over the payloads          → DomainInvariant(reason)
//! 4. command signers ⊇ every output participant   → ParticipantsMustSign
//! ```
//!
//! Command kinds are a tagged union; each carries its own predicate set and
//! rules are chosen by explicit `match`, never by override chains.
//!
//! Every party re-runs verification independently on a proposal it is asked
//! to sign; nothing is trusted from a counterparty's claim.

pub mod domain;
pub mod policy;
pub mod ports;
pub mod service;

pub use domain::constraints::StructuralConstraint;
pub use domain::errors::{VerificationError, VerifyResult};
pub use policy::{AcceptAll, AcceptancePolicy, DealAcceptance, GameAcceptance};
pub use ports::inbound::ContractVerifier;
pub use service::{verify, LedgerContracts};
