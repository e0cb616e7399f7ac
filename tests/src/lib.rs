//! # LedgerFlow Test Suite
//!
//! Cross-crate scenarios that need more than one party.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs        # In-process network with pluggable collaborators
//!     ├── commit.rs         # End-to-end deal, self-deal refusal
//!     ├── double_spend.rs   # Notary uniqueness under a race
//!     ├── rejection.rs      # One refusal aborts for everybody
//!     ├── delivery.rs       # Partial delivery and redelivery
//!     ├── notary_retry.rs   # Lost verdicts and a hung notary
//!     └── recovery.rs       # Checkpoint resume, durable vaults
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lf-tests
//! cargo test -p lf-tests integration::double_spend::
//! ```

#![allow(dead_code)]

pub mod integration;
