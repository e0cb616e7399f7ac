//! # Shared Crypto - Signing Capability
//!
//! The protocol treats cryptography as an opaque capability: parties sign the
//! canonical encoding of a proposal, notaries sign transaction ids, and every
//! receiver verifies against the public key it expects.
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Transaction ids |
//! | `signatures` | Ed25519 | Party and notary signatures |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Hash};
pub use signatures::{
    verify_signature, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SigningCapability,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
