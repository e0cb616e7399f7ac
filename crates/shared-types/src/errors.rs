//! # Error Types

use crate::identity::PublicKey;
use crate::ledger::StateRef;
use thiserror::Error;

/// Errors raised while encoding or checking ledger artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Canonical encoding or decoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// An input reference could not be resolved to a prior output.
    #[error("Unresolved input state: {0}")]
    UnresolvedInput(StateRef),

    /// A signature is attached for a key the commands never asked for.
    #[error("Signature from unexpected signer {key}")]
    UnexpectedSigner { key: PublicKey },

    /// A signature does not verify over the canonical proposal bytes.
    #[error("Invalid signature from {key}")]
    InvalidSignature { key: PublicKey },

    /// One or more required signers have not signed yet.
    #[error("Missing signatures from {} required signer(s)", missing.len())]
    MissingSignatures { missing: Vec<PublicKey> },

    /// The notary's attestation does not verify over the transaction id.
    #[error("Invalid notary signature")]
    InvalidNotarySignature,
}

/// Convenience alias.
pub type TypesResult<T> = Result<T, TypesError>;
