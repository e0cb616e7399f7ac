//! # Vault Errors

use shared_types::TypesError;
use thiserror::Error;

/// Errors from the key-value store port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    #[error(transparent)]
    Store(#[from] KVStoreError),

    #[error("Vault encoding error: {0}")]
    Encoding(#[from] TypesError),

    /// The log references a transaction the store does not hold.
    #[error("Vault log corrupt: {0}")]
    Corrupt(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
