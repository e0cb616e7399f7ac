//! Canonical binary encoding (bincode) used for signing, storage and wire
//! frames alike.

use crate::errors::{TypesError, TypesResult};
use serde::{de::DeserializeOwned, Serialize};

/// Encode a value to its canonical bytes.
pub fn encode<T: Serialize>(value: &T) -> TypesResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| TypesError::Encoding(e.to_string()))
}

/// Decode a value previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> TypesResult<T> {
    bincode::deserialize(bytes).map_err(|e| TypesError::Encoding(e.to_string()))
}
