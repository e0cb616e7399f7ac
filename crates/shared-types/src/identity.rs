//! # Identities
//!
//! A [`Party`] is a network participant able to sign and hold a vault.
//! Keys and signatures are plain byte newtypes here; the signing capability
//! itself lives in `shared-crypto`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{verify_signature, Ed25519PublicKey, Ed25519Signature};
use std::fmt;

/// X.500-style display name, e.g. `O=Dealer,L=London,C=GB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyName(String);

impl PartyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `O=` component, or the whole name when there is none.
    pub fn organisation(&self) -> &str {
        self.0
            .split(',')
            .find_map(|part| part.trim().strip_prefix("O="))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// `true` iff `signature` verifies over `message` under this key.
    ///
    /// Bytes that are not a valid curve point never verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        Ed25519PublicKey::from_bytes(self.0)
            .map(|key| verify_signature(message, &signature.to_crypto(), &key))
            .unwrap_or(false)
    }
}

impl From<Ed25519PublicKey> for PublicKey {
    fn from(key: Ed25519PublicKey) -> Self {
        Self(*key.as_bytes())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

/// A 64-byte Ed25519 signature.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] pub [u8; 64]);

impl Signature {
    fn to_crypto(self) -> Ed25519Signature {
        Ed25519Signature::from_bytes(self.0)
    }
}

impl From<Ed25519Signature> for Signature {
    fn from(sig: Ed25519Signature) -> Self {
        Self(*sig.as_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}…)", hex::encode(&self.0[..8]))
    }
}

/// A network participant: display name plus owning key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub owning_key: PublicKey,
}

impl Party {
    pub fn new(name: impl Into<PartyName>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
