//! Symmetric key derivation from an ECDH shared secret
//!
//! Every encrypted share records which strategy produced its AES key so old
//! records keep decrypting after a new strategy becomes the default.

use serde::{Deserialize, Serialize};

/// Size of the derived AES-256 key in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Context string for the BLAKE3 strategy. Changing it breaks every record
/// written with [`Kdf::Blake3`].
const BLAKE3_CONTEXT: &str = "custody 2024-06-01 hybrid share key v1";

/// Strategy turning a raw X25519 shared secret into an AEAD key
pub trait KeyDerivation: Send + Sync {
    /// The wire tag recorded on shares encrypted with this strategy
    fn kdf(&self) -> Kdf;

    fn derive(&self, shared_secret: &[u8; 32]) -> [u8; SYMMETRIC_KEY_SIZE];
}

/// Wire identifier of a key-derivation strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kdf {
    /// Raw prefix of the shared secret, no KDF
    #[default]
    Legacy,
    /// BLAKE3 in key-derivation mode
    Blake3,
}

impl Kdf {
    pub fn strategy(&self) -> &'static dyn KeyDerivation {
        match self {
            Kdf::Legacy => &LegacyPrefix,
            Kdf::Blake3 => &Blake3Derive,
        }
    }
}

impl std::str::FromStr for Kdf {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Kdf::Legacy),
            "blake3" => Ok(Kdf::Blake3),
            other => Err(format!("unknown kdf '{}'", other)),
        }
    }
}

/// Legacy key derivation: the key is the first [`SYMMETRIC_KEY_SIZE`] bytes
/// of the shared secret.
///
/// Kept bit-for-bit so shares written by earlier nodes remain readable.
#[derive(Debug, Clone, Copy)]
pub struct LegacyPrefix;

impl KeyDerivation for LegacyPrefix {
    fn kdf(&self) -> Kdf {
        Kdf::Legacy
    }

    fn derive(&self, shared_secret: &[u8; 32]) -> [u8; SYMMETRIC_KEY_SIZE] {
        let mut key = [0u8; SYMMETRIC_KEY_SIZE];
        key.copy_from_slice(&shared_secret[..SYMMETRIC_KEY_SIZE]);
        key
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Blake3Derive;

impl KeyDerivation for Blake3Derive {
    fn kdf(&self) -> Kdf {
        Kdf::Blake3
    }

    fn derive(&self, shared_secret: &[u8; 32]) -> [u8; SYMMETRIC_KEY_SIZE] {
        blake3::derive_key(BLAKE3_CONTEXT, shared_secret)
    }
}
