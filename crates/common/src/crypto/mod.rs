//! Cryptographic primitives for custody nodes
//!
//! - **Identity**: each custodian has an Ed25519 keypair (`SecretKey`/`PublicKey`)
//!   published through the node registry
//! - **Share encryption**: ephemeral ECDH over X25519 plus AES-256-GCM, one
//!   payload per custodian (`HybridCipher`)
//! - **Key derivation**: versioned strategies turning the ECDH output into
//!   the AES key (`Kdf`)
//!
//! # Security Model
//!
//! A share is readable only by the custodian it was encrypted to. The
//! orchestrating node never holds custodian keys; it sees plaintext shares
//! only for the duration of a recovery.

mod cipher;
mod kdf;
mod keys;

pub use cipher::{CipherError, HybridCipher, HybridCiphertext, IV_SIZE, TAG_SIZE};
pub use ed25519_dalek::Signature;
pub use kdf::{Blake3Derive, Kdf, KeyDerivation, LegacyPrefix, SYMMETRIC_KEY_SIZE};
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
