//! Per-recipient hybrid encryption using ECDH + AES-256-GCM
//!
//! To encrypt a share for a custodian:
//! 1. **Generate ephemeral keypair**: a fresh Ed25519 keypair, used once
//! 2. **Perform ECDH**: convert both keys to X25519 and compute the shared secret
//! 3. **Derive key**: run the selected [`Kdf`] over the shared secret
//! 4. **Seal**: AES-256-GCM with a random 96-bit IV, tag kept detached
//!
//! The custodian recovers the plaintext by repeating the ECDH with its own
//! private key and the ephemeral public key carried in the payload.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::hex::Hex;
use serde_with::serde_as;

use super::kdf::Kdf;
use super::keys::{KeyError, PublicKey, SecretKey};

/// Size of the AES-GCM IV in bytes
pub const IV_SIZE: usize = 12;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur while sealing or opening a payload
///
/// Messages never include key or plaintext bytes.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("authentication failed: wrong key or tampered payload")]
    Authentication,
    #[error("key agreement produced a non-contributory shared secret")]
    NonContributory,
    #[error("encryption failed")]
    Encrypt,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// Everything a recipient needs to open a payload, minus its private key
///
/// # Wire Format
///
/// ```text
/// { "ephemeralPublicKey": hex(32), "iv": hex(12), "ciphertext": base64,
///   "authTag": hex(16), "kdf": "legacy" | "blake3" }
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridCiphertext {
    #[serde_as(as = "Hex")]
    pub ephemeral_public_key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub iv: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub ciphertext: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub auth_tag: Vec<u8>,
    #[serde(default)]
    pub kdf: Kdf,
}

/// Stateless hybrid encryption operations
pub struct HybridCipher;

impl HybridCipher {
    /// Encrypt `plaintext` so only the holder of `recipient`'s private key can read it
    ///
    /// # Errors
    ///
    /// Returns an error if the key agreement is degenerate or the system RNG fails.
    pub fn encrypt(
        recipient: &PublicKey,
        plaintext: &[u8],
        kdf: Kdf,
    ) -> Result<HybridCiphertext, CipherError> {
        Self::encrypt_with_aad(recipient, plaintext, kdf, b"")
    }

    /// Like [`HybridCipher::encrypt`], authenticating `aad` alongside the plaintext
    ///
    /// `aad` is not stored in the payload; the same bytes must be passed to
    /// [`HybridCipher::decrypt_with_aad`].
    pub fn encrypt_with_aad(
        recipient: &PublicKey,
        plaintext: &[u8],
        kdf: Kdf,
        aad: &[u8],
    ) -> Result<HybridCiphertext, CipherError> {
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        let shared_secret = ephemeral_private
            .to_x25519()
            .diffie_hellman(&recipient.to_x25519());
        if !shared_secret.was_contributory() {
            return Err(CipherError::NonContributory);
        }
        let key = kdf.strategy().derive(shared_secret.as_bytes());

        let mut iv = [0u8; IV_SIZE];
        getrandom::getrandom(&mut iv).map_err(|_| CipherError::Encrypt)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
            .map_err(|_| CipherError::Encrypt)?;

        Ok(HybridCiphertext {
            ephemeral_public_key: ephemeral_public.to_bytes().to_vec(),
            iv: iv.to_vec(),
            ciphertext: buffer,
            auth_tag: tag.to_vec(),
            kdf,
        })
    }

    /// Open a payload with the recipient's private key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The IV, tag or ephemeral key have the wrong size or encoding
    /// - The key agreement is degenerate
    /// - AES-GCM authentication fails (wrong key or tampered payload)
    ///
    /// Nothing is returned on failure; the scratch buffer is dropped.
    pub fn decrypt(
        recipient: &SecretKey,
        payload: &HybridCiphertext,
    ) -> Result<Vec<u8>, CipherError> {
        Self::decrypt_with_aad(recipient, payload, b"")
    }

    /// Open a payload sealed with [`HybridCipher::encrypt_with_aad`]
    ///
    /// Any difference in `aad` fails authentication.
    pub fn decrypt_with_aad(
        recipient: &SecretKey,
        payload: &HybridCiphertext,
        aad: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        if payload.iv.len() != IV_SIZE {
            return Err(CipherError::Malformed(format!(
                "expected {} byte iv, got {}",
                IV_SIZE,
                payload.iv.len()
            )));
        }
        if payload.auth_tag.len() != TAG_SIZE {
            return Err(CipherError::Malformed(format!(
                "expected {} byte auth tag, got {}",
                TAG_SIZE,
                payload.auth_tag.len()
            )));
        }
        let ephemeral_public = PublicKey::try_from(payload.ephemeral_public_key.as_slice())?;

        let shared_secret = recipient
            .to_x25519()
            .diffie_hellman(&ephemeral_public.to_x25519());
        if !shared_secret.was_contributory() {
            return Err(CipherError::NonContributory);
        }
        let key = payload.kdf.strategy().derive(shared_secret.as_bytes());

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let mut buffer = payload.ciphertext.clone();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&payload.iv),
                aad,
                &mut buffer,
                Tag::from_slice(&payload.auth_tag),
            )
            .map_err(|_| CipherError::Authentication)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let recipient = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&recipient.public(), b"share bytes", Kdf::Legacy).unwrap();

        assert_eq!(sealed.iv.len(), IV_SIZE);
        assert_eq!(sealed.auth_tag.len(), TAG_SIZE);
        assert_eq!(HybridCipher::decrypt(&recipient, &sealed).unwrap(), b"share bytes");
    }

    #[test]
    fn test_blake3_strategy_roundtrip() {
        let recipient = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&recipient.public(), b"v2", Kdf::Blake3).unwrap();
        assert_eq!(sealed.kdf, Kdf::Blake3);
        assert_eq!(HybridCipher::decrypt(&recipient, &sealed).unwrap(), b"v2");

        // relabelling the strategy breaks the key
        let mut relabelled = sealed.clone();
        relabelled.kdf = Kdf::Legacy;
        assert!(matches!(
            HybridCipher::decrypt(&recipient, &relabelled),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_fresh_ephemeral_and_iv_per_call() {
        let recipient = SecretKey::generate().public();
        let a = HybridCipher::encrypt(&recipient, b"same", Kdf::Legacy).unwrap();
        let b = HybridCipher::encrypt(&recipient, b"same", Kdf::Legacy).unwrap();
        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        assert_ne!(a.iv, b.iv);
    }

    #[test]
    fn test_wrong_key_fails() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&alice.public(), b"for alice", Kdf::Legacy).unwrap();

        assert!(matches!(
            HybridCipher::decrypt(&bob, &sealed),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let recipient = SecretKey::generate();
        let mut sealed =
            HybridCipher::encrypt(&recipient.public(), b"integrity matters", Kdf::Legacy).unwrap();
        sealed.ciphertext[3] ^= 0xFF;

        assert!(matches!(
            HybridCipher::decrypt(&recipient, &sealed),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let recipient = SecretKey::generate();
        let mut sealed =
            HybridCipher::encrypt(&recipient.public(), b"integrity matters", Kdf::Legacy).unwrap();
        sealed.auth_tag[0] ^= 0x01;

        assert!(matches!(
            HybridCipher::decrypt(&recipient, &sealed),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_malformed_sizes_rejected() {
        let recipient = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&recipient.public(), b"x", Kdf::Legacy).unwrap();

        let mut short_iv = sealed.clone();
        short_iv.iv.pop();
        assert!(matches!(
            HybridCipher::decrypt(&recipient, &short_iv),
            Err(CipherError::Malformed(_))
        ));

        let mut short_tag = sealed.clone();
        short_tag.auth_tag.truncate(8);
        assert!(matches!(
            HybridCipher::decrypt(&recipient, &short_tag),
            Err(CipherError::Malformed(_))
        ));

        let mut bad_ephemeral = sealed;
        bad_ephemeral.ephemeral_public_key.truncate(31);
        assert!(matches!(
            HybridCipher::decrypt(&recipient, &bad_ephemeral),
            Err(CipherError::Key(_))
        ));
    }

    #[test]
    fn test_associated_data_must_match() {
        let recipient = SecretKey::generate();
        let sealed =
            HybridCipher::encrypt_with_aad(&recipient.public(), b"bound", Kdf::Blake3, b"ctx-a")
                .unwrap();

        assert_eq!(
            HybridCipher::decrypt_with_aad(&recipient, &sealed, b"ctx-a").unwrap(),
            b"bound"
        );
        assert!(matches!(
            HybridCipher::decrypt_with_aad(&recipient, &sealed, b"ctx-b"),
            Err(CipherError::Authentication)
        ));
        assert!(matches!(
            HybridCipher::decrypt(&recipient, &sealed),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_serde_json_wire_names() {
        let recipient = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&recipient.public(), b"wire", Kdf::Legacy).unwrap();

        let json = serde_json::to_value(&sealed).unwrap();
        assert!(json.get("ephemeralPublicKey").is_some());
        assert!(json.get("authTag").is_some());
        assert_eq!(json["kdf"], "legacy");

        let back: HybridCiphertext = serde_json::from_value(json).unwrap();
        assert_eq!(HybridCipher::decrypt(&recipient, &back).unwrap(), b"wire");
    }
}
