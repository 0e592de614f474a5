use serde::{Deserialize, Serialize};

use crate::auth::Acl;
use crate::crypto::{CipherError, HybridCipher, HybridCiphertext, Kdf, PublicKey, SecretKey};

/// One share, encrypted to the custodian it was assigned to
///
/// # Wire Format
///
/// ```text
/// { "custodianUrl": "node-1.example", "ephemeralPublicKey": hex, "iv": hex,
///   "ciphertext": base64, "authTag": hex, "kdf": "legacy", "acl": ["0x..."] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedShare {
    pub custodian_url: String,
    #[serde(flatten)]
    pub payload: HybridCiphertext,
    #[serde(default)]
    pub acl: Acl,
}

impl EncryptedShare {
    /// Encrypt `share` to the custodian at `custodian_url`
    ///
    /// Under [`Kdf::Blake3`] the ACL is authenticated with the share, so a
    /// share presented with a different ACL no longer opens. Legacy shares
    /// carry their ACL unauthenticated.
    pub fn seal(
        custodian_url: impl Into<String>,
        recipient: &PublicKey,
        share: &[u8],
        kdf: Kdf,
        acl: Acl,
    ) -> Result<Self, CipherError> {
        let payload =
            HybridCipher::encrypt_with_aad(recipient, share, kdf, &acl_binding(kdf, &acl))?;
        Ok(Self {
            custodian_url: custodian_url.into(),
            payload,
            acl,
        })
    }

    /// Decrypt the share with the custodian's key
    pub fn open(&self, secret: &SecretKey) -> Result<Vec<u8>, CipherError> {
        HybridCipher::decrypt_with_aad(
            secret,
            &self.payload,
            &acl_binding(self.payload.kdf, &self.acl),
        )
    }
}

/// Associated data tying a share to its ACL
///
/// Identities are length-prefixed in the set's sorted order.
fn acl_binding(kdf: Kdf, acl: &Acl) -> Vec<u8> {
    match kdf {
        Kdf::Legacy => Vec::new(),
        Kdf::Blake3 => {
            let mut aad = b"custody acl v1".to_vec();
            for identity in acl {
                let bytes = identity.as_str().as_bytes();
                aad.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                aad.extend_from_slice(bytes);
            }
            aad
        }
    }
}

/// Every encrypted share of one secret, in custodian assignment order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub key: String,
    pub threshold: u8,
    pub shares: Vec<EncryptedShare>,
}

impl SecretRecord {
    /// The record's access list
    ///
    /// Identical on every share; read from the first one.
    pub fn acl(&self) -> Acl {
        self.shares
            .first()
            .map(|share| share.acl.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::Identity;

    #[test]
    fn test_share_wire_format() {
        let key = SecretKey::generate();
        let share = EncryptedShare {
            custodian_url: "node-1.example".to_string(),
            payload: HybridCipher::encrypt(&key.public(), b"share", Kdf::Legacy).unwrap(),
            acl: [Identity::from("0xABC")].into_iter().collect(),
        };

        let json = serde_json::to_value(&share).unwrap();
        assert_eq!(json["custodianUrl"], "node-1.example");
        assert_eq!(json["acl"], serde_json::json!(["0xabc"]));
        assert!(json["iv"].is_string());
        assert!(json["ephemeralPublicKey"].is_string());

        let back: EncryptedShare = serde_json::from_value(json).unwrap();
        assert_eq!(back, share);
    }

    #[test]
    fn test_share_without_kdf_or_acl() {
        let key = SecretKey::generate();
        let sealed = HybridCipher::encrypt(&key.public(), b"share", Kdf::Legacy).unwrap();
        let mut json = serde_json::to_value(&sealed).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("kdf");
        object.insert("custodianUrl".to_string(), "n1".into());

        let share: EncryptedShare = serde_json::from_value(json).unwrap();
        assert_eq!(share.payload.kdf, Kdf::Legacy);
        assert!(share.acl.is_empty());
        assert_eq!(HybridCipher::decrypt(&key, &share.payload).unwrap(), b"share");
    }

    #[test]
    fn test_blake3_share_bound_to_acl() {
        let key = SecretKey::generate();
        let owner: Acl = [Identity::from("0xABC")].into_iter().collect();
        let share =
            EncryptedShare::seal("n1", &key.public(), b"share", Kdf::Blake3, owner).unwrap();
        assert_eq!(share.open(&key).unwrap(), b"share");

        let mut rewritten = share.clone();
        rewritten.acl = [Identity::from("0xDEF")].into_iter().collect();
        assert!(matches!(rewritten.open(&key), Err(CipherError::Authentication)));

        let mut widened = share;
        widened.acl.insert(Identity::from("0xDEF"));
        assert!(matches!(widened.open(&key), Err(CipherError::Authentication)));
    }

    #[test]
    fn test_legacy_share_ignores_acl() {
        let key = SecretKey::generate();
        let mut share =
            EncryptedShare::seal("n1", &key.public(), b"share", Kdf::Legacy, Acl::new()).unwrap();
        share.acl.insert(Identity::from("0xDEF"));
        assert_eq!(share.open(&key).unwrap(), b"share");
        assert_eq!(HybridCipher::decrypt(&key, &share.payload).unwrap(), b"share");
    }
}
