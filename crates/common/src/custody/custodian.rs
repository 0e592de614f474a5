//! The custodian side of recovery
//!
//! A custodian holds one node key and answers decrypt requests for shares
//! encrypted to it. The orchestrating node reaches custodians through a
//! [`CustodianClient`]; the daemon provides an HTTP implementation and the
//! testkit an in-process one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use url::Url;

use super::error::{CustodyError, ErrorKind};
use super::record::EncryptedShare;
use crate::auth::{Authorization, AuthVerifier};
use crate::crypto::{PublicKey, SecretKey};

/// Body of a custodian decrypt call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptRequest {
    pub encrypted_share: EncryptedShare,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
}

#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResponse {
    #[serde_as(as = "Base64")]
    pub decrypted_share: Vec<u8>,
}

impl std::fmt::Debug for DecryptResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptResponse")
            .field("decrypted_share", &format_args!("<{} bytes>", self.decrypted_share.len()))
            .finish()
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CustodianError {
    #[error("custodian {url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("custodian {url} timed out")]
    Timeout { url: String },
    /// The custodian answered with a structured error
    #[error("custodian {url} refused: {message}")]
    Refused {
        url: String,
        kind: ErrorKind,
        message: String,
    },
}

impl From<CustodianError> for CustodyError {
    fn from(e: CustodianError) -> Self {
        match e {
            CustodianError::Refused { kind, message, .. } => CustodyError::from_kind(kind, message),
            other => CustodyError::CustodianUnavailable(other.to_string()),
        }
    }
}

/// Transport to remote custodians
#[async_trait]
pub trait CustodianClient: Send + Sync + std::fmt::Debug {
    /// Ask the custodian at `request.encrypted_share.custodian_url` to
    /// decrypt its share
    async fn decrypt(&self, request: DecryptRequest) -> Result<DecryptResponse, CustodianError>;
}

/// Resolve a registry URL to the custodian's decrypt endpoint
///
/// Registry entries are usually bare hosts; those are reached over https.
pub fn custodian_endpoint(custodian_url: &str) -> Result<Url, url::ParseError> {
    let custodian_url = custodian_url.trim().trim_end_matches('/');
    let base = if custodian_url.contains("://") {
        Url::parse(custodian_url)?
    } else {
        Url::parse(&format!("https://{}", custodian_url))?
    };
    if base.cannot_be_a_base() || base.host_str().is_none() {
        return Err(url::ParseError::EmptyHost);
    }
    base.join(&format!("{}/api/v0/decrypt", base.path().trim_end_matches('/')))
}

/// Decrypt handler state of a custodian node
#[derive(Debug, Clone, Default)]
pub struct CustodianNode {
    secret: Option<SecretKey>,
    gate: Option<AuthVerifier>,
}

impl CustodianNode {
    pub fn new(secret: Option<SecretKey>) -> Self {
        Self { secret, gate: None }
    }

    /// Require a valid authorization on every decrypt
    ///
    /// The gate checks signature, freshness and the share's ACL. Only shares
    /// sealed under [`Kdf::Blake3`](crate::crypto::Kdf::Blake3) authenticate
    /// their ACL; for legacy shares the gate proves only that the caller
    /// signed.
    pub fn with_gate(mut self, gate: AuthVerifier) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.secret.as_ref().map(SecretKey::public)
    }

    pub async fn decrypt_share(&self, request: &DecryptRequest) -> Result<Vec<u8>, CustodyError> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| CustodyError::NotConfigured("node has no private key".to_string()))?;

        if let Some(gate) = &self.gate {
            let authorization = request.authorization.as_ref().ok_or_else(|| {
                CustodyError::Authentication("decrypt requires an authorization".to_string())
            })?;
            gate.verify(
                &authorization.signature,
                &authorization.message,
                &request.encrypted_share.acl,
            )
            .await?;
        }

        request.encrypted_share.open(secret).map_err(|e| {
            tracing::warn!(
                custodian_url = %request.encrypted_share.custodian_url,
                "share decryption failed: {}",
                e
            );
            CustodyError::from(e)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::Acl;
    use crate::crypto::{HybridCipher, Kdf};
    use crate::testkit::TestWallet;

    fn share_for(key: &SecretKey, acl: Acl) -> EncryptedShare {
        EncryptedShare {
            custodian_url: "node-1.example".to_string(),
            payload: HybridCipher::encrypt(&key.public(), b"share-bytes", Kdf::Legacy).unwrap(),
            acl,
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            custodian_endpoint("node-1.example").unwrap().as_str(),
            "https://node-1.example/api/v0/decrypt"
        );
        assert_eq!(
            custodian_endpoint("http://127.0.0.1:5001/").unwrap().as_str(),
            "http://127.0.0.1:5001/api/v0/decrypt"
        );
        assert_eq!(
            custodian_endpoint("https://gw.example/custody").unwrap().as_str(),
            "https://gw.example/custody/api/v0/decrypt"
        );
        assert!(custodian_endpoint("").is_err());
        assert!(custodian_endpoint("http://").is_err());
    }

    #[tokio::test]
    async fn test_decrypt_without_key() {
        let key = SecretKey::generate();
        let node = CustodianNode::new(None);
        let request = DecryptRequest {
            encrypted_share: share_for(&key, Acl::new()),
            authorization: None,
        };
        assert_eq!(
            node.decrypt_share(&request).await.unwrap_err().kind(),
            ErrorKind::NotConfigured
        );
    }

    #[tokio::test]
    async fn test_decrypt_wrong_node() {
        let node = CustodianNode::new(Some(SecretKey::generate()));
        let request = DecryptRequest {
            encrypted_share: share_for(&SecretKey::generate(), Acl::new()),
            authorization: None,
        };
        assert_eq!(
            node.decrypt_share(&request).await.unwrap_err().kind(),
            ErrorKind::DecryptionError
        );
    }

    #[tokio::test]
    async fn test_gate_checks_acl() {
        let key = SecretKey::generate();
        let owner = TestWallet::generate();
        let stranger = TestWallet::generate();
        let acl: Acl = [owner.identity()].into_iter().collect();
        let node = CustodianNode::new(Some(key.clone())).with_gate(AuthVerifier::new());

        let unauthenticated = DecryptRequest {
            encrypted_share: share_for(&key, acl.clone()),
            authorization: None,
        };
        assert_eq!(
            node.decrypt_share(&unauthenticated).await.unwrap_err().kind(),
            ErrorKind::AuthenticationFailure
        );

        let now = chrono::Utc::now().timestamp_millis();
        let (message, signature) = stranger.sign_message("n", now);
        let foreign = DecryptRequest {
            encrypted_share: share_for(&key, acl.clone()),
            authorization: Some(Authorization { signature, message }),
        };
        assert_eq!(
            node.decrypt_share(&foreign).await.unwrap_err().kind(),
            ErrorKind::Unauthorized
        );

        let (message, signature) = owner.sign_message("n", now);
        let allowed = DecryptRequest {
            encrypted_share: share_for(&key, acl),
            authorization: Some(Authorization { signature, message }),
        };
        assert_eq!(node.decrypt_share(&allowed).await.unwrap(), b"share-bytes");
    }

    #[tokio::test]
    async fn test_gate_rejects_rewritten_acl() {
        let key = SecretKey::generate();
        let owner = TestWallet::generate();
        let attacker = TestWallet::generate();
        let node = CustodianNode::new(Some(key.clone())).with_gate(AuthVerifier::new());

        let mut encrypted_share = EncryptedShare::seal(
            "node-1.example",
            &key.public(),
            b"share-bytes",
            Kdf::Blake3,
            [owner.identity()].into_iter().collect(),
        )
        .unwrap();
        encrypted_share.acl = [attacker.identity()].into_iter().collect();

        let now = chrono::Utc::now().timestamp_millis();
        let (message, signature) = attacker.sign_message("n", now);
        let forged = DecryptRequest {
            encrypted_share,
            authorization: Some(Authorization { signature, message }),
        };
        assert_eq!(
            node.decrypt_share(&forged).await.unwrap_err().kind(),
            ErrorKind::DecryptionError
        );
    }

    #[test]
    fn test_response_wire_format() {
        let response = DecryptResponse {
            decrypted_share: vec![1, 2, 3],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "decryptedShare": "AQID" })
        );
    }
}
