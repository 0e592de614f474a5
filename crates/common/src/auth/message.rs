use serde::{Deserialize, Serialize};

use super::{AuthError, Identity};

/// The payload a caller signs to prove control of an identity
///
/// Carried as a JSON string; the signature covers that exact string, so
/// the verifier checks the signature against the raw text and only trusts
/// the parsed fields afterwards.
///
/// ```text
/// {"nonce":"...","timestamp":1718000000000,"address":"0x...","chain":"evm"}
/// {"nonce":"...","timestamp":1718000000000,"rawaddress":"0:...","chain":"ton",
///  "stateInit":"<base64>","publicKey":"<hex>"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub nonce: String,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rawaddress: Option<String>,
    pub chain: String,
    #[serde(default, rename = "stateInit", skip_serializing_if = "Option::is_none")]
    pub state_init: Option<String>,
    #[serde(default, rename = "publicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl SignedMessage {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        serde_json::from_str(raw)
            .map_err(|e| AuthError::Malformed(format!("message is not valid JSON: {}", e)))
    }

    /// The identity this message claims, `address` taking precedence
    pub fn claimed_identity(&self) -> Option<Identity> {
        self.address
            .as_deref()
            .or(self.rawaddress.as_deref())
            .map(Identity::new)
            .filter(|identity| !identity.is_empty())
    }

    pub fn to_json(&self) -> String {
        // a struct of strings and integers always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Proof of identity forwarded alongside a decrypt request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub signature: String,
    pub message: String,
}

/// A request to recover the secret stored under `key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRequest {
    pub key: String,
    pub signature: String,
    pub message: String,
}

impl RecoveryRequest {
    pub fn authorization(&self) -> Authorization {
        Authorization {
            signature: self.signature.clone(),
            message: self.message.clone(),
        }
    }
}
