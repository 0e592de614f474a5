//! Custodian node registry
//!
//! The registry is the authority on which custodians exist right now. It is
//! consulted once per distribution; the resulting assignment is frozen into
//! each encrypted share, so later registry changes never affect recovery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;

/// A custodian node as published by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Custodian {
    #[serde(alias = "public_key")]
    pub public_key: PublicKey,
    pub url: String,
}

impl Custodian {
    pub fn new(public_key: PublicKey, url: impl Into<String>) -> Self {
        Self {
            public_key,
            url: url.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    #[error("registry returned an invalid entry: {0}")]
    InvalidEntry(String),
}

#[async_trait]
pub trait NodeRegistry: Send + Sync + std::fmt::Debug {
    /// The current, authoritative list of custodians, in assignment order
    async fn list_custodians(&self) -> Result<Vec<Custodian>, RegistryError>;
}

/// Registry backed by a fixed list, usually loaded from node configuration
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    custodians: Vec<Custodian>,
}

impl StaticRegistry {
    pub fn new(custodians: Vec<Custodian>) -> Self {
        Self { custodians }
    }

    pub fn len(&self) -> usize {
        self.custodians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custodians.is_empty()
    }
}

#[async_trait]
impl NodeRegistry for StaticRegistry {
    async fn list_custodians(&self) -> Result<Vec<Custodian>, RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for custodian in &self.custodians {
            if !seen.insert(custodian.public_key) {
                return Err(RegistryError::InvalidEntry(format!(
                    "duplicate custodian {}",
                    custodian.public_key
                )));
            }
        }
        Ok(self.custodians.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;

    #[tokio::test]
    async fn test_static_registry_preserves_order() {
        let a = Custodian::new(SecretKey::generate().public(), "node-a.example");
        let b = Custodian::new(SecretKey::generate().public(), "node-b.example");
        let registry = StaticRegistry::new(vec![a.clone(), b.clone()]);

        assert_eq!(registry.list_custodians().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_duplicate_members_rejected() {
        let key = SecretKey::generate().public();
        let registry = StaticRegistry::new(vec![
            Custodian::new(key, "node-a.example"),
            Custodian::new(key, "node-b.example"),
        ]);

        assert!(matches!(
            registry.list_custodians().await,
            Err(RegistryError::InvalidEntry(_))
        ));
    }

    #[test]
    fn test_custodian_accepts_snake_case() {
        let key = SecretKey::generate().public();
        let toml_like = serde_json::json!({ "public_key": key.to_hex(), "url": "n1" });
        let custodian: Custodian = serde_json::from_value(toml_like).unwrap();
        assert_eq!(custodian.public_key, key);
    }
}
