use std::sync::Arc;

use super::error::CustodyError;
use super::record::{EncryptedShare, SecretRecord};
use crate::auth::Acl;
use crate::crypto::Kdf;
use crate::registry::NodeRegistry;
use crate::sharing::ShareCodec;
use crate::store::ShareStore;

/// Default number of shares needed to recover a secret
pub const DEFAULT_THRESHOLD: u8 = 3;

/// Splits a secret across the registered custodians and stores the result
#[derive(Debug, Clone)]
pub struct DistributionOrchestrator<S> {
    store: S,
    registry: Arc<dyn NodeRegistry>,
    threshold: u8,
    kdf: Kdf,
}

impl<S: ShareStore> DistributionOrchestrator<S> {
    pub fn new(store: S, registry: Arc<dyn NodeRegistry>) -> Self {
        Self {
            store,
            registry,
            threshold: DEFAULT_THRESHOLD,
            kdf: Kdf::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_kdf(mut self, kdf: Kdf) -> Self {
        self.kdf = kdf;
        self
    }

    /// Split `secret`, encrypt share `i` to custodian `i`, and store the
    /// record under `key`
    ///
    /// Nothing is stored unless every step succeeds.
    pub async fn distribute(
        &self,
        key: &str,
        secret: &[u8],
        acl: Acl,
    ) -> Result<SecretRecord, CustodyError> {
        if key.is_empty() {
            return Err(CustodyError::InvalidInput("key is required".to_string()));
        }
        if secret.is_empty() {
            return Err(CustodyError::InvalidInput("value is required".to_string()));
        }
        if self.store.exists(key).await? {
            return Err(CustodyError::AlreadyExists(key.to_string()));
        }

        let custodians = self.registry.list_custodians().await?;
        if custodians.is_empty() {
            return Err(CustodyError::NotConfigured(
                "no custodians registered".to_string(),
            ));
        }
        if self.threshold as usize > custodians.len() {
            return Err(CustodyError::InvalidInput(format!(
                "threshold {} exceeds {} registered custodians",
                self.threshold,
                custodians.len()
            )));
        }

        let shares = ShareCodec::split(secret, self.threshold, custodians.len())?;
        let shares = shares
            .iter()
            .zip(&custodians)
            .map(|(share, custodian)| {
                EncryptedShare::seal(
                    custodian.url.clone(),
                    &custodian.public_key,
                    share.as_bytes(),
                    self.kdf,
                    acl.clone(),
                )
                .map_err(|e| CustodyError::Internal(e.to_string()))
            })
            .collect::<Result<Vec<_>, CustodyError>>()?;

        let record = SecretRecord {
            key: key.to_string(),
            threshold: self.threshold,
            shares,
        };
        self.store.put(&record).await?;

        tracing::info!(
            key,
            custodians = custodians.len(),
            threshold = self.threshold,
            "distributed secret"
        );
        Ok(record)
    }
}
