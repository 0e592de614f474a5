use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;

use super::custodian::{custodian_endpoint, CustodianClient, CustodianError, DecryptRequest};
use super::error::CustodyError;
use crate::auth::{AuthVerifier, RecoveryRequest};
use crate::quorum;
use crate::sharing::{Share, ShareCodec};
use crate::store::ShareStore;

/// Default bound on a single custodian decrypt call
pub const DEFAULT_CUSTODIAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Authorizes a caller and reassembles a secret from a random quorum
#[derive(Debug, Clone)]
pub struct RecoveryOrchestrator<S> {
    store: S,
    verifier: AuthVerifier,
    client: Arc<dyn CustodianClient>,
    timeout: Duration,
}

impl<S: ShareStore> RecoveryOrchestrator<S> {
    pub fn new(store: S, verifier: AuthVerifier, client: Arc<dyn CustodianClient>) -> Self {
        Self {
            store,
            verifier,
            client,
            timeout: DEFAULT_CUSTODIAN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recover the secret stored under `request.key`
    ///
    /// Exactly `threshold` shares are decrypted, chosen uniformly at random
    /// among those whose custodian can be addressed. A failure from any
    /// selected custodian fails the recovery; there is no retry.
    pub async fn recover(&self, request: &RecoveryRequest) -> Result<Vec<u8>, CustodyError> {
        if request.key.is_empty() {
            return Err(CustodyError::InvalidInput("key is required".to_string()));
        }

        let record = self.store.get(&request.key).await?;
        let identity = self
            .verifier
            .verify(&request.signature, &request.message, &record.acl())
            .await
            .inspect_err(|e| tracing::warn!(key = %request.key, "recovery rejected: {}", e))?;

        let addressable: Vec<_> = record
            .shares
            .iter()
            .filter(|share| match custodian_endpoint(&share.custodian_url) {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(
                        custodian_url = %share.custodian_url,
                        "skipping share with unusable custodian url: {}",
                        e
                    );
                    false
                }
            })
            .collect();
        let selected = quorum::select(&addressable, record.threshold as usize)?;

        let authorization = request.authorization();
        let calls = selected.into_iter().map(|share| {
            let request = DecryptRequest {
                encrypted_share: share.clone(),
                authorization: Some(authorization.clone()),
            };
            let url = share.custodian_url.clone();
            async move {
                let response = tokio::time::timeout(self.timeout, self.client.decrypt(request))
                    .await
                    .map_err(|_| CustodianError::Timeout { url })??;
                let share = Share::from_bytes(response.decrypted_share)?;
                Ok::<_, CustodyError>(share)
            }
        });
        let shares = try_join_all(calls).await?;

        let secret = ShareCodec::combine(&shares, record.threshold)?;
        tracing::info!(key = %request.key, %identity, "recovered secret");
        Ok(secret)
    }
}
