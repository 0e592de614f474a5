use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::auth::AuthVerifier;
use crate::crypto::SecretKey;
use crate::custody::{CustodianClient, CustodianError, CustodianNode, DecryptRequest, DecryptResponse};
use crate::registry::{Custodian, StaticRegistry};

/// In-process custodian transport
///
/// Routes each decrypt request to the [`CustodianNode`] registered under the
/// share's custodian URL and counts every call, including failed ones.
#[derive(Debug, Clone, Default)]
pub struct LocalCustodianClient {
    nodes: Arc<RwLock<HashMap<String, CustodianNode>>>,
    unreachable: Arc<RwLock<HashSet<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
    calls_by_url: Arc<RwLock<HashMap<String, usize>>>,
}

impl LocalCustodianClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: impl Into<String>, node: CustodianNode) {
        self.nodes.write().insert(url.into(), node);
    }

    /// Make the custodian at `url` fail every call as unreachable
    pub fn set_unreachable(&self, url: impl Into<String>) {
        self.unreachable.write().insert(url.into());
    }

    /// Delay every answer by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls_by_url.read().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CustodianClient for LocalCustodianClient {
    async fn decrypt(&self, request: DecryptRequest) -> Result<DecryptResponse, CustodianError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.encrypted_share.custodian_url.clone();
        *self.calls_by_url.write().entry(url.clone()).or_default() += 1;

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let unreachable = self.unreachable.read().contains(&url);
        if unreachable {
            return Err(CustodianError::Unreachable {
                url,
                reason: "connection refused".to_string(),
            });
        }

        let node = self.nodes.read().get(&url).cloned();
        let node = node.ok_or_else(|| CustodianError::Unreachable {
            url: url.clone(),
            reason: "no such custodian".to_string(),
        })?;

        node.decrypt_share(&request)
            .await
            .map(|decrypted_share| DecryptResponse { decrypted_share })
            .map_err(|e| CustodianError::Refused {
                url,
                kind: e.kind(),
                message: e.to_string(),
            })
    }
}

/// A set of in-process custodians with a matching registry and transport
#[derive(Debug, Clone)]
pub struct TestCluster {
    keys: Vec<SecretKey>,
    custodians: Vec<Custodian>,
    client: LocalCustodianClient,
}

impl TestCluster {
    /// Start `size` custodians at `custodian-{i}.test`
    pub fn new(size: usize) -> Self {
        let client = LocalCustodianClient::new();
        let mut keys = Vec::with_capacity(size);
        let mut custodians = Vec::with_capacity(size);
        for i in 0..size {
            let key = SecretKey::generate();
            let url = format!("custodian-{}.test", i);
            client.register(url.clone(), CustodianNode::new(Some(key.clone())));
            custodians.push(Custodian::new(key.public(), url));
            keys.push(key);
        }
        Self {
            keys,
            custodians,
            client,
        }
    }

    /// Require every custodian to verify the caller before decrypting
    pub fn with_gate(self, gate: AuthVerifier) -> Self {
        for (key, custodian) in self.keys.iter().zip(&self.custodians) {
            self.client.register(
                custodian.url.clone(),
                CustodianNode::new(Some(key.clone())).with_gate(gate.clone()),
            );
        }
        self
    }

    pub fn custodians(&self) -> &[Custodian] {
        &self.custodians
    }

    pub fn key(&self, index: usize) -> &SecretKey {
        &self.keys[index]
    }

    pub fn registry(&self) -> Arc<StaticRegistry> {
        Arc::new(StaticRegistry::new(self.custodians.clone()))
    }

    pub fn client(&self) -> Arc<LocalCustodianClient> {
        Arc::new(self.client.clone())
    }

    pub fn transport(&self) -> &LocalCustodianClient {
        &self.client
    }

    /// Decrypt calls made so far, across all custodians
    pub fn calls(&self) -> usize {
        self.client.calls()
    }
}
