//! Shared setup for custody integration tests
#![allow(dead_code)]

use std::sync::{Arc, Once};

use ::common::auth::{Acl, AuthVerifier, Identity};
use ::common::custody::{DistributionOrchestrator, RecoveryOrchestrator};
use ::common::session::{NoncePolicyKind, SessionNonceManager};
use ::common::store::{MemorySessionStore, MemoryShareStore};
use ::common::testkit::TestCluster;
use tracing_subscriber::EnvFilter;

/// Everything a test needs to distribute and recover against one cluster
pub struct TestEnv {
    pub cluster: TestCluster,
    pub store: MemoryShareStore,
    pub sessions: SessionNonceManager<MemorySessionStore>,
    pub distributor: DistributionOrchestrator<MemoryShareStore>,
    pub recoverer: RecoveryOrchestrator<MemoryShareStore>,
}

/// Route test logs through the test writer, filtered by `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// `size` in-process custodians, in-memory stores, and the given threshold
pub fn setup_test_env(size: usize, threshold: u8) -> TestEnv {
    env_for_cluster(TestCluster::new(size), threshold)
}

pub fn env_for_cluster(cluster: TestCluster, threshold: u8) -> TestEnv {
    env_with_policy(cluster, threshold, NoncePolicyKind::Latest)
}

pub fn env_with_policy(cluster: TestCluster, threshold: u8, policy: NoncePolicyKind) -> TestEnv {
    init_tracing();
    let store = MemoryShareStore::new();
    let sessions = SessionNonceManager::with_policy(MemorySessionStore::new(), policy.policy());
    let distributor =
        DistributionOrchestrator::new(store.clone(), cluster.registry()).with_threshold(threshold);
    let verifier = AuthVerifier::new().with_replay_guard(Arc::new(sessions.clone()));
    let recoverer = RecoveryOrchestrator::new(store.clone(), verifier, cluster.client());
    TestEnv {
        cluster,
        store,
        sessions,
        distributor,
        recoverer,
    }
}

pub fn acl(identities: &[Identity]) -> Acl {
    identities.iter().cloned().collect()
}
