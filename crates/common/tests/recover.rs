//! Integration tests for authorized quorum recovery

mod common;

use std::sync::Arc;
use std::time::Duration;

use ::common::auth::{AuthVerifier, Identity};
use ::common::crypto::Kdf;
use ::common::custody::{DistributionOrchestrator, ErrorKind, RecoveryOrchestrator};
use ::common::registry::{Custodian, StaticRegistry};
use ::common::session::NoncePolicyKind;
use ::common::store::MemoryShareStore;
use ::common::testkit::{TestCluster, TestWallet, TonWallet};
use chrono::Utc;

#[tokio::test]
async fn test_end_to_end_hello_world() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();

    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let recovered = env
        .recoverer
        .recover(&owner.recovery_request("k1", &nonce))
        .await
        .unwrap();
    assert_eq!(recovered, b"hello-world");
    // exactly a threshold of custodians were asked
    assert_eq!(env.cluster.calls(), 3);
}

#[tokio::test]
async fn test_stranger_unauthorized_without_decrypts() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    let stranger = TestWallet::generate();

    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&stranger.identity()).await.unwrap();

    let err = env
        .recoverer
        .recover(&stranger.recovery_request("k1", &nonce))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(env.cluster.calls(), 0);
}

#[tokio::test]
async fn test_checksummed_acl_entry_matches() {
    let env = common::setup_test_env(3, 2);
    let owner = TestWallet::generate();
    let checksummed = owner.address().to_uppercase().replacen("0X", "0x", 1);

    env.distributor
        .distribute("k1", b"mixed case", common::acl(&[Identity::from(checksummed)]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    assert_eq!(
        env.recoverer
            .recover(&owner.recovery_request("k1", &nonce))
            .await
            .unwrap(),
        b"mixed case"
    );
}

#[tokio::test]
async fn test_expired_message() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let six_minutes_ago = Utc::now().timestamp_millis() - 6 * 60 * 1000;
    let (message, signature) = owner.sign_message(&nonce, six_minutes_ago);
    let request = ::common::auth::RecoveryRequest {
        key: "k1".to_string(),
        signature,
        message,
    };

    let err = env.recoverer.recover(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExpiredRequest);
    assert_eq!(env.cluster.calls(), 0);
}

#[tokio::test]
async fn test_superseded_nonce_rejected() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();

    let old = env.sessions.issue(&owner.identity()).await.unwrap();
    let _new = env.sessions.issue(&owner.identity()).await.unwrap();

    let err = env
        .recoverer
        .recover(&owner.recovery_request("k1", &old))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReplayRejected);
    assert_eq!(env.cluster.calls(), 0);
}

#[tokio::test]
async fn test_single_use_nonce_replay_rejected() {
    let env = common::env_with_policy(TestCluster::new(4), 3, NoncePolicyKind::SingleUse);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let request = owner.recovery_request("k1", &nonce);
    assert_eq!(env.recoverer.recover(&request).await.unwrap(), b"hello-world");
    assert_eq!(env.cluster.calls(), 3);

    // the same signed request again
    let err = env.recoverer.recover(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReplayRejected);
    assert_eq!(env.cluster.calls(), 3);
}

#[tokio::test]
async fn test_latest_policy_accepts_used_nonce_again() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let request = owner.recovery_request("k1", &nonce);
    env.recoverer.recover(&request).await.unwrap();
    assert_eq!(env.recoverer.recover(&request).await.unwrap(), b"hello-world");
}

#[tokio::test]
async fn test_never_issued_nonce_rejected() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();

    let err = env
        .recoverer
        .recover(&owner.recovery_request("k1", "madeUpNonce123456"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReplayRejected);
}

#[tokio::test]
async fn test_forged_signature() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    let forger = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    // the forger signs a message claiming the owner's address
    let message = owner.message(&nonce, Utc::now().timestamp_millis());
    let request = ::common::auth::RecoveryRequest {
        key: "k1".to_string(),
        signature: forger.sign(&message),
        message,
    };

    let err = env.recoverer.recover(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    assert_eq!(env.cluster.calls(), 0);
}

#[tokio::test]
async fn test_missing_key() {
    let env = common::setup_test_env(4, 3);
    let owner = TestWallet::generate();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let err = env
        .recoverer
        .recover(&owner.recovery_request("nope", &nonce))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unreachable_custodian_fails_recovery() {
    let env = common::setup_test_env(3, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    env.cluster
        .transport()
        .set_unreachable(env.cluster.custodians()[1].url.clone());
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let err = env
        .recoverer
        .recover(&owner.recovery_request("k1", &nonce))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustodianUnavailable);
}

#[tokio::test(start_paused = true)]
async fn test_slow_custodian_times_out() {
    let env = common::setup_test_env(3, 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    env.cluster.transport().set_delay(Duration::from_secs(30));
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    let err = env
        .recoverer
        .recover(&owner.recovery_request("k1", &nonce))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustodianUnavailable);
}

#[tokio::test]
async fn test_unaddressable_custodians_excluded_from_quorum() {
    let cluster = TestCluster::new(4);
    let mut custodians: Vec<Custodian> = cluster.custodians().to_vec();
    custodians[2].url = "http://".to_string();

    let store = MemoryShareStore::new();
    let owner = TestWallet::generate();
    DistributionOrchestrator::new(store.clone(), Arc::new(StaticRegistry::new(custodians)))
        .with_threshold(3)
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();

    let recoverer = RecoveryOrchestrator::new(store, AuthVerifier::new(), cluster.client());
    for _ in 0..5 {
        let recovered = recoverer
            .recover(&owner.recovery_request("k1", "unused"))
            .await
            .unwrap();
        assert_eq!(recovered, b"hello-world");
    }
    assert_eq!(cluster.calls(), 15);
}

#[tokio::test]
async fn test_too_few_addressable_custodians() {
    let cluster = TestCluster::new(3);
    let mut custodians: Vec<Custodian> = cluster.custodians().to_vec();
    custodians[0].url = "http://".to_string();

    let store = MemoryShareStore::new();
    let owner = TestWallet::generate();
    DistributionOrchestrator::new(store.clone(), Arc::new(StaticRegistry::new(custodians)))
        .with_threshold(3)
        .distribute("k1", b"hello-world", common::acl(&[owner.identity()]))
        .await
        .unwrap();

    let recoverer = RecoveryOrchestrator::new(store, AuthVerifier::new(), cluster.client());
    let err = recoverer
        .recover(&owner.recovery_request("k1", "unused"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CustodianUnavailable);
    assert_eq!(cluster.calls(), 0);
}

#[tokio::test]
async fn test_gated_custodians() {
    let env = common::env_for_cluster(TestCluster::new(4).with_gate(AuthVerifier::new()), 3);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"gated", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    assert_eq!(
        env.recoverer
            .recover(&owner.recovery_request("k1", &nonce))
            .await
            .unwrap(),
        b"gated"
    );
}

#[tokio::test]
async fn test_gated_custodians_with_acl_bound_shares() {
    let env = common::env_for_cluster(TestCluster::new(4).with_gate(AuthVerifier::new()), 3);
    let owner = TestWallet::generate();
    env.distributor
        .clone()
        .with_kdf(Kdf::Blake3)
        .distribute("k1", b"bound", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    assert_eq!(
        env.recoverer
            .recover(&owner.recovery_request("k1", &nonce))
            .await
            .unwrap(),
        b"bound"
    );
}

#[tokio::test]
async fn test_state_init_wallet_recovery() {
    let env = common::setup_test_env(4, 3);
    let owner = TonWallet::generate();
    env.distributor
        .distribute("ton-key", b"ton secret", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    assert_eq!(
        env.recoverer
            .recover(&owner.recovery_request("ton-key", &nonce))
            .await
            .unwrap(),
        b"ton secret"
    );
}

#[tokio::test]
async fn test_quorum_varies_between_calls() {
    let env = common::setup_test_env(6, 2);
    let owner = TestWallet::generate();
    env.distributor
        .distribute("k1", b"spread", common::acl(&[owner.identity()]))
        .await
        .unwrap();
    let nonce = env.sessions.issue(&owner.identity()).await.unwrap();

    for _ in 0..60 {
        env.recoverer
            .recover(&owner.recovery_request("k1", &nonce))
            .await
            .unwrap();
    }
    assert_eq!(env.cluster.calls(), 120);
    for custodian in env.cluster.custodians() {
        assert!(env.cluster.transport().calls_to(&custodian.url) > 0);
    }
}
