//! Replay-protection nonces
//!
//! Each identity owns a nonce history, most recent first. A recovery message
//! must carry the most recently issued nonce. What happens to that nonce
//! once accepted is a [`NoncePolicy`] decision:
//!
//! - [`LatestNonce`] (default) leaves it in place, so a captured message
//!   stays valid until the identity requests a newer nonce
//! - [`SingleUse`] consumes it, so each nonce authorizes one recovery

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, Identity, ReplayGuard};
use crate::store::{SessionStore, StoreError};

/// Length of an issued nonce, in alphanumeric characters
pub const NONCE_LENGTH: usize = 17;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(String),
}

impl<T: std::fmt::Display> From<StoreError<T>> for SessionError {
    fn from(e: StoreError<T>) -> Self {
        SessionError::Store(e.to_string())
    }
}

pub trait NoncePolicy: Send + Sync + Debug {
    /// Whether `claimed` is acceptable given the history, most recent first
    fn accepts(&self, history: &[String], claimed: &str) -> bool {
        !claimed.is_empty() && history.first().map(String::as_str) == Some(claimed)
    }

    /// The history to persist after `claimed` was accepted, `None` to leave it
    fn consume(&self, history: &[String], claimed: &str) -> Option<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LatestNonce;

impl NoncePolicy for LatestNonce {
    fn consume(&self, _history: &[String], _claimed: &str) -> Option<Vec<String>> {
        None
    }
}

/// Consumes a nonce by pushing an empty tombstone in front of it, so no
/// older nonce becomes current again.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleUse;

impl NoncePolicy for SingleUse {
    fn consume(&self, history: &[String], _claimed: &str) -> Option<Vec<String>> {
        let mut remaining = Vec::with_capacity(history.len() + 1);
        remaining.push(String::new());
        remaining.extend_from_slice(history);
        Some(remaining)
    }
}

/// Configuration name of a nonce policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicyKind {
    #[default]
    Latest,
    SingleUse,
}

impl NoncePolicyKind {
    pub fn policy(&self) -> Arc<dyn NoncePolicy> {
        match self {
            NoncePolicyKind::Latest => Arc::new(LatestNonce),
            NoncePolicyKind::SingleUse => Arc::new(SingleUse),
        }
    }
}

impl std::str::FromStr for NoncePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(NoncePolicyKind::Latest),
            "single_use" => Ok(NoncePolicyKind::SingleUse),
            other => Err(format!("unknown nonce policy '{}'", other)),
        }
    }
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

type LockMap = parking_lot::Mutex<HashMap<Identity, Arc<tokio::sync::Mutex<()>>>>;

/// Exclusive hold on one identity's sessions
///
/// On drop the identity's lock is removed from the map unless another task
/// is already waiting on it.
struct IdentityGuard<'a> {
    locks: &'a LockMap,
    identity: &'a Identity,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for IdentityGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // clones are only handed out under the map lock
        let mut locks = self.locks.lock();
        if locks
            .get(self.identity)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(self.identity);
        }
    }
}

/// Issues and validates nonces over a [`SessionStore`]
///
/// Operations on one identity are serialized through a keyed async lock so
/// a validate never interleaves with an issue for the same caller.
#[derive(Debug, Clone)]
pub struct SessionNonceManager<S> {
    store: S,
    policy: Arc<dyn NoncePolicy>,
    locks: Arc<LockMap>,
}

impl<S: SessionStore> SessionNonceManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, Arc::new(LatestNonce))
    }

    pub fn with_policy(store: S, policy: Arc<dyn NoncePolicy>) -> Self {
        Self {
            store,
            policy,
            locks: Default::default(),
        }
    }

    async fn lock_identity<'a>(&'a self, identity: &'a Identity) -> IdentityGuard<'a> {
        let lock = self
            .locks
            .lock()
            .entry(identity.clone())
            .or_default()
            .clone();
        IdentityGuard {
            locks: &*self.locks,
            identity,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_identities(&self) -> usize {
        self.locks.lock().len()
    }

    /// Issue a fresh nonce for `identity`, making it the only acceptable one
    pub async fn issue(&self, identity: &Identity) -> Result<String, SessionError> {
        let _guard = self.lock_identity(identity).await;

        let nonce = generate_nonce();
        let mut history = self.store.history(identity.as_str()).await?;
        history.insert(0, nonce.clone());
        self.store.replace(identity.as_str(), history).await?;

        tracing::debug!(%identity, "issued nonce");
        Ok(nonce)
    }

    /// Whether `claimed` is the identity's current nonce
    ///
    /// Applies the policy's consumption rule when it is.
    pub async fn validate(&self, identity: &Identity, claimed: &str) -> Result<bool, SessionError> {
        let _guard = self.lock_identity(identity).await;

        let history = self.store.history(identity.as_str()).await?;
        if !self.policy.accepts(&history, claimed) {
            return Ok(false);
        }
        if let Some(remaining) = self.policy.consume(&history, claimed) {
            self.store.replace(identity.as_str(), remaining).await?;
        }
        Ok(true)
    }
}

#[async_trait]
impl<S: SessionStore> ReplayGuard for SessionNonceManager<S> {
    async fn check(&self, identity: &Identity, nonce: &str) -> Result<(), AuthError> {
        match self.validate(identity, nonce).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthError::Replay),
            Err(e) => Err(AuthError::Session(e.to_string())),
        }
    }
}
