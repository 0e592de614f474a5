//! Caller authentication and authorization for recovery
//!
//! A recovery request passes four gates, in order, and the first failure
//! aborts it:
//!
//! 1. **Signature**: the chain scheme named by the message proves the caller
//!    controls the claimed identity
//! 2. **Freshness**: the signed timestamp is at most [`MAX_MESSAGE_AGE`] old
//! 3. **Nonce**: the signed nonce is accepted by the [`ReplayGuard`], when one
//!    is installed
//! 4. **ACL**: the identity is listed on the record
//!
//! Custodians run the same verifier without a replay guard; the session
//! history lives on the orchestrating node.

mod evm;
mod identity;
mod message;
mod scheme;
mod ton;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

pub use evm::{address_of, eip191_hash, recover_address, EvmScheme};
pub use identity::{Acl, Identity};
pub use message::{Authorization, RecoveryRequest, SignedMessage};
pub use scheme::SignatureScheme;
pub use ton::{contract_address, StateInitScheme};

/// Oldest signed message accepted, measured from its timestamp
pub const MAX_MESSAGE_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("request expired")]
    Expired,
    #[error("nonce rejected")]
    Replay,
    #[error("identity is not authorized for this secret")]
    Unauthorized,
    #[error("session error: {0}")]
    Session(String),
}

/// Decides whether a signed nonce may be used by an identity
#[async_trait]
pub trait ReplayGuard: Send + Sync + std::fmt::Debug {
    async fn check(&self, identity: &Identity, nonce: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Clone)]
pub struct AuthVerifier {
    schemes: Arc<Vec<Box<dyn SignatureScheme>>>,
    replay_guard: Option<Arc<dyn ReplayGuard>>,
    max_age: Duration,
}

impl Default for AuthVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthVerifier {
    /// A verifier for the `evm` and `ton` schemes with no replay guard
    pub fn new() -> Self {
        Self {
            schemes: Arc::new(vec![Box::new(EvmScheme), Box::new(StateInitScheme)]),
            replay_guard: None,
            max_age: MAX_MESSAGE_AGE,
        }
    }

    pub fn with_replay_guard(mut self, guard: Arc<dyn ReplayGuard>) -> Self {
        self.replay_guard = Some(guard);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Run every gate against `acl` as of now
    pub async fn verify(
        &self,
        signature: &str,
        raw_message: &str,
        acl: &Acl,
    ) -> Result<Identity, AuthError> {
        self.verify_at(signature, raw_message, acl, Utc::now().timestamp_millis())
            .await
    }

    /// Run every gate against `acl`, `now_ms` being the current time in
    /// milliseconds since the epoch
    pub async fn verify_at(
        &self,
        signature: &str,
        raw_message: &str,
        acl: &Acl,
        now_ms: i64,
    ) -> Result<Identity, AuthError> {
        let message = SignedMessage::parse(raw_message)?;

        let scheme = self
            .schemes
            .iter()
            .find(|scheme| scheme.accepts(&message.chain))
            .ok_or_else(|| {
                AuthError::Authentication(format!("unsupported chain '{}'", message.chain))
            })?;
        let identity = scheme.verify(raw_message, &message, signature)?;

        let expires_at = message
            .timestamp
            .saturating_add(self.max_age.as_millis() as i64);
        if now_ms > expires_at {
            tracing::debug!(%identity, "rejecting stale message");
            return Err(AuthError::Expired);
        }

        if let Some(guard) = &self.replay_guard {
            guard.check(&identity, &message.nonce).await?;
        }

        if !acl.contains(&identity) {
            return Err(AuthError::Unauthorized);
        }

        Ok(identity)
    }
}
