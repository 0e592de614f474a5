//! Persistence seams for secret records and nonce sessions
//!
//! Both stores are narrow async traits so the daemon can back them with
//! SQLite while tests and ephemeral nodes use the in-memory versions here.

mod memory;

use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::custody::SecretRecord;

pub use memory::{MemorySessionStore, MemoryStoreError, MemoryShareStore};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError<T> {
    #[error("unhandled store provider error: {0}")]
    Provider(#[from] T),
    /// A record is already stored under the key
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("record not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait ShareStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync;

    async fn exists(&self, key: &str) -> Result<bool, StoreError<Self::Error>>;

    /// Load the record stored under `key`
    ///
    /// Fails with `StoreError::NotFound` when nothing is stored.
    async fn get(&self, key: &str) -> Result<SecretRecord, StoreError<Self::Error>>;

    /// Store a new record
    ///
    /// Must be an atomic unique-create: when two writers race on one key,
    /// exactly one succeeds and the other gets `StoreError::AlreadyExists`.
    /// An existing record is never modified.
    async fn put(&self, record: &SecretRecord) -> Result<(), StoreError<Self::Error>>;
}

/// Nonce history per identity, most recent first
#[async_trait]
pub trait SessionStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync;

    /// The identity's nonce history, empty if it never requested one
    async fn history(&self, identity: &str) -> Result<Vec<String>, StoreError<Self::Error>>;

    /// Replace the identity's nonce history
    async fn replace(
        &self,
        identity: &str,
        history: Vec<String>,
    ) -> Result<(), StoreError<Self::Error>>;
}
