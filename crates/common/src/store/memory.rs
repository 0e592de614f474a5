use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{SessionStore, ShareStore, StoreError};
use crate::custody::SecretRecord;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError<MemoryStoreError> {
    StoreError::Provider(MemoryStoreError::Internal(format!(
        "failed to acquire lock: {}",
        e
    )))
}

/// In-memory share store using a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    records: Arc<RwLock<HashMap<String, SecretRecord>>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    type Error = MemoryStoreError;

    async fn exists(&self, key: &str) -> Result<bool, StoreError<Self::Error>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<SecretRecord, StoreError<Self::Error>> {
        let records = self.records.read().map_err(poisoned)?;
        records
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, record: &SecretRecord) -> Result<(), StoreError<Self::Error>> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(&record.key) {
            return Err(StoreError::AlreadyExists(record.key.clone()));
        }
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }
}

/// In-memory session store using a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    type Error = MemoryStoreError;

    async fn history(&self, identity: &str) -> Result<Vec<String>, StoreError<Self::Error>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(identity).cloned().unwrap_or_default())
    }

    async fn replace(
        &self,
        identity: &str,
        history: Vec<String>,
    ) -> Result<(), StoreError<Self::Error>> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(identity.to_string(), history);
        Ok(())
    }
}
