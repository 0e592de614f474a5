use async_trait::async_trait;

use common::custody::{EncryptedShare, SecretRecord};
use common::store::{ShareStore, StoreError};

use super::{decode_error, Database};

#[async_trait]
impl ShareStore for Database {
    type Error = sqlx::Error;

    async fn exists(&self, key: &str) -> Result<bool, StoreError<Self::Error>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM secrets WHERE key = $1")
            .bind(key)
            .fetch_one(&**self)
            .await
            .map_err(StoreError::Provider)?;

        Ok(count > 0)
    }

    async fn get(&self, key: &str) -> Result<SecretRecord, StoreError<Self::Error>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT threshold, shares FROM secrets WHERE key = $1")
                .bind(key)
                .fetch_optional(&**self)
                .await
                .map_err(StoreError::Provider)?;

        let (threshold, shares) = row.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let threshold = u8::try_from(threshold).map_err(|e| StoreError::Provider(decode_error(e)))?;
        let shares: Vec<EncryptedShare> =
            serde_json::from_str(&shares).map_err(|e| StoreError::Provider(decode_error(e)))?;

        Ok(SecretRecord {
            key: key.to_string(),
            threshold,
            shares,
        })
    }

    async fn put(&self, record: &SecretRecord) -> Result<(), StoreError<Self::Error>> {
        let shares = serde_json::to_string(&record.shares)
            .map_err(|e| StoreError::Provider(sqlx::Error::Encode(Box::new(e))))?;

        // the primary key makes this the unique-create
        let result = sqlx::query(
            r#"
            INSERT INTO secrets (key, threshold, shares, created_at)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&record.key)
        .bind(record.threshold as i64)
        .bind(shares)
        .execute(&**self)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists(record.key.clone()))
            }
            Err(e) => Err(StoreError::Provider(e)),
        }
    }
}
