use async_trait::async_trait;
use time::OffsetDateTime;

use common::store::{SessionStore, StoreError};

use super::{decode_error, Database};

#[async_trait]
impl SessionStore for Database {
    type Error = sqlx::Error;

    async fn history(&self, identity: &str) -> Result<Vec<String>, StoreError<Self::Error>> {
        let nonces: Option<String> =
            sqlx::query_scalar("SELECT nonces FROM sessions WHERE identity = $1")
                .bind(identity)
                .fetch_optional(&**self)
                .await
                .map_err(StoreError::Provider)?;

        match nonces {
            Some(nonces) => {
                serde_json::from_str(&nonces).map_err(|e| StoreError::Provider(decode_error(e)))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn replace(
        &self,
        identity: &str,
        history: Vec<String>,
    ) -> Result<(), StoreError<Self::Error>> {
        let nonces = serde_json::to_string(&history)
            .map_err(|e| StoreError::Provider(sqlx::Error::Encode(Box::new(e))))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (identity, nonces, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (identity) DO UPDATE SET
                nonces = excluded.nonces,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identity)
        .bind(nonces)
        .bind(OffsetDateTime::now_utc())
        .execute(&**self)
        .await
        .map_err(StoreError::Provider)?;

        Ok(())
    }
}
