use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use super::DatabaseSetupError;

const MAX_CONNECTIONS: u32 = 8;

pub async fn connect_sqlite(database_url: &url::Url) -> Result<SqlitePool, DatabaseSetupError> {
    let in_memory = database_url.as_str().contains(":memory:");
    let options = SqliteConnectOptions::from_str(database_url.as_str())
        .map_err(DatabaseSetupError::Unavailable)?
        .create_if_missing(true);

    // every in-memory connection opens its own database, so keep exactly one
    let (options, max_connections) = if in_memory {
        (options, 1)
    } else {
        (options.journal_mode(SqliteJournalMode::Wal), MAX_CONNECTIONS)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(DatabaseSetupError::Unavailable)?;

    Ok(pool)
}

pub async fn migrate_sqlite(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DatabaseSetupError::MigrationFailed)?;
    Ok(())
}
