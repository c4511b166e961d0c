//! database (db) structure.
use std::str::FromStr;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::AppState;

pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Tables are created on start when absent; there is no migration history.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email VARCHAR(150) UNIQUE,
        nostr_key VARCHAR(150) UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(150) NOT NULL,
        description TEXT,
        date DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        location VARCHAR(150),
        tickets_available INTEGER NOT NULL,
        lightning_address VARCHAR(150) NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id),
        event_id INTEGER NOT NULL REFERENCES events (id),
        purchase_date DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    "CREATE INDEX IF NOT EXISTS tickets_user_id ON tickets (user_id)",
    "CREATE INDEX IF NOT EXISTS tickets_event_id ON tickets (event_id)",
];

/// Custom db structure to pass to Axum.
#[derive(Clone, Debug)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Init database connections.
    pub async fn new(url: &str, pool: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(pool)
            .connect_with(options)
            .await?;

        tracing::info!(%url, "sqlite connected");

        Ok(Self { pool })
    }

    /// Create every table if it does not exist yet.
    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::debug!("schema is up to date");
        Ok(())
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Database {
        app_state.db.clone()
    }
}

/// In-memory database with its schema, for tests.
#[cfg(test)]
pub async fn memory() -> Database {
    let db = Database::new("sqlite::memory:", 1)
        .await
        .expect("cannot open in-memory sqlite");
    db.create_schema().await.expect("cannot create schema");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = memory().await;
        db.create_schema().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&db.pool)
        .await
        .unwrap();

        let names = tables.into_iter().map(|(n,)| n).collect::<Vec<_>>();
        assert_eq!(names, vec!["events", "tickets", "users"]);
    }
}
