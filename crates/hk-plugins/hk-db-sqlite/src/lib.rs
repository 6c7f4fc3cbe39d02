//! # hk-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `hk-core` domain models. One [`SqliteStore`] backs every storage port.

mod activity;
mod books;
mod clubs;
mod ledger;
mod quotes;
mod timers;
mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects and applies the schema. `sqlite::memory:` gives a private, single-connection database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives and dies with its connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        log::info!("sqlite store ready at {url}");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}
