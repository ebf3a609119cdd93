//! # sv-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `sv-core` domain models. One pool is opened at startup, shared by
//! both repositories, and closed on shutdown.

mod filter;
mod snippets;
mod users;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use uuid::Uuid;

pub use snippets::SqliteSnippetRepo;
pub use sqlx::SqlitePool;
pub use users::SqliteUserRepo;

/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the pool and brings the schema up to date.
///
/// `sqlite::memory:` databases live per connection, so they get a single
/// connection that is never recycled. File databases run in WAL mode so
/// readers never block the single writer.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let in_memory = url.contains(":memory:");
    let mut options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new();
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to open SQLite pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!(url, in_memory, "SQLite store ready");
    Ok(pool)
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).context("malformed UUID column")
}

fn millis_to_datetime(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).with_context(|| format!("timestamp out of range: {millis}"))
}
