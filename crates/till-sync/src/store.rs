//! # Durable Queue Store
//!
//! Storage seam for the offline queue. Production uses SQLite via sqlx;
//! tests use the in-memory store.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        offline_queue Table                              │
//! │                                                                         │
//! │  local_id    TEXT PRIMARY KEY   sale's client-side UUID                │
//! │  payload     TEXT NOT NULL      full Sale as JSON                      │
//! │  attempts    INTEGER NOT NULL   sync attempts so far                   │
//! │  last_error  TEXT               last failure message, if any           │
//! │  enqueued_at TEXT NOT NULL      RFC 3339; drain order is oldest-first  │
//! │                                                                         │
//! │  DURABILITY SETTINGS:                                                  │
//! │  • journal_mode = WAL     readers never block the enqueue write        │
//! │  • synchronous  = FULL    an acked enqueue survives power loss         │
//! │                                                                         │
//! │  The enqueue ACK is only returned after the row is on disk - that is   │
//! │  the write-then-ack contract the "a sale is never lost" guarantee      │
//! │  rests on.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use till_core::{OfflineQueueEntry, Sale};

use crate::error::StoreError;

// =============================================================================
// Queue Store Trait
// =============================================================================

/// Durable storage for queued sales.
///
/// `pending` MUST return entries oldest-first; the queue's FIFO guarantee is
/// delegated here.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persists an entry. Returns only after the write is durable.
    async fn append(&self, entry: &OfflineQueueEntry) -> Result<(), StoreError>;

    /// All queued entries, oldest-first.
    async fn pending(&self) -> Result<Vec<OfflineQueueEntry>, StoreError>;

    /// Records a failed sync attempt: bumps the counter and stores the error.
    async fn record_attempt(&self, local_id: &str, error: &str) -> Result<(), StoreError>;

    /// Removes an entry. Returns whether it existed.
    async fn remove(&self, local_id: &str) -> Result<bool, StoreError>;

    /// Number of queued entries.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Removes everything; returns the number of entries dropped.
    async fn clear(&self) -> Result<u64, StoreError>;
}

// =============================================================================
// SQLite Store
// =============================================================================

/// SQLite-backed queue store.
#[derive(Debug, Clone)]
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    /// Opens (creating if missing) the queue database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = SqliteQueueStore { pool };
        store.init_schema().await?;

        info!(?path, "Offline queue store opened");
        Ok(store)
    }

    /// Opens an in-memory store (tests and throwaway sessions).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);

        // A pool of one: each in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = SqliteQueueStore { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS offline_queue (
                local_id    TEXT PRIMARY KEY,
                payload     TEXT NOT NULL,
                attempts    INTEGER NOT NULL DEFAULT 0,
                last_error  TEXT,
                enqueued_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn decode_entry(row: &sqlx::sqlite::SqliteRow) -> Result<OfflineQueueEntry, StoreError> {
        let local_id: String = row.try_get("local_id")?;
        let payload: String = row.try_get("payload")?;
        let attempts: i64 = row.try_get("attempts")?;
        let last_error: Option<String> = row.try_get("last_error")?;
        let enqueued_at: DateTime<Utc> = row.try_get("enqueued_at")?;

        let sale: Sale =
            serde_json::from_str(&payload).map_err(|e| StoreError::CorruptPayload {
                local_id,
                reason: e.to_string(),
            })?;

        Ok(OfflineQueueEntry {
            sale,
            attempts,
            last_error,
            enqueued_at,
        })
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn append(&self, entry: &OfflineQueueEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&entry.sale).map_err(|e| {
            StoreError::CorruptPayload {
                local_id: entry.sale.local_id.clone(),
                reason: e.to_string(),
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO offline_queue (local_id, payload, attempts, last_error, enqueued_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.sale.local_id)
        .bind(&payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.enqueued_at)
        .execute(&self.pool)
        .await?;

        debug!(local_id = %entry.sale.local_id, "Queue entry persisted");
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<OfflineQueueEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT local_id, payload, attempts, last_error, enqueued_at
            FROM offline_queue
            ORDER BY enqueued_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_entry).collect()
    }

    async fn record_attempt(&self, local_id: &str, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE offline_queue
            SET attempts = attempts + 1, last_error = ?
            WHERE local_id = ?
            "#,
        )
        .bind(error)
        .bind(local_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, local_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM offline_queue WHERE local_id = ?")
            .bind(local_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM offline_queue")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM offline_queue")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Non-durable store for tests and ephemeral demo sessions.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    entries: Mutex<Vec<OfflineQueueEntry>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn append(&self, entry: &OfflineQueueEntry) -> Result<(), StoreError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<OfflineQueueEntry>, StoreError> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.sort_by_key(|e| e.enqueued_at);
        Ok(entries)
    }

    async fn record_attempt(&self, local_id: &str, error: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.sale.local_id == local_id) {
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
        }
        Ok(())
    }

    async fn remove(&self, local_id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.sale.local_id != local_id);
        Ok(entries.len() < before)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.entries.lock().unwrap().len() as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let n = entries.len() as u64;
        entries.clear();
        Ok(n)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
