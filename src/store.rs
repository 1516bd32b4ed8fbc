//! SQLite batch store.
//!
//! Writes go through a typestate pair: [`BatchTransaction`] (write transaction open, no batch yet)
//! and [`OpenBatch`] (batch row inserted, rows may follow). Both wrap a [`rusqlite::Transaction`],
//! which rolls back when dropped, so nothing becomes visible unless [`OpenBatch::commit`] succeeds.

use std::path::Path;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

use crate::error::IngestionResult;
use crate::range::DateRange;
use crate::types::{BatchRecord, RowDocument, StoredRow};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ingest_batches (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    range_start TEXT NOT NULL,
    range_end   TEXT NOT NULL,
    filename    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS export_rows (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id  INTEGER NOT NULL,
    row_index INTEGER NOT NULL,
    data_json TEXT NOT NULL,
    FOREIGN KEY(batch_id) REFERENCES ingest_batches(id)
);
CREATE INDEX IF NOT EXISTS idx_export_rows_batch ON export_rows(batch_id);
";

/// Create the batch and row relations plus the row index, if absent. Safe to call repeatedly.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Handle to an ingestion datastore file.
#[derive(Debug)]
pub struct BatchStore {
    conn: Connection,
}

impl BatchStore {
    /// Open (creating if needed) the datastore at `path`, creating its parent directory first.
    ///
    /// `busy_timeout` bounds how long a writer waits on another connection's lock.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> IngestionResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn ensure_schema(&self) -> IngestionResult<()> {
        Ok(ensure_schema(&self.conn)?)
    }

    /// Begin the single write transaction of an ingestion run.
    ///
    /// The write lock is taken up front so concurrent writers queue on `busy_timeout`.
    pub fn begin(&mut self) -> IngestionResult<BatchTransaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(BatchTransaction { tx })
    }

    /// All committed batches, oldest first.
    pub fn batches(&self) -> IngestionResult<Vec<BatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, range_start, range_end, filename, created_at
             FROM ingest_batches ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BatchRecord {
                id: row.get(0)?,
                range_start: row.get(1)?,
                range_end: row.get(2)?,
                filename: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// A single committed batch, if it exists.
    pub fn batch(&self, id: i64) -> IngestionResult<Option<BatchRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, range_start, range_end, filename, created_at
                 FROM ingest_batches WHERE id = ?1",
                params![id],
                |row| {
                    Ok(BatchRecord {
                        id: row.get(0)?,
                        range_start: row.get(1)?,
                        range_end: row.get(2)?,
                        filename: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Rows of one batch in ordinal order, with decoded documents.
    pub fn rows(&self, batch_id: i64) -> IngestionResult<Vec<StoredRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, batch_id, row_index, data_json
             FROM export_rows WHERE batch_id = ?1 ORDER BY row_index",
        )?;
        let raw = stmt
            .query_map(params![batch_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(raw.len());
        for (id, batch_id, row_index, json) in raw {
            out.push(StoredRow {
                id,
                batch_id,
                row_index,
                data: serde_json::from_str(&json)?,
            });
        }
        Ok(out)
    }
}

/// An open write transaction with no batch inserted yet.
pub struct BatchTransaction<'c> {
    tx: Transaction<'c>,
}

impl<'c> BatchTransaction<'c> {
    /// Insert the batch record and capture its assigned identifier.
    pub fn insert_batch(self, range: &DateRange, filename: &str) -> IngestionResult<OpenBatch<'c>> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.tx.execute(
            "INSERT INTO ingest_batches(range_start, range_end, filename, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![range.start.to_string(), range.end.to_string(), filename, created_at],
        )?;
        let batch_id = self.tx.last_insert_rowid();
        Ok(OpenBatch {
            tx: self.tx,
            batch_id,
            rows: 0,
        })
    }
}

/// A batch inserted inside a still-open transaction.
pub struct OpenBatch<'c> {
    tx: Transaction<'c>,
    batch_id: i64,
    rows: usize,
}

impl OpenBatch<'_> {
    /// Insert one row of this batch.
    pub fn insert_row(&mut self, ordinal: usize, document: &RowDocument) -> IngestionResult<()> {
        let json = serde_json::to_string(document)?;
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO export_rows(batch_id, row_index, data_json) VALUES (?1, ?2, ?3)",
        )?;
        stmt.execute(params![self.batch_id, ordinal as i64, json])?;
        self.rows += 1;
        Ok(())
    }

    /// Commit the batch and its rows; returns `(batch_id, rows)`.
    pub fn commit(self) -> IngestionResult<(i64, usize)> {
        let Self { tx, batch_id, rows } = self;
        tx.commit()?;
        Ok((batch_id, rows))
    }
}
