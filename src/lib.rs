//! `export-ingest` loads tabular exports produced by an external automation job into a SQLite
//! datastore, one immutable, date-ranged batch per export.
//!
//! The primary entrypoint is [`ingestion::ingest_export`], which detects the export format from
//! the file extension (or you can force a format via [`ingestion::IngestionOptions`]).
//!
//! ## What you can ingest
//!
//! - **Spreadsheet container**: `.xlsx` (first sheet)
//! - **Legacy binary spreadsheet**: `.xls` (sheet 0, byte strings decoded as UTF-8)
//! - **Delimited text**: `.csv` (ragged lines tolerated)
//!
//! The first row of an export is its header. Header cells are normalized into column keys
//! (see [`ingestion::normalize_header`]); every following non-blank row is stored as a JSON
//! document mapping those keys to the trimmed cell text. Cells are never coerced: numbers,
//! currencies and dates stay text.
//!
//! ## Quick example
//!
//! ```no_run
//! use export_ingest::ingestion::{ingest_export, IngestionOptions};
//! use export_ingest::range::DateRange;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let range = DateRange::parse("2024-05-01", "2024-05-10")?;
//! let batch = ingest_export("data/erp.sqlite", "downloads/ventas.csv", range, &IngestionOptions::default())?;
//! println!("batch={} rows={}", batch.id, batch.rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Atomicity
//!
//! A batch and all of its rows are written in one transaction. If anything fails (unreadable
//! export, decode error, datastore write error) the transaction is rolled back and the returned
//! [`IngestError`] names the failing [`error::IngestPhase`].
//!
//! ## Modules
//!
//! - [`ingestion`]: unified entrypoint, format adapters, row assembly, observers
//! - [`store`]: SQLite schema, transactional batch writes and read-back
//! - [`range`]: reporting date ranges
//! - [`producer`]: parsing the export producer's output
//! - [`types`]: batch and row types
//! - [`error`]: error types

pub mod error;
pub mod ingestion;
pub mod producer;
pub mod range;
pub mod store;
pub mod types;

pub use error::{IngestError, IngestResult, IngestionError, IngestionResult};
