//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_export`] (from [`unified`]) which:
//!
//! - detects the export format by file extension (or you can override via [`IngestionOptions`])
//! - streams normalized rows into one transactional batch in the SQLite datastore
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The building blocks are also available on their own:
//! - [`header`]: column key normalization
//! - [`source`]: the [`RowSource`] capability shared by the format adapters
//! - [`csv`], [`excel`]: the format adapters
//! - [`assembler`]: header/data row assembly and blank-row filtering

pub mod assembler;
pub mod csv;
pub mod excel;
pub mod header;
pub mod observability;
pub mod source;
pub mod unified;

pub use assembler::{AssembledRow, RowAssembler};
pub use header::normalize_header;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
pub use source::{GridRows, RowSource};
pub use unified::{ingest_export, open_rows, ExportFormat, IngestionOptions, IngestionRequest, DEFAULT_BUSY_TIMEOUT};
