use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::ingestion::ExportFormat;

/// Convenience result type for adapter and store operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Result type returned by the top-level ingestion entrypoints.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type shared by the format adapters, the row assembler and the batch store.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Filesystem-level failure (e.g. creating the datastore directory).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The export extension is not one of `.xlsx`, `.xls` or `.csv`.
    #[error("unsupported export extension: {extension}")]
    UnsupportedFormat { extension: String },

    /// The workbook declares no sheets at all.
    #[error("{format} workbook has no sheets ({})", .path.display())]
    NoSheets { path: PathBuf, format: ExportFormat },

    /// The first sheet exists but could not be read.
    #[error("failed to read sheet '{sheet}': {source}")]
    SheetAccess {
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    /// The export could not be opened or decoded as its expected format.
    #[error("failed to open {} as {format}: {message}", .path.display())]
    Open {
        path: PathBuf,
        format: ExportFormat,
        message: String,
        /// Whether the underlying cause was an I/O failure rather than a decode failure.
        io: bool,
    },

    /// A delimited-text record could not be decoded.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Any datastore write (schema, batch insert, row insert, commit) failed.
    #[error("write error: {0}")]
    Write(#[from] rusqlite::Error),

    /// A row document could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A caller-supplied calendar date is not `YYYY-MM-DD`.
    #[error("invalid date '{raw}': {message}")]
    InvalidDate { raw: String, message: String },
}

/// Step of an ingestion call at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    DetectFormat,
    OpenStore,
    EnsureSchema,
    BeginTransaction,
    InsertBatch,
    OpenExport,
    ReadRows,
    InsertRows,
    Commit,
}

impl fmt::Display for IngestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DetectFormat => "detect_format",
            Self::OpenStore => "open_store",
            Self::EnsureSchema => "ensure_schema",
            Self::BeginTransaction => "begin_transaction",
            Self::InsertBatch => "insert_batch",
            Self::OpenExport => "open_export",
            Self::ReadRows => "read_rows",
            Self::InsertRows => "insert_rows",
            Self::Commit => "commit",
        };
        f.write_str(s)
    }
}

/// A failed ingestion call: the originating error, annotated with the phase that failed.
///
/// Whatever the phase, the transaction has been rolled back by the time this is returned.
#[derive(Debug, Error)]
#[error("ingestion failed during {phase}: {source}")]
pub struct IngestError {
    pub phase: IngestPhase,
    #[source]
    pub source: IngestionError,
}

impl IngestError {
    pub fn new(phase: IngestPhase, source: IngestionError) -> Self {
        Self { phase, source }
    }

    /// The originating error.
    pub fn kind(&self) -> &IngestionError {
        &self.source
    }
}

/// Attach an [`IngestPhase`] to a fallible step.
pub(crate) trait PhaseExt<T> {
    fn phase(self, phase: IngestPhase) -> IngestResult<T>;
}

impl<T, E> PhaseExt<T> for Result<T, E>
where
    E: Into<IngestionError>,
{
    fn phase(self, phase: IngestPhase) -> IngestResult<T> {
        self.map_err(|e| IngestError::new(phase, e.into()))
    }
}
