//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_export`], which ingests an export file into a SQLite
//! datastore as one date-ranged batch.
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{IngestPhase, IngestResult, IngestionError, IngestionResult, PhaseExt};
use crate::range::DateRange;
use crate::store::BatchStore;
use crate::types::BatchSummary;

use super::assembler::RowAssembler;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::source::RowSource;
use super::{csv, excel};

/// Default time a writer waits for another connection's lock on the datastore.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Modern spreadsheet container (`.xlsx`).
    Xlsx,
    /// Legacy binary spreadsheet (`.xls`).
    Xls,
    /// Comma-separated values (`.csv`).
    Csv,
}

impl ExportFormat {
    /// Parse an export format from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Infer the format of `path` from its extension.
    pub fn from_path(path: &Path) -> IngestionResult<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| IngestionError::UnsupportedFormat {
            extension: if ext.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", ext.to_ascii_lowercase())
            },
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
        })
    }
}

/// Open the adapter for `format`, yielding the header row first and then data rows.
pub fn open_rows(format: ExportFormat, path: &Path) -> IngestionResult<Box<dyn RowSource>> {
    Ok(match format {
        ExportFormat::Xlsx => Box::new(excel::open_xlsx_rows(path)?),
        ExportFormat::Xls => Box::new(excel::open_xls_rows(path)?),
        ExportFormat::Csv => Box::new(csv::open_csv_rows(path)?),
    })
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, detect the format from the file extension.
    pub format: Option<ExportFormat>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
    /// How long to wait on a locked datastore before failing the write.
    pub busy_timeout: Duration,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Ingest one export file into `datastore` as a single batch covering `range`.
///
/// Steps: detect the format (before touching the datastore), open the datastore and ensure its
/// schema, begin one write transaction, insert the batch record, stream normalized non-blank rows
/// from the format adapter into it, commit.
///
/// Any failure rolls the transaction back, so either the batch and all of its rows are visible
/// or nothing is. The returned [`crate::IngestError`] names the phase that failed.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on commit, with the batch id and row count
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use export_ingest::ingestion::{ingest_export, IngestionOptions};
/// use export_ingest::range::DateRange;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let range = DateRange::parse("2024-05-01", "2024-05-10")?;
/// let summary = ingest_export(
///     "automation/data/erp.sqlite",
///     "automation/downloads/ventas.xlsx",
///     range,
///     &IngestionOptions::default(),
/// )?;
/// println!("batch={} rows={}", summary.id, summary.rows);
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use export_ingest::ingestion::{ingest_export, IngestionOptions, IngestionSeverity, StdErrObserver};
/// use export_ingest::range::DateRange;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: IngestionSeverity::Error,
///     ..Default::default()
/// };
/// let range = DateRange::parse("2024-05-01", "2024-05-10")?;
/// let _err = ingest_export("erp.sqlite", "report.pdf", range, &opts).unwrap_err();
/// # Ok(())
/// # }
/// ```
pub fn ingest_export(
    datastore: impl AsRef<Path>,
    export: impl AsRef<Path>,
    range: DateRange,
    options: &IngestionOptions,
) -> IngestResult<BatchSummary> {
    let datastore = datastore.as_ref();
    let export = export.as_ref();

    let format = match options.format {
        Some(f) => Ok(f),
        None => ExportFormat::from_path(export).phase(IngestPhase::DetectFormat),
    };

    let ctx = IngestionContext {
        export_path: export.to_path_buf(),
        datastore_path: datastore.to_path_buf(),
        format: format.as_ref().ok().copied(),
    };

    let result = format.and_then(|format| ingest_with_format(datastore, export, format, range, options));

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(summary) => obs.on_success(
                &ctx,
                IngestionStats {
                    batch_id: summary.id,
                    rows: summary.rows,
                },
            ),
            Err(e) => {
                let sev = severity_for_error(&e.source);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn ingest_with_format(
    datastore: &Path,
    export: &Path,
    format: ExportFormat,
    range: DateRange,
    options: &IngestionOptions,
) -> IngestResult<BatchSummary> {
    let mut store = BatchStore::open(datastore, options.busy_timeout).phase(IngestPhase::OpenStore)?;
    store.ensure_schema().phase(IngestPhase::EnsureSchema)?;

    let filename = export
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tx = store.begin().phase(IngestPhase::BeginTransaction)?;
    let mut batch = tx.insert_batch(&range, &filename).phase(IngestPhase::InsertBatch)?;

    let source = open_rows(format, export).phase(IngestPhase::OpenExport)?;
    for row in RowAssembler::new(source) {
        let row = row.phase(IngestPhase::ReadRows)?;
        batch
            .insert_row(row.ordinal, &row.document)
            .phase(IngestPhase::InsertRows)?;
    }

    let (id, rows) = batch.commit().phase(IngestPhase::Commit)?;
    Ok(BatchSummary {
        id,
        range_start: range.start,
        range_end: range.end,
        filename,
        rows,
    })
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Write(_) => IngestionSeverity::Critical,
        IngestionError::Open { io: true, .. } => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::SheetAccess { source, .. } => {
            // calamine wraps zip/IO failures several layers deep.
            if error_chain_contains_io(source) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::UnsupportedFormat { .. }
        | IngestionError::NoSheets { .. }
        | IngestionError::Open { io: false, .. }
        | IngestionError::Serialization(_)
        | IngestionError::InvalidDate { .. } => IngestionSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// Convenience helper for callers that want an owned request object.
///
/// This can be useful if you want to enqueue ingestion work in a job system.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the SQLite datastore.
    pub datastore: PathBuf,
    /// Path to the export file.
    pub export: PathBuf,
    /// Date range the batch covers.
    pub range: DateRange,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("datastore", &self.datastore)
            .field("export", &self.export)
            .field("range", &self.range)
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_export`].
    pub fn run(&self) -> IngestResult<BatchSummary> {
        ingest_export(&self.datastore, &self.export, self.range, &self.options)
    }
}
