//! Delimited-text (CSV) adapter.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};

use super::source::RowSource;
use super::unified::ExportFormat;

/// Streams CSV records as raw rows.
///
/// Rules:
///
/// - No header handling here: the first record is returned like any other row.
/// - Records may have any number of fields (ragged lines are tolerated).
/// - End of input ends the stream without error.
pub struct CsvRows<R> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> CsvRows<R> {
    /// Wrap any reader producing UTF-8 CSV text.
    pub fn from_reader(rdr: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);
        Self {
            records: reader.into_records(),
        }
    }
}

impl<R: Read> RowSource for CsvRows<R> {
    fn next_row(&mut self) -> IngestionResult<Option<Vec<String>>> {
        match self.records.next() {
            None => Ok(None),
            Some(record) => {
                let record = record?;
                Ok(Some(record.iter().map(str::to_owned).collect()))
            }
        }
    }
}

/// Open a CSV export for row iteration.
pub fn open_csv_rows(path: impl AsRef<Path>) -> IngestionResult<CsvRows<File>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IngestionError::Open {
        path: path.to_path_buf(),
        format: ExportFormat::Csv,
        message: e.to_string(),
        io: true,
    })?;
    Ok(CsvRows::from_reader(file))
}
