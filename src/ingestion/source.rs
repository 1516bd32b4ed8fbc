//! The row-iteration capability shared by all format adapters.

use crate::error::IngestionResult;

/// A source of raw rows: the first row yielded is the header, every following row is data.
///
/// Each row is an ordered sequence of text cells. Rows may have different lengths.
pub trait RowSource {
    /// Return the next row, or `Ok(None)` once the input is exhausted.
    fn next_row(&mut self) -> IngestionResult<Option<Vec<String>>>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> IngestionResult<Option<Vec<String>>> {
        (**self).next_row()
    }
}

/// A fully materialized grid of rows.
///
/// Workbook formats decode a whole sheet at once, so their adapters hand the assembler one of these.
#[derive(Debug, Clone, Default)]
pub struct GridRows {
    rows: std::vec::IntoIter<Vec<String>>,
}

impl GridRows {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for GridRows {
    fn next_row(&mut self) -> IngestionResult<Option<Vec<String>>> {
        Ok(self.rows.next())
    }
}
