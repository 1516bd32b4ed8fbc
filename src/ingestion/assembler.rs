//! Row assembly: header row -> column keys, data rows -> keyed documents.

use crate::error::IngestionResult;
use crate::types::RowDocument;

use super::header::normalize_headers;
use super::source::RowSource;

/// A non-blank data row ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledRow {
    /// 1-based position among emitted rows.
    pub ordinal: usize,
    pub document: RowDocument,
}

/// Turns a [`RowSource`] into a stream of [`AssembledRow`]s.
///
/// - The first row is the header; it is normalized and never emitted.
/// - Each data row maps the i-th header key to the trimmed i-th cell, or `""` when the row is
///   shorter than the header. Cells past the header width are dropped.
/// - Duplicate keys keep the value of the right-most column carrying that key.
/// - Rows whose values are all empty are dropped without consuming an ordinal.
pub struct RowAssembler<S> {
    source: S,
    headers: Option<Vec<String>>,
    emitted: usize,
}

impl<S: RowSource> RowAssembler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            headers: None,
            emitted: 0,
        }
    }

    /// Normalized header keys, once the header row has been read.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Number of rows emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn next_assembled(&mut self) -> IngestionResult<Option<AssembledRow>> {
        loop {
            let Some(cells) = self.source.next_row()? else {
                return Ok(None);
            };

            let Some(headers) = self.headers.as_ref() else {
                self.headers = Some(normalize_headers(&cells));
                continue;
            };

            let document = build_document(headers, &cells);
            if is_blank(&document) {
                continue;
            }

            self.emitted += 1;
            return Ok(Some(AssembledRow {
                ordinal: self.emitted,
                document,
            }));
        }
    }
}

impl<S: RowSource> Iterator for RowAssembler<S> {
    type Item = IngestionResult<AssembledRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_assembled().transpose()
    }
}

fn build_document(headers: &[String], cells: &[String]) -> RowDocument {
    let mut doc = RowDocument::new();
    for (i, key) in headers.iter().enumerate() {
        let value = cells.get(i).map(|c| c.trim().to_owned()).unwrap_or_default();
        doc.insert(key.clone(), value);
    }
    doc
}

fn is_blank(doc: &RowDocument) -> bool {
    doc.values().all(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::source::GridRows;

    fn rows(raw: &[&[&str]]) -> GridRows {
        GridRows::new(
            raw.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn assemble(raw: &[&[&str]]) -> Vec<AssembledRow> {
        RowAssembler::new(rows(raw))
            .collect::<IngestionResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn header_is_not_emitted_and_ordinals_skip_blanks() {
        let out = assemble(&[
            &["Name", "Qty"],
            &["apple", "3"],
            &["", "  "],
            &["banana", "0"],
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].ordinal, 1);
        assert_eq!(out[1].ordinal, 2);
        assert_eq!(out[1].document["name"], "banana");
    }

    #[test]
    fn short_rows_pad_and_long_rows_truncate() {
        let out = assemble(&[&["a", "b", "c"], &[" x "], &["1", "2", "3", "4"]]);
        assert_eq!(out[0].document.len(), 3);
        assert_eq!(out[0].document["a"], "x");
        assert_eq!(out[0].document["b"], "");
        assert_eq!(out[0].document["c"], "");
        assert_eq!(out[1].document.len(), 3);
        assert!(!out[1].document.values().any(|v| v == "4"));
    }

    #[test]
    fn duplicate_keys_keep_right_most_value() {
        let out = assemble(&[&["Total $", "Total %"], &["10", "5"]]);
        assert_eq!(out[0].document.len(), 1);
        assert_eq!(out[0].document["total__"], "5");
    }

    #[test]
    fn header_only_and_empty_inputs_emit_nothing() {
        assert!(assemble(&[&["a"]]).is_empty());
        assert!(assemble(&[]).is_empty());
    }

    #[test]
    fn exposes_headers_after_first_row() {
        let mut asm = RowAssembler::new(rows(&[&["Fecha", ""], &["2024-05-01", "x"]]));
        assert!(asm.headers().is_none());
        asm.next().unwrap().unwrap();
        assert_eq!(asm.headers().unwrap(), &["fecha".to_string(), "col_2".to_string()]);
        assert_eq!(asm.emitted(), 1);
    }
}
