//! Workbook adapters: modern spreadsheet container (`.xlsx`) and legacy binary (`.xls`).
//!
//! Both decode only the first sheet in declaration order and return its rows as text cells.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, ExcelDateTime, Range, Reader, Xls, Xlsx};
use chrono::NaiveTime;

use crate::error::{IngestionError, IngestionResult};

use super::source::GridRows;
use super::unified::ExportFormat;

/// Largest magnitude below which every integral `f64` is exactly representable as an integer (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Open an `.xlsx` export and read every row of its first sheet, in document order.
pub fn open_xlsx_rows(path: impl AsRef<Path>) -> IngestionResult<GridRows> {
    let path = path.as_ref();
    let file = open_file(path, ExportFormat::Xlsx)?;
    let mut workbook: Xlsx<_> = Xlsx::new(BufReader::new(file)).map_err(|e| IngestionError::Open {
        path: path.to_path_buf(),
        format: ExportFormat::Xlsx,
        message: e.to_string(),
        io: false,
    })?;

    let sheet = first_sheet(workbook.sheet_names(), path, ExportFormat::Xlsx)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| IngestionError::SheetAccess {
            sheet: sheet.clone(),
            source: e.into(),
        })?;

    Ok(GridRows::new(grid_rows(&range, false)))
}

/// Open an `.xls` export and read the rows of sheet 0.
///
/// BIFF8 strings are stored as UTF-16 and decoded as such; byte strings in older workbooks use
/// the code page the workbook declares. Rows that carry no cells are treated as absent and
/// skipped entirely, so they never become the header and never reach the assembler.
pub fn open_xls_rows(path: impl AsRef<Path>) -> IngestionResult<GridRows> {
    let path = path.as_ref();
    let file = open_file(path, ExportFormat::Xls)?;
    let mut workbook: Xls<_> = Xls::new(BufReader::new(file)).map_err(|e| IngestionError::Open {
        path: path.to_path_buf(),
        format: ExportFormat::Xls,
        message: e.to_string(),
        io: false,
    })?;

    let sheet = first_sheet(workbook.sheet_names(), path, ExportFormat::Xls)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| IngestionError::SheetAccess {
            sheet: sheet.clone(),
            source: e.into(),
        })?;

    Ok(GridRows::new(grid_rows(&range, true)))
}

fn open_file(path: &Path, format: ExportFormat) -> IngestionResult<File> {
    File::open(path).map_err(|e| IngestionError::Open {
        path: path.to_path_buf(),
        format,
        message: e.to_string(),
        io: true,
    })
}

fn first_sheet(names: Vec<String>, path: &Path, format: ExportFormat) -> IngestionResult<String> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| IngestionError::NoSheets {
            path: path.to_path_buf(),
            format,
        })
}

/// Convert a decoded sheet into text rows addressed from column A.
///
/// The used range may start past column A; leading cells are padded with empty text so
/// positional column keys match the sheet's real columns. Trailing empty cells are dropped per
/// row, so a row is only as wide as its last written cell, like a delimited-text record.
pub(crate) fn grid_rows(range: &Range<Data>, skip_absent: bool) -> Vec<Vec<String>> {
    let lead = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|row| {
            let width = row
                .iter()
                .rposition(|c| !matches!(c, Data::Empty))
                .map_or(0, |last| last + 1);
            &row[..width]
        })
        .filter(|row| !skip_absent || !row.is_empty())
        .map(|row| {
            if row.is_empty() {
                return Vec::new();
            }
            let mut cells = Vec::with_capacity(lead + row.len());
            cells.resize(lead, String::new());
            cells.extend(row.iter().map(cell_to_string));
            cells
        })
        .collect()
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_string(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => datetime_to_string(dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

fn float_to_string(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

/// Date-formatted cells render as `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS` when a time of day is
/// set. Durations and serials outside chrono's range keep their numeric value.
fn datetime_to_string(dt: &ExcelDateTime) -> String {
    match dt.as_datetime() {
        Some(ndt) if dt.is_datetime() => {
            if ndt.time() == NaiveTime::MIN {
                ndt.format("%Y-%m-%d").to_string()
            } else {
                ndt.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
        }
        _ => float_to_string(dt.as_f64()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(cells: &[((u32, u32), Data)]) -> Range<Data> {
        let cells = cells
            .iter()
            .map(|(pos, v)| calamine::Cell::new(*pos, v.clone()))
            .collect();
        Range::from_sparse(cells)
    }

    #[test]
    fn grid_pads_leading_columns() {
        let range = sparse(&[
            ((0, 1), Data::String("Name".into())),
            ((1, 1), Data::String("apple".into())),
        ]);
        let rows = grid_rows(&range, false);
        assert_eq!(rows[0], vec!["", "Name"]);
        assert_eq!(rows[1], vec!["", "apple"]);
    }

    #[test]
    fn legacy_grid_skips_absent_rows() {
        let range = sparse(&[
            ((0, 0), Data::String("h".into())),
            ((2, 0), Data::Float(3.0)),
        ]);
        let dense = grid_rows(&range, false);
        assert_eq!(dense.len(), 3);
        assert!(dense[1].is_empty());
        let legacy = grid_rows(&range, true);
        assert_eq!(legacy, vec![vec!["h".to_string()], vec!["3".to_string()]]);
    }

    #[test]
    fn trailing_empty_cells_are_dropped_per_row() {
        // The header is narrower than the used range because a data row carries an extra cell.
        let range = sparse(&[
            ((0, 0), Data::String("name".into())),
            ((0, 1), Data::String("qty".into())),
            ((1, 0), Data::String("apple".into())),
            ((1, 1), Data::Float(3.0)),
            ((1, 2), Data::String("extra".into())),
            ((2, 0), Data::String("pear".into())),
        ]);
        let rows = grid_rows(&range, false);
        assert_eq!(rows[0], vec!["name", "qty"]);
        assert_eq!(rows[1], vec!["apple", "3", "extra"]);
        assert_eq!(rows[2], vec!["pear"]);
    }

    #[test]
    fn interior_empty_cells_are_kept() {
        let range = sparse(&[
            ((0, 1), Data::String("a".into())),
            ((0, 3), Data::String("b".into())),
        ]);
        assert_eq!(grid_rows(&range, false)[0], vec!["", "a", "", "b"]);
    }

    #[test]
    fn empty_sheet_list_is_no_sheets() {
        let err = first_sheet(Vec::new(), Path::new("empty.xlsx"), ExportFormat::Xlsx).unwrap_err();
        assert!(matches!(err, IngestionError::NoSheets { format: ExportFormat::Xlsx, .. }));
        let name = first_sheet(vec!["Ventas".into(), "Otra".into()], Path::new("v.xls"), ExportFormat::Xls).unwrap();
        assert_eq!(name, "Ventas");
    }

    #[test]
    fn numeric_cells_render_as_text() {
        assert_eq!(cell_to_string(&Data::Float(98.5)), "98.5");
        assert_eq!(cell_to_string(&Data::Float(2.0)), "2");
        assert_eq!(cell_to_string(&Data::Int(-7)), "-7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn integral_floats_beyond_i64_print_as_floats() {
        assert_eq!(cell_to_string(&Data::Float(1e20)), 1e20f64.to_string());
        assert_ne!(cell_to_string(&Data::Float(1e20)), i64::MAX.to_string());
        assert_eq!(cell_to_string(&Data::Float(-1e20)), (-1e20f64).to_string());
        assert_eq!(cell_to_string(&Data::Float(9_007_199_254_740_991.0)), "9007199254740991");
        assert_eq!(cell_to_string(&Data::Float(f64::INFINITY)), "inf");
    }

    #[test]
    fn date_cells_render_as_calendar_text() {
        use calamine::ExcelDateTimeType;

        let date = Data::DateTime(ExcelDateTime::new(45413.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&date), "2024-05-01");

        let noon = Data::DateTime(ExcelDateTime::new(45413.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&noon), "2024-05-01T12:00:00");

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_to_string(&duration), "1.5");
    }
}
