//! Binary workbook (xls/xlsx) reading via calamine.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::debug;

use crate::adapters::SourceKind;
use crate::errors::{Error, Result};
use crate::spreadsheet_xml::CellRows;

fn unreadable(reason: impl Into<String>) -> Error {
    Error::unreadable(SourceKind::BinarySpreadsheet, reason)
}

/// Reads one worksheet as raw rows, discarding the first `skip_rows` rows of
/// the sheet.
///
/// Rows are counted from the top of the sheet, not from the first used row,
/// so an adapter's skip count matches what a user sees in a spreadsheet app.
pub fn read_worksheet(content: &[u8], worksheet: Option<&str>, skip_rows: usize) -> Result<CellRows> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
        .map_err(|e| unreadable(e.to_string()))?;

    let range = match worksheet {
        Some(name) => {
            let names = workbook.sheet_names();
            if !names.iter().any(|n| n == name) {
                return Err(Error::SchemaMismatch(format!(
                    "worksheet '{}' not found (available: {})",
                    name,
                    names.join(", ")
                )));
            }
            workbook
                .worksheet_range(name)
                .map_err(|e| unreadable(e.to_string()))?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| unreadable("workbook contains no worksheets"))?
            .map_err(|e| unreadable(e.to_string()))?,
    };

    Ok(range_rows(&range, skip_rows))
}

fn range_rows(range: &Range<Data>, skip_rows: usize) -> CellRows {
    // The range starts at the first used cell; empty leading rows are not part of it.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip_in_range = skip_rows.saturating_sub(first_row);
    debug!(
        "Worksheet range starts at row {}, skipping {} rows within it",
        first_row, skip_in_range
    );

    range
        .rows()
        .skip(skip_in_range)
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Error(e) => {
            debug!("Spreadsheet cell error {:?} treated as empty", e);
            None
        }
        other => Some(other.to_string()),
    }
}
