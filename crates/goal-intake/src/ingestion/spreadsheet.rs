//! Excel workbook parser (xlsx and xls)

use calamine::{Data, Range, Reader};
use serde_json::{Number, Value};
use std::io::Cursor;

use super::cells::{dedupe_columns, header_label, row_object};
use crate::error::{Error, Result};
use crate::types::{SheetSummary, SpreadsheetSummary, SpreadsheetTotals};

/// Maximum preview rows kept per sheet
pub const SHEET_PREVIEW_ROWS: usize = 50;

const FORMAT: &str = "Excel";

/// Parse every sheet of a workbook, in workbook order
pub fn parse_workbook(data: &[u8]) -> Result<SpreadsheetSummary> {
    let cursor = Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::parse(FORMAT, e.to_string()))?;

    let sheets: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets_data = Vec::with_capacity(sheets.len());

    for name in &sheets {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| Error::parse(FORMAT, format!("sheet '{}': {}", name, e)))?;
        sheets_data.push(summarize_sheet(name, &range));
    }

    let total_rows = sheets_data.iter().map(|s| s.rows).sum();
    tracing::debug!("Parsed workbook: {} sheets, {} rows", sheets.len(), total_rows);

    Ok(SpreadsheetSummary {
        summary: SpreadsheetTotals {
            total_sheets: sheets.len(),
            total_rows,
        },
        sheets,
        sheets_data,
    })
}

/// Summarize one sheet, treating its first row as the header
pub fn summarize_sheet(name: &str, range: &Range<Data>) -> SheetSummary {
    let mut rows = range.rows();

    let column_names = match rows.next() {
        Some(header) => dedupe_columns(
            header
                .iter()
                .enumerate()
                .map(|(i, cell)| header_name(i, cell))
                .collect(),
        ),
        None => Vec::new(),
    };

    let data = rows
        .take(SHEET_PREVIEW_ROWS)
        .map(|row| row_object(&column_names, row.iter().map(cell_value)))
        .collect();

    SheetSummary {
        name: name.to_string(),
        rows: range.height().saturating_sub(1),
        columns: column_names.len(),
        column_names,
        data,
    }
}

fn header_name(index: usize, cell: &Data) -> String {
    match cell_value(cell) {
        Value::Null => header_label(index, ""),
        Value::String(s) => header_label(index, &s),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::String(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}
