//! CSV parser

use serde_json::Value;

use super::cells::{dedupe_columns, header_label, infer_value, row_object};
use crate::error::{Error, Result};
use crate::types::{CsvSummary, CsvTotals};

/// Maximum preview rows kept for a CSV table
pub const CSV_PREVIEW_ROWS: usize = 100;

/// Per-cell bookkeeping added to the memory estimate
const CELL_OVERHEAD: u64 = 8;

const FORMAT: &str = "CSV";

/// Parse a CSV file whose first row is the header.
///
/// Records are streamed; only the preview rows are kept in memory.
pub fn parse_csv(data: &[u8]) -> Result<CsvSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| Error::parse(FORMAT, e.to_string()))?
        .clone();

    if headers.is_empty() {
        return Err(Error::parse(FORMAT, "No columns to parse from file"));
    }

    let column_names = dedupe_columns(
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| header_label(i, h))
            .collect(),
    );
    let mut memory_usage: u64 = column_names
        .iter()
        .map(|c| c.len() as u64 + CELL_OVERHEAD)
        .sum();

    let mut rows = 0usize;
    let mut data_rows = Vec::new();
    let mut record = csv::StringRecord::new();

    while reader
        .read_record(&mut record)
        .map_err(|e| Error::parse(FORMAT, e.to_string()))?
    {
        // Short rows are padded with nulls; long rows have nowhere to go
        if record.len() > column_names.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(Error::parse(
                FORMAT,
                format!(
                    "Expected {} fields in line {}, saw {}",
                    column_names.len(),
                    line,
                    record.len()
                ),
            ));
        }

        rows += 1;
        memory_usage += record
            .iter()
            .map(|field| field.len() as u64 + CELL_OVERHEAD)
            .sum::<u64>();

        if data_rows.len() < CSV_PREVIEW_ROWS {
            let values: Vec<Value> = record.iter().map(infer_value).collect();
            data_rows.push(row_object(&column_names, values));
        }
    }

    let columns = column_names.len();
    tracing::debug!("Parsed CSV: {} rows x {} columns", rows, columns);

    Ok(CsvSummary {
        rows,
        columns,
        column_names,
        data: data_rows,
        summary: CsvTotals {
            total_rows: rows,
            total_columns: columns,
            memory_usage,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_csv() {
        let csv = b"Name,Age,City\nJohn,30,New York\nJane,25,San Francisco";
        let summary = parse_csv(csv).unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 3);
        assert_eq!(summary.column_names, vec!["Name", "Age", "City"]);
        assert_eq!(summary.data.len(), 2);
        assert_eq!(summary.data[0].get("Name"), Some(&json!("John")));
        assert_eq!(summary.data[0].get("Age"), Some(&json!(30)));
        assert_eq!(summary.data[1].get("City"), Some(&json!("San Francisco")));
        assert_eq!(summary.summary.total_rows, 2);
        assert_eq!(summary.summary.total_columns, 3);
        assert!(summary.summary.memory_usage > 0);
    }

    #[test]
    fn test_preview_is_capped() {
        let mut csv = String::from("id,value\n");
        for i in 0..250 {
            csv.push_str(&format!("{},{}\n", i, i * 2));
        }

        let summary = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(summary.rows, 250);
        assert_eq!(summary.data.len(), CSV_PREVIEW_ROWS);
        assert_eq!(summary.data[99].get("id"), Some(&json!(99)));
    }

    #[test]
    fn test_long_row_fails() {
        let err = parse_csv(b"a,b\n1,2\n3,4,5\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(
            err.to_string(),
            "Error parsing CSV file: Expected 2 fields in line 3, saw 3"
        );
    }

    #[test]
    fn test_short_row_padded_with_null() {
        let summary = parse_csv(b"a,b\n1,2\n3\n").unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.data[1].get("a"), Some(&json!(3)));
        assert_eq!(summary.data[1].get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_blank_headers_are_unnamed() {
        let summary = parse_csv(b"id,,\n1,2,3\n").unwrap();
        assert_eq!(summary.column_names, vec!["id", "Unnamed: 1", "Unnamed: 2"]);
        assert_eq!(summary.data[0].get("Unnamed: 2"), Some(&json!(3)));
    }

    #[test]
    fn test_wide_blank_header_parses_quickly() {
        let mut csv = ",".repeat(9_999);
        csv.push('\n');
        let started = std::time::Instant::now();
        let summary = parse_csv(csv.as_bytes()).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        assert_eq!(summary.columns, 10_000);
        assert_eq!(summary.column_names[9_999], "Unnamed: 9999");
        assert_eq!(summary.rows, 0);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let err = parse_csv(b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = parse_csv(b"").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error parsing CSV file: No columns to parse from file"
        );
    }

    #[test]
    fn test_header_only() {
        let summary = parse_csv(b"a,b,c\n").unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.columns, 3);
        assert!(summary.data.is_empty());
    }
}
