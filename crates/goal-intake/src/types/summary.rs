//! Structured summaries produced by the format parsers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One preview row, keyed by column name
pub type PreviewRow = Map<String, Value>;

/// Bounded, format-specific result of a successful parse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ParsedContent {
    #[serde(rename = "csv")]
    Csv(CsvSummary),
    #[serde(rename = "excel")]
    Spreadsheet(SpreadsheetSummary),
    #[serde(rename = "pdf")]
    Document(DocumentSummary),
    #[serde(rename = "txt")]
    PlainText(TextSummary),
}

impl ParsedContent {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Csv(_) => "csv",
            Self::Spreadsheet(_) => "excel",
            Self::Document(_) => "pdf",
            Self::PlainText(_) => "txt",
        }
    }
}

/// CSV table statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// First rows of the table (capped)
    pub data: Vec<PreviewRow>,
    pub summary: CsvTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvTotals {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Approximate in-memory footprint of every cell, in bytes
    pub memory_usage: u64,
}

/// Workbook statistics across all sheets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpreadsheetSummary {
    /// Sheet names in workbook order
    pub sheets: Vec<String>,
    pub sheets_data: Vec<SheetSummary>,
    pub summary: SpreadsheetTotals,
}

/// Statistics for a single sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub data: Vec<PreviewRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpreadsheetTotals {
    pub total_sheets: usize,
    pub total_rows: usize,
}

/// PDF page count and extracted text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub total_pages: usize,
    pub pages_parsed: usize,
    pub text_content: Vec<PageText>,
    pub summary: DocumentTotals,
}

/// Text from a single page (1-indexed)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentTotals {
    pub total_pages: usize,
    /// Characters across all extracted pages
    pub total_text_length: usize,
}

/// Plain text line and character statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextSummary {
    pub total_lines: usize,
    pub total_characters: usize,
    pub content_preview: String,
    pub lines_preview: Vec<String>,
    pub summary: TextTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextTotals {
    pub total_lines: usize,
    pub total_characters: usize,
    pub average_line_length: f64,
}
