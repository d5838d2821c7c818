//! Core types for the intake system

pub mod format;
pub mod record;
pub mod response;
pub mod summary;

pub use format::FormatTag;
pub use record::{IngestionRecord, RecordChange, RecordStatus, MAX_RUNNING_PROGRESS};
pub use response::{PendingView, ProgressView, RecordDetail, RecordListItem, UploadResponse};
pub use summary::{
    CsvSummary, CsvTotals, DocumentSummary, DocumentTotals, PageText, ParsedContent, PreviewRow,
    SheetSummary, SpreadsheetSummary, SpreadsheetTotals, TextSummary, TextTotals,
};
