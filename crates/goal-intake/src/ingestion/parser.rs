//! Format parser dispatch

use super::{document, plaintext, spreadsheet, tabular};
use crate::error::Result;
use crate::types::{FormatTag, ParsedContent};

/// The closed set of format parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parser {
    Csv,
    /// Shared by `xlsx` and `xls`
    Spreadsheet,
    Document,
    PlainText,
}

impl Parser {
    /// Select the parser for a format tag, case-insensitively.
    ///
    /// Fails with `UnsupportedFormat` for anything outside the supported set.
    pub fn select(format_tag: &str) -> Result<Self> {
        let tag: FormatTag = format_tag.parse()?;
        Ok(Self::for_format(tag))
    }

    /// Parser for an already validated tag
    pub fn for_format(tag: FormatTag) -> Self {
        match tag {
            FormatTag::Csv => Self::Csv,
            FormatTag::Xlsx | FormatTag::Xls => Self::Spreadsheet,
            FormatTag::Pdf => Self::Document,
            FormatTag::Txt => Self::PlainText,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::Document => "document",
            Self::PlainText => "plain_text",
        }
    }

    /// Parse raw bytes into a bounded summary.
    ///
    /// Every failure comes back as `Error::Parse`.
    pub fn parse(&self, data: &[u8]) -> Result<ParsedContent> {
        match self {
            Self::Csv => tabular::parse_csv(data).map(ParsedContent::Csv),
            Self::Spreadsheet => spreadsheet::parse_workbook(data).map(ParsedContent::Spreadsheet),
            Self::Document => document::parse_pdf(data).map(ParsedContent::Document),
            Self::PlainText => plaintext::parse_text(data).map(ParsedContent::PlainText),
        }
    }
}
