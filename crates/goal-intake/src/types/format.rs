//! Format tags derived from upload filenames

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Normalized file-type identifier selecting the parser
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    /// Comma-separated values
    Csv,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// Legacy Excel workbook (.xls)
    Xls,
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
}

impl FormatTag {
    /// Every accepted tag, in the order reported to clients
    pub const ALL: [FormatTag; 5] = [
        FormatTag::Csv,
        FormatTag::Xlsx,
        FormatTag::Xls,
        FormatTag::Pdf,
        FormatTag::Txt,
    ];

    /// Lowercase extension string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }

    /// Extract the tag from a filename suffix.
    ///
    /// `report.CSV` yields `Csv`; names without a suffix or with an
    /// unsupported one fail with [`Error::UnsupportedFormat`].
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        extension.parse()
    }
}

impl FromStr for FormatTag {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
