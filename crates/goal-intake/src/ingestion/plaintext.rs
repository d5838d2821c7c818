//! Plain text parser

use crate::error::{Error, Result};
use crate::types::{TextSummary, TextTotals};

/// Characters kept in the content preview
pub const TEXT_PREVIEW_CHARS: usize = 2000;

/// Lines kept in the line preview
pub const TEXT_PREVIEW_LINES: usize = 100;

const FORMAT: &str = "TXT";

/// Parse UTF-8 text into line and character statistics.
///
/// `\r\n` and lone `\r` are treated as line breaks.
pub fn parse_text(data: &[u8]) -> Result<TextSummary> {
    let raw = std::str::from_utf8(data)
        .map_err(|e| Error::parse(FORMAT, format!("invalid UTF-8: {}", e)))?;
    let content = raw.replace("\r\n", "\n").replace('\r', "\n");

    let total_characters = content.chars().count();
    let total_lines = if content.is_empty() {
        0
    } else {
        content.split('\n').count()
    };

    let average_line_length = if total_lines == 0 {
        0.0
    } else {
        total_characters as f64 / total_lines as f64
    };

    Ok(TextSummary {
        total_lines,
        total_characters,
        content_preview: content.chars().take(TEXT_PREVIEW_CHARS).collect(),
        lines_preview: content
            .split('\n')
            .take(if total_lines == 0 { 0 } else { TEXT_PREVIEW_LINES })
            .map(str::to_string)
            .collect(),
        summary: TextTotals {
            total_lines,
            total_characters,
            average_line_length,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_line_file() {
        let text = format!("{}\n{}\n{}", "x".repeat(22), "y".repeat(23), "z".repeat(23));
        assert_eq!(text.chars().count(), 70);

        let summary = parse_text(text.as_bytes()).unwrap();
        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.total_characters, 70);
        assert!((summary.summary.average_line_length - 70.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.lines_preview.len(), 3);
        assert_eq!(summary.content_preview, text);
    }

    #[test]
    fn test_empty_file() {
        let summary = parse_text(b"").unwrap();
        assert_eq!(summary.total_lines, 0);
        assert_eq!(summary.total_characters, 0);
        assert_eq!(summary.summary.average_line_length, 0.0);
        assert!(summary.lines_preview.is_empty());
    }

    #[test]
    fn test_previews_are_capped() {
        let text = (0..500).map(|i| format!("line number {}", i)).collect::<Vec<_>>().join("\n");
        let summary = parse_text(text.as_bytes()).unwrap();

        assert_eq!(summary.total_lines, 500);
        assert_eq!(summary.lines_preview.len(), TEXT_PREVIEW_LINES);
        assert_eq!(summary.content_preview.chars().count(), TEXT_PREVIEW_CHARS);
    }

    #[test]
    fn test_crlf_line_endings() {
        let summary = parse_text(b"one\r\ntwo\r\n").unwrap();
        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.total_characters, 8);
    }

    #[test]
    fn test_counts_unicode_scalars() {
        let summary = parse_text("héllo wörld".as_bytes()).unwrap();
        assert_eq!(summary.total_characters, 11);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let err = parse_text(&[0x66, 0xff, 0x6f]).unwrap_err();
        assert!(err.to_string().starts_with("Error parsing TXT file: invalid UTF-8"));
    }
}
