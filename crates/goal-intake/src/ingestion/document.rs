//! PDF parser
//!
//! Pages are counted from the page tree; text is only extracted for the
//! leading pages, one page at a time.

use lopdf::{Document, ObjectId};

use crate::error::{Error, Result};
use crate::types::{DocumentSummary, DocumentTotals, PageText};

/// Pages whose text is extracted
pub const PDF_MAX_PAGES: usize = 10;

/// Characters kept per extracted page
pub const PDF_PAGE_CHARS: usize = 1000;

const FORMAT: &str = "PDF";

/// Parse a PDF into page count and leading page text
pub fn parse_pdf(data: &[u8]) -> Result<DocumentSummary> {
    let doc = Document::load_mem(data)
        .map_err(|e| Error::parse(FORMAT, format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    let total_pages = pages.len();

    let text_content: Vec<PageText> = pages
        .iter()
        .take(PDF_MAX_PAGES)
        .map(|(&page_number, &page_id)| PageText {
            page: page_number,
            text: truncate_chars(&page_text(&doc, page_number, page_id), PDF_PAGE_CHARS),
        })
        .collect();

    let total_text_length = text_content.iter().map(|p| p.text.chars().count()).sum();
    tracing::debug!(
        "Parsed PDF: {} pages, {} extracted",
        total_pages,
        text_content.len()
    );

    Ok(DocumentSummary {
        total_pages,
        pages_parsed: text_content.len(),
        text_content,
        summary: DocumentTotals {
            total_pages,
            total_text_length,
        },
    })
}

/// Text of a single page, falling back to a raw content-stream scan
fn page_text(doc: &Document, page_number: u32, page_id: ObjectId) -> String {
    match doc.extract_text(&[page_number]) {
        Ok(text) if !text.trim().is_empty() => return clean_text(&text),
        Ok(_) => {}
        Err(e) => {
            tracing::debug!("Font decoding failed for page {}: {}", page_number, e);
        }
    }

    match doc.get_page_content(page_id) {
        Ok(content) => clean_text(&extract_text_from_content(&content)),
        Err(e) => {
            tracing::warn!("Could not read content of page {}: {}", page_number, e);
            String::new()
        }
    }
}

/// Strip nulls and blank lines
fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull string operands of `Tj`/`TJ` operators out of BT/ET blocks
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let line = line.trim();

        if line == "BT" {
            in_text_block = true;
            continue;
        }
        if line == "ET" {
            in_text_block = false;
            text.push('\n');
            continue;
        }

        if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
            if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                if start < end {
                    text.push_str(&unescape(&line[start + 1..end]));
                }
            }
        }
    }

    text
}

fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\\\", "\\")
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
