use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use regex::Regex;

/// Local PDF text extraction. Swappable so the fallback branch can be exercised
/// without crafting PDFs.
///
/// Implementations are synchronous; callers run them on the blocking pool.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Default extractor backed by the `pdf-extract` crate.
pub struct PdfExtract;

impl PdfTextExtractor for PdfExtract {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| anyhow!("PDF extraction error: {e}"))
    }
}

fn trailing_whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+\n").expect("static regex"))
}

/// Collapses whitespace runs that end in a newline into a single newline, then trims.
pub fn clean_extracted_text(raw: &str) -> String {
    trailing_whitespace()
        .replace_all(raw, "\n")
        .trim()
        .to_string()
}

/// First `max_chars` characters of `text`, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
