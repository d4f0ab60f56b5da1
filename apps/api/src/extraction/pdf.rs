//! PDF readers. `PdfTextLayerExtractor` is the real one; `PdfByteScanExtractor`
//! is a lossy fallback that only understands literal strings.

use std::panic::{self, AssertUnwindSafe};

use regex::bytes::Regex;
use tracing::warn;

use crate::extraction::{Extractor, RawText};
use crate::parsing::errors::ParseError;

/// The header may be preceded by junk, but not by much.
const HEADER_WINDOW: usize = 1024;
/// Below this, structural matches are considered a miss and the printable sweep runs.
const MIN_STRUCTURAL_CHARS: usize = 100;

pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn require_header(bytes: &[u8]) -> Result<(), ParseError> {
    if has_pdf_header(bytes) {
        Ok(())
    } else {
        Err(ParseError::extraction_failed(
            "The file is not a valid PDF document.",
        ))
    }
}

/// Decodes the PDF text layer with `pdf-extract`, which handles font tables
/// and string encodings. Pages come back separated by form feeds.
pub struct PdfTextLayerExtractor;

impl Extractor for PdfTextLayerExtractor {
    fn name(&self) -> &'static str {
        "pdf_text_layer"
    }

    fn extract(&self, bytes: &[u8]) -> Result<RawText, ParseError> {
        require_header(bytes)?;

        // pdf-extract can panic on malformed input.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        match result {
            Ok(Ok(text)) => Ok(RawText::exact(text)),
            Ok(Err(e)) => {
                warn!("PDF text extraction failed: {e}");
                Err(ParseError::extraction_failed(
                    "Could not read the PDF. It may be corrupted, encrypted or password-protected.",
                ))
            }
            Err(_) => {
                warn!("PDF reader panicked");
                Err(ParseError::extraction_failed(
                    "Could not read the PDF. It may be corrupted.",
                ))
            }
        }
    }
}

/// Scans raw bytes for literal strings. Tries, in order of preference by
/// yield: text-show operands (`Tj`, `TJ`), any literal string, then a sweep
/// of printable ASCII words.
pub struct PdfByteScanExtractor {
    literal: Regex,
    show_text: Regex,
    show_array: Regex,
}

impl PdfByteScanExtractor {
    pub fn new() -> Self {
        // The patterns are fixed; a failure here is a programming error.
        Self {
            literal: Regex::new(r"\((?s-u:(?:[^()\\]|\\.)*)\)").expect("literal pattern"),
            show_text: Regex::new(r"\((?s-u:((?:[^()\\]|\\.)*))\)\s*Tj").expect("Tj pattern"),
            show_array: Regex::new(r"\[(?s-u:([^\]]*))\]\s*TJ").expect("TJ pattern"),
        }
    }

    fn literals(&self, bytes: &[u8]) -> String {
        self.literal
            .find_iter(bytes)
            .map(|m| unescape_literal(&m.as_bytes()[1..m.len() - 1]))
            .filter(|s| s.chars().any(|c| c.is_ascii_alphabetic()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn shown_text(&self, bytes: &[u8]) -> String {
        let mut pieces = Vec::new();
        for caps in self.show_text.captures_iter(bytes) {
            if let Some(m) = caps.get(1) {
                pieces.push(unescape_literal(m.as_bytes()));
            }
        }
        for caps in self.show_array.captures_iter(bytes) {
            if let Some(m) = caps.get(1) {
                let joined: String = self
                    .literal
                    .find_iter(m.as_bytes())
                    .map(|lit| unescape_literal(&lit.as_bytes()[1..lit.len() - 1]))
                    .collect();
                pieces.push(joined);
            }
        }
        pieces.retain(|p| !p.trim().is_empty());
        pieces.join(" ")
    }
}

impl Default for PdfByteScanExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfByteScanExtractor {
    fn name(&self) -> &'static str {
        "pdf_byte_scan"
    }

    fn extract(&self, bytes: &[u8]) -> Result<RawText, ParseError> {
        require_header(bytes)?;

        let mut best = self.shown_text(bytes);
        let literals = self.literals(bytes);
        if literals.len() > best.len() {
            best = literals;
        }
        if best.len() < MIN_STRUCTURAL_CHARS {
            let sweep = printable_sweep(bytes);
            if sweep.len() > best.len() {
                best = sweep;
            }
        }

        Ok(RawText {
            text: clean(&best),
            approximate: true,
        })
    }
}

/// Resolves PDF literal-string escapes (`\n`, `\(`, `\\`, octal).
pub fn unescape_literal(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' || i + 1 >= raw.len() {
            out.push(b);
            i += 1;
            continue;
        }
        let next = raw[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' | b'f' => out.push(b' '),
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 && i < raw.len() && (b'0'..=b'7').contains(&raw[i]) {
                    value = value * 8 + u32::from(raw[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push((value & 0xFF) as u8);
            }
            b'\r' | b'\n' => {}
            other => out.push(other),
        }
    }
    // PDFDocEncoding agrees with Latin-1 for the printable range.
    out.iter().map(|&b| b as char).collect()
}

/// Words of three or more printable ASCII characters containing a letter.
fn printable_sweep(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { ' ' })
        .collect();
    text.split_whitespace()
        .filter(|w| w.len() > 2 && w.chars().any(|c| c.is_ascii_alphabetic()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps printable ASCII, collapses whitespace.
fn clean(text: &str) -> String {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
