//! Text Extractor — turns uploaded bytes into normalized plain text.
//!
//! One `Extractor` per document format, selected by declared MIME type through
//! `ExtractorTable`. Each extractor returns raw text; normalization and the
//! length/letter gate are shared and applied by `ExtractedText::new`.

pub mod docx;
pub mod pdf;
pub mod plain;
pub mod validate;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parsing::errors::ParseError;

pub use validate::{validate_text, MIN_LETTERS, MIN_TEXT_CHARS};

/// Document formats the service knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
    LegacyWord,
}

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";

impl DocumentFormat {
    /// Maps a declared content type (parameters ignored) to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            MIME_TEXT => Some(DocumentFormat::PlainText),
            MIME_PDF => Some(DocumentFormat::Pdf),
            MIME_DOCX => Some(DocumentFormat::Docx),
            MIME_DOC => Some(DocumentFormat::LegacyWord),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::PlainText),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::LegacyWord),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => MIME_TEXT,
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::Docx => MIME_DOCX,
            DocumentFormat::LegacyWord => MIME_DOC,
        }
    }
}

/// How PDFs are read. Exactly one strategy is used per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfStrategy {
    /// Decode the text layer with a real PDF reader.
    #[default]
    TextLayer,
    /// Lossy byte scan for environments without the reader. Drops or garbles
    /// text set in fonts with custom encodings.
    ByteScan,
}

impl std::str::FromStr for PdfStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text_layer" => Ok(PdfStrategy::TextLayer),
            "byte_scan" => Ok(PdfStrategy::ByteScan),
            other => Err(format!("unknown PDF strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub enable_pdf: bool,
    pub enable_docx: bool,
    pub pdf_strategy: PdfStrategy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enable_pdf: true,
            enable_docx: true,
            pdf_strategy: PdfStrategy::TextLayer,
        }
    }
}

/// Raw text recovered from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    pub text: String,
    /// Set when the extractor is known to be lossy.
    pub approximate: bool,
}

impl RawText {
    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            approximate: false,
        }
    }
}

pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, bytes: &[u8]) -> Result<RawText, ParseError>;
}

/// Normalized text that passed the length/letter gate. Only constructible
/// through `new`, so anything holding one is fit for structuring.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    text: String,
    approximate: bool,
}

impl ExtractedText {
    pub fn new(raw: RawText) -> Result<Self, ParseError> {
        let text = normalize(&raw.text);
        validate_text(&text)?;
        Ok(Self {
            text,
            approximate: raw.approximate,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Dispatch table from format to extractor.
pub struct ExtractorTable {
    extractors: HashMap<DocumentFormat, Arc<dyn Extractor>>,
}

impl ExtractorTable {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut extractors: HashMap<DocumentFormat, Arc<dyn Extractor>> = HashMap::new();
        extractors.insert(DocumentFormat::PlainText, Arc::new(plain::PlainTextExtractor));
        if config.enable_pdf {
            let pdf: Arc<dyn Extractor> = match config.pdf_strategy {
                PdfStrategy::TextLayer => Arc::new(pdf::PdfTextLayerExtractor),
                PdfStrategy::ByteScan => Arc::new(pdf::PdfByteScanExtractor::new()),
            };
            extractors.insert(DocumentFormat::Pdf, pdf);
        }
        if config.enable_docx {
            extractors.insert(DocumentFormat::Docx, Arc::new(docx::DocxExtractor));
            extractors.insert(DocumentFormat::LegacyWord, Arc::new(docx::LegacyWordExtractor));
        }
        Self { extractors }
    }

    pub fn accepts(&self, format: DocumentFormat) -> bool {
        self.extractors.contains_key(&format)
    }

    /// Extracts, normalizes and gates the text of `bytes` declared as `format`.
    pub fn extract(
        &self,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<ExtractedText, ParseError> {
        let extractor = self
            .extractors
            .get(&format)
            .ok_or_else(|| ParseError::unsupported_format(format.mime()))?;

        let raw = extractor.extract(bytes)?;
        if raw.approximate {
            warn!(
                extractor = extractor.name(),
                "Using lossy extraction; text may be incomplete"
            );
        }
        let text = ExtractedText::new(raw)?;
        debug!(
            extractor = extractor.name(),
            chars = text.char_count(),
            "Extracted resume text"
        );
        Ok(text)
    }
}

/// Collapses horizontal whitespace, trims lines, strips control characters
/// and keeps at most one blank line between paragraphs. Form feeds (page
/// breaks) become a blank line, so pages are joined like paragraphs.
pub fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;

    for line in raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{0c}', "\n\n")
        .split('\n')
    {
        let mut cleaned = String::with_capacity(line.len());
        let mut pending_space = false;
        for c in line.chars() {
            if c.is_whitespace() || c.is_control() {
                pending_space = true;
                continue;
            }
            if pending_space && !cleaned.is_empty() {
                cleaned.push(' ');
            }
            pending_space = false;
            cleaned.push(c);
        }

        if cleaned.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(&cleaned);
    }
    out
}
