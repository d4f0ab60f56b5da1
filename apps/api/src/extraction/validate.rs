//! Extraction Validator — rejects text too thin to be a real text layer.

use crate::parsing::errors::ParseError;

/// Minimum normalized length, in characters.
pub const MIN_TEXT_CHARS: usize = 50;
/// Minimum alphabetic characters. Scanned PDFs often yield a long run of
/// digits and punctuation from the page structure and nothing else.
pub const MIN_LETTERS: usize = 20;

pub fn validate_text(text: &str) -> Result<(), ParseError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return Err(ParseError::insufficient_text());
    }
    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if letters < MIN_LETTERS {
        return Err(ParseError::insufficient_text());
    }
    Ok(())
}
