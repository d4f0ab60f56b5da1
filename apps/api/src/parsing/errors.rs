use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a résumé parse did not produce a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    FileTooLarge,
    InvalidUpload,
    ExtractionFailed,
    InsufficientText,
    ModelUnavailable,
    ModelRejected,
    MalformedModelOutput,
    NoCandidateFound,
    MissingName,
    Cancelled,
}

impl ErrorKind {
    /// Only upstream model failures are worth another attempt.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::ModelUnavailable)
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::UnsupportedFormat
            | ErrorKind::FileTooLarge
            | ErrorKind::InvalidUpload
            | ErrorKind::ExtractionFailed
            | ErrorKind::InsufficientText
            | ErrorKind::NoCandidateFound
            | ErrorKind::MissingName => StatusCode::BAD_REQUEST,
            ErrorKind::ModelUnavailable
            | ErrorKind::ModelRejected
            | ErrorKind::MalformedModelOutput => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::FileTooLarge => "file_too_large",
            ErrorKind::InvalidUpload => "invalid_upload",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::InsufficientText => "insufficient_text",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::ModelRejected => "model_rejected",
            ErrorKind::MalformedModelOutput => "malformed_model_output",
            ErrorKind::NoCandidateFound => "no_candidate_found",
            ErrorKind::MissingName => "missing_name",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline failure. `message` is safe to show to end users; upstream
/// details are logged where they happen and never copied in here.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unsupported_format(mime: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedFormat,
            format!("Unsupported file type '{mime}'. Please upload a PDF, DOCX or TXT file."),
        )
    }

    pub fn file_too_large(limit_bytes: usize) -> Self {
        Self::new(
            ErrorKind::FileTooLarge,
            format!(
                "File size exceeds {}MB limit",
                limit_bytes / (1024 * 1024)
            ),
        )
    }

    pub fn extraction_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExtractionFailed, detail)
    }

    pub fn insufficient_text() -> Self {
        Self::new(
            ErrorKind::InsufficientText,
            "The document contains insufficient text. Please ensure it has selectable text \
             (not a scanned image).",
        )
    }

    pub fn model_unavailable() -> Self {
        Self::new(
            ErrorKind::ModelUnavailable,
            "Resume analysis failed: the AI service is currently unavailable",
        )
    }

    pub fn model_rejected() -> Self {
        Self::new(
            ErrorKind::ModelRejected,
            "Resume analysis failed: the AI service rejected the request",
        )
    }

    pub fn malformed_output() -> Self {
        Self::new(
            ErrorKind::MalformedModelOutput,
            "Resume analysis failed: the AI service returned an unreadable response",
        )
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "Resume parsing was cancelled")
    }
}
