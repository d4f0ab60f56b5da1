//! User-facing failure text. Internal error details never reach these strings
//! except through the generic fallback, which shows the service's own message.

use ats_api::parsing::errors::ErrorKind;

/// Steps shown under extraction-type failures.
pub const TROUBLESHOOTING: [&str; 4] = [
    "Make sure the document contains selectable text",
    "Scanned documents and photos of resumes cannot be read",
    "Try a different file or format (PDF, DOCX or TXT)",
    "Run scanned resumes through OCR before uploading",
];

const GENERIC: &str = "Failed to parse resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    FileTooLarge,
    NonTextDocument,
    UnsupportedType,
    ServiceUnavailable,
    NoNameFound,
    Generic,
}

impl Template {
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::FileTooLarge => Template::FileTooLarge,
            ErrorKind::ExtractionFailed | ErrorKind::InsufficientText => Template::NonTextDocument,
            ErrorKind::UnsupportedFormat => Template::UnsupportedType,
            ErrorKind::ModelUnavailable
            | ErrorKind::ModelRejected
            | ErrorKind::MalformedModelOutput => Template::ServiceUnavailable,
            ErrorKind::MissingName => Template::NoNameFound,
            ErrorKind::NoCandidateFound | ErrorKind::InvalidUpload | ErrorKind::Cancelled => {
                Template::Generic
            }
        }
    }

    /// Renders the template. `detail` is only used by the generic fallback.
    pub fn render(self, detail: &str) -> String {
        match self {
            Template::FileTooLarge => {
                "This file is too large. Resumes must be 10MB or smaller.".to_string()
            }
            Template::NonTextDocument => {
                "We couldn't read any text from this document. It may be a scanned image \
                 or a protected file."
                    .to_string()
            }
            Template::UnsupportedType => {
                "This file type isn't supported. Please upload a PDF, DOCX, DOC or TXT file."
                    .to_string()
            }
            Template::ServiceUnavailable => {
                "The resume analysis service is unavailable right now. Please try again in a \
                 few minutes."
                    .to_string()
            }
            Template::NoNameFound => {
                "We couldn't find the candidate's name in this resume. Please add the \
                 candidate manually."
                    .to_string()
            }
            Template::Generic => {
                let detail = detail.trim();
                if detail.is_empty() {
                    GENERIC.to_string()
                } else {
                    detail.to_string()
                }
            }
        }
    }

    pub fn shows_checklist(self) -> bool {
        matches!(self, Template::NonTextDocument)
    }
}
