use bytes::Bytes;

use crate::extraction::DocumentFormat;
use crate::parsing::errors::ParseError;

/// Largest accepted upload. A file of exactly this size is accepted.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One uploaded file as received. Never persisted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    /// Declared content type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.filter(|c| !c.trim().is_empty()),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn check_size(&self) -> Result<(), ParseError> {
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ParseError::file_too_large(MAX_UPLOAD_BYTES));
        }
        Ok(())
    }

    /// The declared content type decides the format. The file extension is
    /// consulted only when no content type was declared.
    pub fn format(&self) -> Result<DocumentFormat, ParseError> {
        match &self.content_type {
            Some(mime) => {
                DocumentFormat::from_mime(mime).ok_or_else(|| ParseError::unsupported_format(mime))
            }
            None => DocumentFormat::from_file_name(&self.file_name)
                .ok_or_else(|| ParseError::unsupported_format("unknown")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::errors::ErrorKind;

    #[test]
    fn test_exactly_limit_is_accepted() {
        let doc = UploadedDocument::new("a.txt", None, vec![b'a'; MAX_UPLOAD_BYTES]);
        assert!(doc.check_size().is_ok());

        let doc = UploadedDocument::new("a.txt", None, vec![b'a'; MAX_UPLOAD_BYTES + 1]);
        assert_eq!(doc.check_size().unwrap_err().kind, ErrorKind::FileTooLarge);
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        let doc = UploadedDocument::new(
            "resume.pdf",
            Some("application/x-msdownload".into()),
            Bytes::new(),
        );
        assert_eq!(doc.format().unwrap_err().kind, ErrorKind::UnsupportedFormat);

        let doc = UploadedDocument::new("resume.bin", Some("text/plain".into()), Bytes::new());
        assert_eq!(doc.format().unwrap(), DocumentFormat::PlainText);
    }

    #[test]
    fn test_extension_used_without_declared_type() {
        let doc = UploadedDocument::new("CV.docx", Some("  ".into()), Bytes::new());
        assert_eq!(doc.format().unwrap(), DocumentFormat::Docx);

        let doc = UploadedDocument::new("setup.exe", None, Bytes::new());
        assert_eq!(doc.format().unwrap_err().kind, ErrorKind::UnsupportedFormat);
    }
}
