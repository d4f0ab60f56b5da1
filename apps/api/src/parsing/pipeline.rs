//! The résumé parsing pipeline: size and format gate, then
//! extract → validate → structure (under retry) → sanitize.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::extraction::{DocumentFormat, ExtractedText, ExtractionConfig, ExtractorTable};
use crate::parsing::document::UploadedDocument;
use crate::parsing::errors::ParseError;
use crate::parsing::models::{ParsedResume, RawCandidate};
use crate::parsing::retry::{RetryController, RetryPolicy, Sleeper, TokioSleeper};
use crate::parsing::sanitize::{sanitize, MissingNamePolicy};
use crate::parsing::structuring::Structurer;

/// Everything that varies between deployments of the parser.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    pub extraction: ExtractionConfig,
    pub retry: RetryPolicy,
    pub missing_name: MissingNamePolicy,
}

#[derive(Clone)]
pub struct ResumePipeline {
    extractors: Arc<ExtractorTable>,
    structurer: Arc<dyn Structurer>,
    retry: RetryController,
    missing_name: MissingNamePolicy,
}

impl ResumePipeline {
    pub fn new(config: &ParserConfig, structurer: Arc<dyn Structurer>) -> Self {
        Self::with_sleeper(config, structurer, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        config: &ParserConfig,
        structurer: Arc<dyn Structurer>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            extractors: Arc::new(ExtractorTable::from_config(&config.extraction)),
            structurer,
            retry: RetryController::new(config.retry, sleeper),
            missing_name: config.missing_name,
        }
    }

    /// Parses one document. Size and format are checked before any byte is
    /// read; nothing is retried unless the model endpoint was unavailable.
    pub async fn parse(
        &self,
        doc: UploadedDocument,
        cancel: &CancellationToken,
    ) -> Result<ParsedResume, ParseError> {
        doc.check_size()?;
        let format = doc.format()?;
        if !self.extractors.accepts(format) {
            return Err(ParseError::unsupported_format(format.mime()));
        }

        info!(
            file_name = %doc.file_name,
            size = doc.size(),
            format = format.mime(),
            "Parsing resume"
        );

        let raw = self
            .retry
            .run(cancel, |attempt| {
                let extractors = Arc::clone(&self.extractors);
                let structurer = Arc::clone(&self.structurer);
                let bytes = doc.bytes.clone();
                async move {
                    debug!(attempt, "Extracting and structuring");
                    let text = extract_blocking(extractors, format, bytes).await?;
                    structurer.structure(&text).await
                }
            })
            .await?;

        self.finish(&raw)
    }

    fn finish(&self, raw: &RawCandidate) -> Result<ParsedResume, ParseError> {
        let (candidate, found_fields) = sanitize(raw, self.missing_name)?;
        info!(fields = found_fields.len(), "Resume parsed");
        Ok(ParsedResume {
            candidate,
            found_fields,
        })
    }
}

/// PDF and DOCX decoding is CPU-bound, so it runs off the async workers.
async fn extract_blocking(
    extractors: Arc<ExtractorTable>,
    format: DocumentFormat,
    bytes: Bytes,
) -> Result<ExtractedText, ParseError> {
    tokio::task::spawn_blocking(move || extractors.extract(format, &bytes))
        .await
        .map_err(|e| {
            warn!("Extraction task failed: {e}");
            ParseError::extraction_failed("Could not read the document.")
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::docx::tests::docx_fixture;
    use crate::extraction::MIME_DOCX;
    use crate::parsing::errors::ErrorKind;
    use crate::parsing::retry::tests::RecordingSleeper;
    use crate::parsing::testing::ScriptedStructurer;
    use serde_json::json;
    use std::time::Duration;

    const RESUME: &str = "Jane Doe\njane@x.com\nSkills: Go, Rust\nSenior engineer with ten years of backend work.";

    fn jane() -> RawCandidate {
        serde_json::from_value(json!({
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "jane@x.com",
            "skills": ["Go", "Rust"]
        }))
        .unwrap()
    }

    fn pipeline(structurer: Arc<ScriptedStructurer>, max_attempts: u32) -> ResumePipeline {
        let config = ParserConfig {
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(10),
            },
            ..Default::default()
        };
        ResumePipeline::with_sleeper(&config, structurer, Arc::new(RecordingSleeper::default()))
    }

    fn text_doc(body: &str) -> UploadedDocument {
        UploadedDocument::new("resume.txt", Some("text/plain".into()), body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_plain_text_resume_succeeds() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let parsed = pipeline(structurer.clone(), 3)
            .parse(text_doc(RESUME), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(parsed.candidate.first_name.as_deref(), Some("Jane"));
        assert_eq!(
            parsed.candidate.skills,
            Some(vec!["Go".to_string(), "Rust".to_string()])
        );
        assert_eq!(
            parsed.found_fields.0,
            vec!["first_name", "last_name", "email", "skills"]
        );
        assert_eq!(parsed.message(), "Successfully extracted 4 fields from resume");
        assert_eq!(structurer.calls(), 1);
        assert!(structurer.last_text().unwrap().starts_with("Jane Doe"));
    }

    #[tokio::test]
    async fn test_scanned_pdf_is_insufficient_text_without_model_call() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let config = ParserConfig {
            extraction: ExtractionConfig {
                pdf_strategy: crate::extraction::PdfStrategy::ByteScan,
                ..Default::default()
            },
            ..Default::default()
        };
        let pipeline = ResumePipeline::with_sleeper(
            &config,
            structurer.clone(),
            Arc::new(RecordingSleeper::default()),
        );
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend((0..4096u32).map(|i| 128 + (i % 128) as u8));
        let doc = UploadedDocument::new("scan.pdf", Some("application/pdf".into()), pdf);

        let err = pipeline
            .parse(doc, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientText);
        assert_eq!(structurer.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_mime_is_unsupported_before_extraction() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let doc = UploadedDocument::new(
            "resume.pdf",
            Some("application/x-msdownload".into()),
            b"MZ\x90\x00".to_vec(),
        );
        let err = pipeline(structurer.clone(), 3)
            .parse(doc, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
        assert_eq!(structurer.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_format_check() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let doc = UploadedDocument::new(
            "big.exe",
            Some("application/x-msdownload".into()),
            vec![0u8; crate::parsing::document::MAX_UPLOAD_BYTES + 1],
        );
        let err = pipeline(structurer.clone(), 3)
            .parse(doc, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::FileTooLarge);
        assert_eq!(structurer.calls(), 0);
    }

    #[tokio::test]
    async fn test_two_outages_then_success() {
        let structurer = Arc::new(ScriptedStructurer::new(vec![
            Err(ParseError::model_unavailable()),
            Err(ParseError::model_unavailable()),
            Ok(jane()),
        ]));
        let parsed = pipeline(structurer.clone(), 3)
            .parse(text_doc(RESUME), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(parsed.candidate.last_name.as_deref(), Some("Doe"));
        assert_eq!(structurer.calls(), 3);
    }

    #[tokio::test]
    async fn test_always_unavailable_stops_at_budget() {
        let structurer = Arc::new(ScriptedStructurer::new(vec![
            Err(ParseError::model_unavailable()),
            Err(ParseError::model_unavailable()),
            Err(ParseError::model_unavailable()),
        ]));
        let err = pipeline(structurer.clone(), 2)
            .parse(text_doc(RESUME), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModelUnavailable);
        assert_eq!(structurer.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejected_model_request_is_not_retried() {
        let structurer = Arc::new(ScriptedStructurer::failing(ParseError::model_rejected()));
        let err = pipeline(structurer.clone(), 3)
            .parse(text_doc(RESUME), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModelRejected);
        assert_eq!(structurer.calls(), 1);
    }

    #[tokio::test]
    async fn test_nameless_candidate_rejected_by_default() {
        let raw: RawCandidate = serde_json::from_value(json!({"email": "jane@x.com"})).unwrap();
        let structurer = Arc::new(ScriptedStructurer::succeeding(raw));
        let err = pipeline(structurer.clone(), 3)
            .parse(text_doc(RESUME), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingName);
        assert_eq!(structurer.calls(), 1);
    }

    #[tokio::test]
    async fn test_docx_resume_reaches_structurer() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let bytes = docx_fixture(&[
            "Jane Doe",
            "jane@x.com",
            "Skills: Go, Rust",
            "Senior engineer with ten years of backend work.",
        ]);
        let doc = UploadedDocument::new("cv.docx", Some(MIME_DOCX.into()), bytes);
        pipeline(structurer.clone(), 3)
            .parse(doc, &CancellationToken::new())
            .await
            .unwrap();
        assert!(structurer
            .last_text()
            .unwrap()
            .contains("Skills: Go, Rust"));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_parse() {
        let structurer = Arc::new(ScriptedStructurer::succeeding(jane()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline(structurer, 3)
            .parse(text_doc(RESUME), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }
}
