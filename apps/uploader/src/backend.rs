//! Client side of `POST /api/v1/parse-resume`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use ats_api::parsing::document::UploadedDocument;
use ats_api::parsing::errors::{ErrorKind, ParseError};
use ats_api::parsing::handlers::FILE_FIELD;
use ats_api::parsing::models::{ParseResponse, ParsedResume};

#[async_trait]
pub trait ParseBackend: Send + Sync {
    async fn parse(&self, doc: &UploadedDocument) -> Result<ParsedResume, ParseError>;
}

pub struct HttpParseBackend {
    client: Client,
    base_url: String,
}

impl HttpParseBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/api/v1/parse-resume",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ParseBackend for HttpParseBackend {
    async fn parse(&self, doc: &UploadedDocument) -> Result<ParsedResume, ParseError> {
        let mut part = Part::bytes(doc.bytes.to_vec()).file_name(doc.file_name.clone());
        if let Some(mime) = &doc.content_type {
            part = part.mime_str(mime).map_err(|e| {
                warn!("Invalid content type '{mime}': {e}");
                ParseError::unsupported_format(mime)
            })?;
        }
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Parse request failed: {e}");
                ParseError::new(
                    ErrorKind::ModelUnavailable,
                    "Could not reach the resume parsing service",
                )
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Reading parse response failed: {e}");
            ParseError::model_unavailable()
        })?;
        debug!(%status, bytes = body.len(), "Parse response received");

        match serde_json::from_slice::<ParseResponse>(&body) {
            Ok(envelope) => interpret(status, envelope),
            Err(e) => {
                warn!("Unreadable parse response ({status}): {e}");
                if status.is_server_error() {
                    Err(ParseError::model_unavailable())
                } else {
                    Err(ParseError::malformed_output())
                }
            }
        }
    }
}

/// Turns the response envelope into a result. The machine-readable `reason`
/// decides the error kind; without it the status code does.
pub fn interpret(status: StatusCode, envelope: ParseResponse) -> Result<ParsedResume, ParseError> {
    if envelope.success {
        return match (envelope.candidate, envelope.found_fields) {
            (Some(candidate), Some(found_fields)) => Ok(ParsedResume {
                candidate,
                found_fields,
            }),
            (Some(candidate), None) => Ok(ParsedResume {
                found_fields: candidate.found_fields(),
                candidate,
            }),
            (None, _) => Err(ParseError::malformed_output()),
        };
    }

    let kind = envelope.reason.unwrap_or(if status.is_server_error() {
        ErrorKind::ModelUnavailable
    } else {
        ErrorKind::InvalidUpload
    });
    Err(ParseError::new(kind, envelope.error.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(v: serde_json::Value) -> ParseResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let parsed = interpret(
            StatusCode::OK,
            envelope(json!({
                "success": true,
                "candidate": {"first_name": "Jane", "email": "jane@x.com"},
                "found_fields": ["first_name", "email"],
                "message": "Successfully extracted 2 fields from resume"
            })),
        )
        .unwrap();
        assert_eq!(parsed.candidate.first_name.as_deref(), Some("Jane"));
        assert_eq!(parsed.found_fields.len(), 2);
    }

    #[test]
    fn test_reason_selects_kind() {
        let err = interpret(
            StatusCode::BAD_REQUEST,
            envelope(json!({
                "success": false,
                "error": "File size exceeds 10MB limit",
                "reason": "file_too_large"
            })),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::FileTooLarge);
        assert_eq!(err.message, "File size exceeds 10MB limit");
    }

    #[test]
    fn test_missing_reason_falls_back_to_status() {
        let err = interpret(
            StatusCode::INTERNAL_SERVER_ERROR,
            envelope(json!({"success": false, "error": "boom"})),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModelUnavailable);

        let err = interpret(
            StatusCode::METHOD_NOT_ALLOWED,
            envelope(json!({"success": false, "error": "Method not allowed"})),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUpload);
    }

    #[test]
    fn test_success_without_candidate_is_malformed() {
        let err = interpret(StatusCode::OK, envelope(json!({"success": true}))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedModelOutput);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let backend = HttpParseBackend::new(Client::new(), "http://localhost:8080/");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:8080/api/v1/parse-resume"
        );
    }
}
