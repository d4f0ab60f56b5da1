use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{post, MethodRouter},
    Json,
};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::parsing::document::{UploadedDocument, MAX_UPLOAD_BYTES};
use crate::parsing::errors::{ErrorKind, ParseError};
use crate::parsing::models::{ParseOutcome, ParseResponse};
use crate::state::AppState;

/// Multipart field carrying the résumé.
pub const FILE_FIELD: &str = "file";

/// Room for multipart boundaries and part headers on top of the file itself,
/// so a file just over the limit still reaches the size check.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// POST /api/v1/parse-resume
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResponse>, AppError> {
    let multipart = multipart.map_err(|e| {
        warn!("Rejected non-multipart upload: {e}");
        ParseError::new(
            ErrorKind::InvalidUpload,
            "Expected a multipart/form-data upload with a 'file' field",
        )
    })?;
    let doc = read_upload(multipart).await?;

    // Server shutdown cancels every in-flight parse.
    let cancel = state.shutdown.child_token();
    let outcome = ParseOutcome::from(state.pipeline.parse(doc, &cancel).await);
    match outcome {
        ParseOutcome::Failure { reason, message } => {
            info!(%reason, "Resume parse failed");
            Err(ParseError::new(reason, message).into())
        }
        success => Ok(Json(ParseResponse::from(success))),
    }
}

/// OPTIONS /api/v1/parse-resume
async fn handle_preflight() -> &'static str {
    "ok"
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ParseResponse::error_only("Method not allowed")),
    )
}

/// The parse-resume route: POST does the work, OPTIONS answers preflight,
/// every other method gets the JSON envelope with 405.
pub fn parse_resume_route() -> MethodRouter<AppState> {
    post(handle_parse_resume)
        .options(handle_preflight)
        .fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
}

/// Reads exactly one `file` part. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, ParseError> {
    let mut upload: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(ParseError::new(
                ErrorKind::InvalidUpload,
                "Only one file can be parsed at a time",
            ));
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(UploadedDocument::new(file_name, content_type, bytes));
    }

    upload.ok_or_else(|| ParseError::new(ErrorKind::InvalidUpload, "No file provided"))
}

fn multipart_error(e: MultipartError) -> ParseError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ParseError::file_too_large(MAX_UPLOAD_BYTES);
    }
    warn!("Malformed multipart body: {e}");
    ParseError::new(ErrorKind::InvalidUpload, "The upload could not be read")
}
