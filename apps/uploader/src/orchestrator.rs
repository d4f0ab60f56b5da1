//! Upload Orchestrator — the client-side state machine around one parse.
//!
//! `Idle → Parsing → Success | Error`. `Error` goes back to `Idle` through
//! `retry`; `Success` goes back through `discard` or a successful `commit`.
//! One parse is in flight at a time: nothing can be selected while `Parsing`.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ats_api::models::candidate::{CandidateRow, NewCandidate};
use ats_api::parsing::document::UploadedDocument;
use ats_api::parsing::errors::{ErrorKind, ParseError};
use ats_api::parsing::models::{Candidate, FoundFields, ParsedResume};

use crate::backend::ParseBackend;
use crate::messages::{Template, TROUBLESHOOTING};
use crate::progress::{ProgressTicker, TICK_INTERVAL};
use crate::sink::CandidateSink;

/// What the user reviews before committing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPreview {
    pub file_name: String,
    pub candidate: Candidate,
    pub found_fields: FoundFields,
}

impl ParsedPreview {
    fn new(file_name: String, parsed: ParsedResume) -> Self {
        Self {
            file_name,
            candidate: parsed.candidate,
            found_fields: parsed.found_fields,
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Successfully extracted {} fields from resume",
            self.found_fields.len()
        )
    }
}

/// A failed parse as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFailure {
    pub kind: ErrorKind,
    /// Rendered user-facing template.
    pub message: String,
    /// Troubleshooting steps; empty unless the document itself was unreadable.
    pub checklist: Vec<&'static str>,
}

impl From<ParseError> for UploadFailure {
    fn from(e: ParseError) -> Self {
        let template = Template::for_kind(e.kind);
        Self {
            kind: e.kind,
            message: template.render(&e.message),
            checklist: if template.shows_checklist() {
                TROUBLESHOOTING.to_vec()
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Parsing { file_name: String },
    Success(ParsedPreview),
    Error(UploadFailure),
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Parsing { .. } => "parsing",
            UploadState::Success(_) => "success",
            UploadState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("could not save candidate: {0}")]
    Commit(String),
}

pub struct UploadOrchestrator {
    backend: Arc<dyn ParseBackend>,
    sink: Arc<dyn CandidateSink>,
    state: UploadState,
    pending: Option<UploadedDocument>,
    progress: ProgressTicker,
}

impl UploadOrchestrator {
    pub fn new(backend: Arc<dyn ParseBackend>, sink: Arc<dyn CandidateSink>) -> Self {
        Self {
            backend,
            sink,
            state: UploadState::Idle,
            pending: None,
            progress: ProgressTicker::new(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn progress(&self) -> tokio::sync::watch::Receiver<u8> {
        self.progress.subscribe()
    }

    fn invalid(&self, action: &'static str) -> UploadError {
        UploadError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Accepts a drop or selection. Pre-flight checks (one file, size, type)
    /// run here, so a rejected file never reaches the service.
    pub fn select(&mut self, files: Vec<UploadedDocument>) -> Result<&UploadState, UploadError> {
        if !matches!(self.state, UploadState::Idle) {
            return Err(self.invalid("select a file"));
        }

        match preflight(files) {
            Ok(doc) => {
                info!(file_name = %doc.file_name, size = doc.size(), "Resume selected");
                self.progress.reset();
                self.state = UploadState::Parsing {
                    file_name: doc.file_name.clone(),
                };
                self.pending = Some(doc);
            }
            Err(e) => {
                info!(reason = %e.kind, "Resume rejected before upload");
                self.state = UploadState::Error(e.into());
            }
        }
        Ok(&self.state)
    }

    /// Drives the selected parse to `Success` or `Error`, ticking progress
    /// while it runs. Cancelling `cancel` abandons the request.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<&UploadState, UploadError> {
        let file_name = match &self.state {
            UploadState::Parsing { file_name } => file_name.clone(),
            _ => return Err(self.invalid("run a parse")),
        };
        let Some(doc) = self.pending.take() else {
            return Err(self.invalid("run a parse"));
        };

        let backend = Arc::clone(&self.backend);
        let parse = backend.parse(&doc);
        tokio::pin!(parse);

        let mut ticks = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(ParseError::cancelled()),
                r = &mut parse => break r,
                _ = ticks.tick() => self.progress.tick(),
            }
        };
        self.progress.complete();

        self.state = match result {
            Ok(parsed) => {
                info!(fields = parsed.found_fields.len(), "Resume parsed");
                UploadState::Success(ParsedPreview::new(file_name, parsed))
            }
            Err(e) => {
                warn!(reason = %e.kind, "Resume parse failed: {}", e.message);
                UploadState::Error(e.into())
            }
        };
        Ok(&self.state)
    }

    /// Error → Idle. Resets everything; nothing from the failed attempt is kept.
    pub fn retry(&mut self) -> Result<&UploadState, UploadError> {
        if !matches!(self.state, UploadState::Error(_)) {
            return Err(self.invalid("retry"));
        }
        self.reset();
        Ok(&self.state)
    }

    /// Success → Idle without saving.
    pub fn discard(&mut self) -> Result<&UploadState, UploadError> {
        if !matches!(self.state, UploadState::Success(_)) {
            return Err(self.invalid("discard"));
        }
        self.reset();
        Ok(&self.state)
    }

    /// Hands the previewed candidate to the sink. On failure the preview is
    /// kept so the user can try again.
    pub async fn commit(&mut self) -> Result<CandidateRow, UploadError> {
        let UploadState::Success(preview) = &self.state else {
            return Err(self.invalid("commit"));
        };
        let new = NewCandidate::from_parsed(&preview.candidate);

        match self.sink.create(&new).await {
            Ok(row) => {
                info!(candidate_id = %row.id, "Candidate saved");
                self.reset();
                Ok(row)
            }
            Err(e) => {
                warn!("Saving candidate failed: {e}");
                Err(UploadError::Commit(e.to_string()))
            }
        }
    }

    fn reset(&mut self) {
        self.state = UploadState::Idle;
        self.pending = None;
        self.progress.reset();
    }
}

fn preflight(files: Vec<UploadedDocument>) -> Result<UploadedDocument, ParseError> {
    let mut files = files.into_iter();
    let Some(doc) = files.next() else {
        return Err(ParseError::new(ErrorKind::InvalidUpload, "No file selected"));
    };
    if files.next().is_some() {
        return Err(ParseError::new(
            ErrorKind::InvalidUpload,
            "Please upload one resume at a time",
        ));
    }
    doc.check_size()?;
    doc.format()?;
    Ok(doc)
}
