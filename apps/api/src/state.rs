use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::candidates::repository::CandidateRepository;
use crate::parsing::pipeline::ResumePipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ResumePipeline,
    /// Pluggable candidate store. Default: PgCandidateRepository.
    pub candidates: Arc<dyn CandidateRepository>,
    /// Cancelled on shutdown; each parse runs under a child token.
    pub shutdown: CancellationToken,
}
