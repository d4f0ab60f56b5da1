//! Where committed candidates go: `POST /api/v1/candidates`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use ats_api::models::candidate::{CandidateRow, NewCandidate};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("candidate rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait CandidateSink: Send + Sync {
    async fn create(&self, candidate: &NewCandidate) -> Result<CandidateRow, SinkError>;
}

pub struct HttpCandidateSink {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpCandidateSink {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CandidateSink for HttpCandidateSink {
    async fn create(&self, candidate: &NewCandidate) -> Result<CandidateRow, SinkError> {
        let url = format!("{}/api/v1/candidates", self.base_url.trim_end_matches('/'));
        let response = self.client.post(url).json(candidate).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
