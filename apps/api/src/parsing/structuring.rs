//! Structuring Client — turns extracted text into raw candidate fields via the LLM.
//!
//! `AppState` carries the pipeline, which holds an `Arc<dyn Structurer>`;
//! tests swap in a scripted implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::extraction::ExtractedText;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{JsonSchemaSpec, LlmClient, LlmError, ResponseFormat};
use crate::parsing::errors::{ErrorKind, ParseError};
use crate::parsing::models::{ModelExtraction, RawCandidate};
use crate::parsing::prompts::{
    build_prompt, candidate_schema, RESUME_OBJECT_SHAPE, RESUME_PARSE_SYSTEM, SCHEMA_NAME,
};

/// Whether the endpoint enforces the response schema or only the prompt does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuringMode {
    #[default]
    JsonSchema,
    JsonObject,
}

impl std::str::FromStr for StructuringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json_schema" => Ok(StructuringMode::JsonSchema),
            "json_object" => Ok(StructuringMode::JsonObject),
            other => Err(format!("unknown structuring mode '{other}'")),
        }
    }
}

#[async_trait]
pub trait Structurer: Send + Sync {
    async fn structure(&self, text: &ExtractedText) -> Result<RawCandidate, ParseError>;
}

pub struct LlmStructurer {
    llm: LlmClient,
    mode: StructuringMode,
    system: String,
}

impl LlmStructurer {
    pub fn new(llm: LlmClient, mode: StructuringMode) -> Self {
        let system = match mode {
            StructuringMode::JsonSchema => {
                format!("{RESUME_PARSE_SYSTEM}\n\n{NO_FABRICATION_INSTRUCTION}")
            }
            StructuringMode::JsonObject => format!(
                "{RESUME_PARSE_SYSTEM}\n\n{NO_FABRICATION_INSTRUCTION}\n\n{RESUME_OBJECT_SHAPE}\n\n{JSON_ONLY_SYSTEM}"
            ),
        };
        Self { llm, mode, system }
    }

    fn response_format(&self) -> ResponseFormat {
        match self.mode {
            StructuringMode::JsonSchema => ResponseFormat::JsonSchema {
                json_schema: JsonSchemaSpec {
                    name: SCHEMA_NAME.to_string(),
                    strict: true,
                    schema: candidate_schema(),
                },
            },
            StructuringMode::JsonObject => ResponseFormat::JsonObject,
        }
    }
}

#[async_trait]
impl Structurer for LlmStructurer {
    async fn structure(&self, text: &ExtractedText) -> Result<RawCandidate, ParseError> {
        let prompt = build_prompt(text.as_str());
        let extraction: ModelExtraction = self
            .llm
            .call_json(&self.system, &prompt, &self.response_format())
            .await
            .map_err(classify_llm_error)?;
        interpret(extraction)
    }
}

/// Transport failures, timeouts, rate limits and 5xx are worth retrying.
/// Other non-2xx answers (bad key, oversized prompt) fail the same way again.
pub fn classify_llm_error(e: LlmError) -> ParseError {
    match e {
        LlmError::Http(_) => {
            warn!("Structuring call failed: {e}");
            ParseError::model_unavailable()
        }
        LlmError::Api { status, .. } if status == 408 || status == 429 || status >= 500 => {
            warn!("Structuring call failed: {e}");
            ParseError::model_unavailable()
        }
        LlmError::Api { .. } => {
            error!("Structuring call rejected: {e}");
            ParseError::model_rejected()
        }
        LlmError::Parse(_) | LlmError::EmptyContent => {
            warn!("Structuring output unreadable: {e}");
            ParseError::malformed_output()
        }
    }
}

/// Applies the `success` flag and unwraps the candidate object.
pub fn interpret(extraction: ModelExtraction) -> Result<RawCandidate, ParseError> {
    let no_candidate = |reason: Option<String>| {
        let message = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "No candidate information found in the resume".to_string());
        info!("Model reported no candidate: {message}");
        ParseError::new(ErrorKind::NoCandidateFound, message)
    };

    if extraction.success == Some(false) {
        return Err(no_candidate(extraction.error));
    }
    extraction
        .candidate
        .ok_or_else(|| no_candidate(extraction.error))
}
