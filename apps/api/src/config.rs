use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::extraction::{ExtractionConfig, PdfStrategy};
use crate::llm_client::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::parsing::pipeline::ParserConfig;
use crate::parsing::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::parsing::sanitize::MissingNamePolicy;
use crate::parsing::structuring::StructuringMode;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub structuring_mode: StructuringMode,
    pub parse_max_attempts: u32,
    pub parse_retry_base_delay: Duration,
    pub pdf_strategy: PdfStrategy,
    pub enable_pdf: bool,
    pub enable_docx: bool,
    pub missing_name_policy: MissingNamePolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
            structuring_mode: parse_env("STRUCTURING_MODE", StructuringMode::default())?,
            parse_max_attempts: parse_env("PARSE_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            parse_retry_base_delay: Duration::from_millis(parse_env(
                "PARSE_RETRY_BASE_DELAY_MS",
                DEFAULT_BASE_DELAY.as_millis() as u64,
            )?),
            pdf_strategy: parse_env("PDF_STRATEGY", PdfStrategy::default())?,
            enable_pdf: parse_env("ENABLE_PDF", true)?,
            enable_docx: parse_env("ENABLE_DOCX", true)?,
            missing_name_policy: parse_env("MISSING_NAME_POLICY", MissingNamePolicy::default())?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            extraction: ExtractionConfig {
                enable_pdf: self.enable_pdf,
                enable_docx: self.enable_docx,
                pdf_strategy: self.pdf_strategy,
            },
            retry: RetryPolicy {
                max_attempts: self.parse_max_attempts,
                base_delay: self.parse_retry_base_delay,
            },
            missing_name: self.missing_name_policy,
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.openai_base_url.clone(),
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for '{key}': {e}")),
        _ => Ok(default),
    }
}
