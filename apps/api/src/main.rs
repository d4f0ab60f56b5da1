use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ats_api::candidates::repository::PgCandidateRepository;
use ats_api::config::Config;
use ats_api::db::{create_pool, ensure_schema};
use ats_api::llm_client::LlmClient;
use ats_api::parsing::pipeline::ResumePipeline;
use ats_api::parsing::structuring::LlmStructurer;
use ats_api::routes::build_router;
use ats_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "ats_api={level},{}={level},tower_http={level}",
                env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.llm_config())?;
    info!(
        "LLM client initialized (model: {}, mode: {:?})",
        llm.model(),
        config.structuring_mode
    );

    let parser_config = config.parser_config();
    info!(
        "Parser: pdf={} ({:?}), docx={}, max_attempts={}, missing_name={:?}",
        parser_config.extraction.enable_pdf,
        parser_config.extraction.pdf_strategy,
        parser_config.extraction.enable_docx,
        parser_config.retry.max_attempts,
        parser_config.missing_name
    );
    let structurer = Arc::new(LlmStructurer::new(llm, config.structuring_mode));
    let pipeline = ResumePipeline::new(&parser_config, structurer);

    let shutdown = CancellationToken::new();

    // Build app state
    let state = AppState {
        pipeline,
        candidates: Arc::new(PgCandidateRepository::new(db)),
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight parses.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, cancelling in-flight parses");
    shutdown.cancel();
}
