mod backend;
mod messages;
mod orchestrator;
mod progress;
mod sink;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ats_api::parsing::document::UploadedDocument;

use crate::backend::HttpParseBackend;
use crate::orchestrator::{ParsedPreview, UploadFailure, UploadOrchestrator, UploadState};
use crate::progress::DONE;
use crate::sink::HttpCandidateSink;

/// Parse a resume with the ATS service and save the candidate.
#[derive(Debug, Parser)]
#[command(name = "resume-upload", version)]
struct Cli {
    /// Resume to upload (PDF, DOCX, DOC or TXT)
    file: PathBuf,

    /// Base URL of the ATS API
    #[arg(long, env = "ATS_SERVER_URL", default_value = "http://localhost:8080")]
    server: String,

    /// Save the candidate without asking for confirmation
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=warn", env!("CARGO_CRATE_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let doc = read_document(&cli.file).await?;

    let client = reqwest::Client::new();
    let mut orchestrator = UploadOrchestrator::new(
        Arc::new(HttpParseBackend::new(client.clone(), cli.server.clone())),
        Arc::new(HttpCandidateSink::new(client, cli.server.clone())),
    );

    if let UploadState::Error(failure) = orchestrator.select(vec![doc])? {
        print_failure(failure);
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut progress = orchestrator.progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let value = *progress.borrow_and_update();
            eprint!("\rParsing resume... {value:>3}%");
            let _ = io::stderr().flush();
            if value == DONE {
                eprintln!();
                break;
            }
        }
    });

    let state = orchestrator.run(&cancel).await?.clone();
    if let Err(e) = printer.await {
        warn!("Progress printer stopped: {e}");
    }

    let preview = match state {
        UploadState::Success(preview) => preview,
        UploadState::Error(failure) => {
            print_failure(&failure);
            std::process::exit(1);
        }
        other => bail!("unexpected state after parse: {}", other.name()),
    };

    print_preview(&preview);

    if !cli.yes && !confirm("Save this candidate?")? {
        orchestrator.discard()?;
        println!("Discarded.");
        return Ok(());
    }

    let row = orchestrator.commit().await?;
    info!(candidate_id = %row.id, "Saved");
    println!("Saved candidate {} ({})", row.id, row.status);
    Ok(())
}

async fn read_document(path: &Path) -> Result<UploadedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    let content_type = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(UploadedDocument::new(file_name, content_type, bytes))
}

fn print_preview(preview: &ParsedPreview) {
    let c = &preview.candidate;
    println!("{}", preview.message());
    println!();
    println!("  Name:        {}", c.display_name());
    let rows = [
        ("Email", c.email.as_deref()),
        ("Phone", c.phone.as_deref()),
        ("LinkedIn", c.linkedin_url.as_deref()),
        ("Role", c.current_role.as_deref()),
        ("Education", c.education.as_deref()),
        ("Location", c.location.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {:<12} {value}", format!("{label}:"));
        }
    }
    if let Some(years) = c.experience_years {
        println!("  {:<12} {years}", "Experience:");
    }
    if let Some(skills) = &c.skills {
        println!("  {:<12} {}", "Skills:", skills.join(", "));
    }
    if let Some(notes) = &c.notes {
        println!("  {:<12} {notes}", "Summary:");
    }
    println!();
    println!(
        "Detected: {}",
        preview.found_fields.iter().collect::<Vec<_>>().join(", ")
    );
}

fn print_failure(failure: &UploadFailure) {
    eprintln!("Error: {}", failure.message);
    if !failure.checklist.is_empty() {
        eprintln!("Troubleshooting:");
        for step in &failure.checklist {
            eprintln!("  - {step}");
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_document_uses_file_name() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join("main.rs");
        let doc = read_document(&path).await.unwrap();
        assert_eq!(doc.file_name, "main.rs");
        assert!(!doc.bytes.is_empty());

        let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("no-such-resume.pdf");
        assert!(read_document(&missing).await.is_err());
    }
}
