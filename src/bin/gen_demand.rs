//! Generate a filled demand or cover document for a single case.
//!
//! Reads a case description from JSON, runs the assembly pipeline against
//! the configured template directory and writes the document plus an HTML
//! preview into the output directory.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use demand_builder::models::CaseRecord;
use demand_builder::{MemoryStore, Pipeline, Settings, TemplateKind};

#[derive(Parser, Debug)]
#[command(
    name = "gen_demand",
    about = "Assemble a demand document from a case JSON file",
    version
)]
struct Args {
    /// Path to the case JSON file
    #[arg(value_name = "CASE_JSON")]
    case: PathBuf,

    /// Generate the cover page instead of the demand body
    #[arg(long)]
    cover: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let settings = Settings::from_env().map_err(|e| e.to_string())?;
    let raw = std::fs::read_to_string(&args.case)
        .map_err(|e| format!("Failed to read {}: {}", args.case.display(), e))?;
    let record: CaseRecord =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid case JSON: {}", e))?;
    let case_id = record.case_id.clone();

    let store = Arc::new(MemoryStore::new());
    store.put_case(record).map_err(|e| e.to_string())?;

    let output_dir = settings.output_dir.clone();
    let pipeline = Pipeline::new(store, settings);
    let kind = if args.cover {
        TemplateKind::Cover
    } else {
        TemplateKind::Demand
    };

    let document = pipeline
        .generate_document(&case_id, kind)
        .await
        .map_err(|e| e.to_string())?;

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| format!("Failed to create {}: {}", output_dir.display(), e))?;
    let docx_path = output_dir.join(&document.filename);
    tokio::fs::write(&docx_path, &document.bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {}", docx_path.display(), e))?;
    println!("Wrote {}", docx_path.display());

    if !document.preview.is_empty() {
        let preview_path = docx_path.with_extension("html");
        tokio::fs::write(&preview_path, &document.preview)
            .await
            .map_err(|e| format!("Failed to write {}: {}", preview_path.display(), e))?;
        println!("Preview: {}", preview_path.display());
    }
    if let Some(note) = &document.note {
        println!("Note: {}", note);
    }
    Ok(())
}
