//! Inspect a .docx template: list the placeholders it declares and print
//! the head of its text preview. Handy when registering a new office
//! template whose marker names are not documented anywhere.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use demand_builder::docx;

#[derive(Parser, Debug)]
#[command(
    name = "dump_template",
    about = "List the placeholders declared by a .docx template",
    version
)]
struct Args {
    /// Path to the .docx file
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// How many characters of the preview markup to print
    #[arg(long, default_value_t = 600)]
    head: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let bytes = std::fs::read(&args.template)
        .map_err(|e| format!("Failed to read {}: {}", args.template.display(), e))?;

    let placeholders = docx::discover_placeholders(&bytes).map_err(|e| e.to_string())?;
    if placeholders.is_empty() {
        println!("No placeholders found.");
    } else {
        println!("Placeholders ({}):", placeholders.len());
        for name in &placeholders {
            println!("  «{}»", name);
        }
    }

    let markup = docx::to_preview_markup(&bytes).map_err(|e| e.to_string())?;
    let total = markup.chars().count();
    let head: String = markup.chars().take(args.head).collect();
    println!();
    println!("{}", head);
    if total > args.head {
        println!("... ({} chars total)", total);
    }
    Ok(())
}
