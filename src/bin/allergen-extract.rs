//! CLI binary for allergen-extract.
//!
//! A thin shim over the library crate: the path argument is the manual file
//! pick, the spinner stands in for the loading screen, and the report is the
//! results page.

use allergen_extract::selector::{Candidate, FileSelector, SelectionSource};
use allergen_extract::{
    render, write_export, ClientConfig, HttpExtractionClient, UploadSession, WorkflowState,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract allergens and nutrition values from a label
  allergen-extract label.pdf

  # Talk to a remote service and save extraction-results.json
  allergen-extract --api-url https://extract.example.com --export . label.pdf

  # Print the raw JSON result
  allergen-extract --json label.pdf > result.json

  # Check that the service is up
  allergen-extract --check

ENVIRONMENT VARIABLES:
  ALLERGEN_API_URL        Extraction service base URL (default http://localhost:8000)
  ALLERGEN_TIMEOUT        Request timeout in seconds (default 60)
  RUST_LOG                Override log filter (e.g. allergen_extract=debug)
"#;

/// Extract allergen and nutrition data from a PDF via the extraction service.
#[derive(Parser, Debug)]
#[command(
    name = "allergen-extract",
    version,
    about = "Upload a PDF to automatically extract allergen and nutritional information",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to upload.
    #[arg(required_unless_present = "check")]
    input: Option<PathBuf>,

    /// Extraction service base URL.
    #[arg(long, env = "ALLERGEN_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "ALLERGEN_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the raw result as indented JSON instead of the report.
    #[arg(long)]
    json: bool,

    /// Write extraction-results.json into this directory (default: current).
    #[arg(long, num_args = 0..=1, default_missing_value = ".")]
    export: Option<PathBuf>,

    /// Only query the service health endpoint.
    #[arg(long)]
    check: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user's feedback while uploading; keep library logs
    // down to errors unless asked for more.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build client ─────────────────────────────────────────────────────
    let mut builder = ClientConfig::builder()
        .base_url(cli.api_url.clone())
        .timeout_secs(cli.timeout);
    if let Some(ref dir) = cli.export {
        builder = builder.export_dir(dir.clone());
    }
    let config = builder.build().context("Invalid configuration")?;
    let client = HttpExtractionClient::new(config.clone()).context("Failed to create client")?;

    // ── Health-check mode ────────────────────────────────────────────────
    if cli.check {
        return match client.health().await {
            Ok(h) if h.is_healthy() => {
                println!("{} {} is {}", green("✔"), config.base_url, h.status);
                Ok(ExitCode::SUCCESS)
            }
            Ok(h) => {
                println!("{} {} reports '{}'", red("✘"), config.base_url, h.status);
                Ok(ExitCode::FAILURE)
            }
            Err(e) => {
                eprintln!("{} {}: {}", red("✘"), config.base_url, e.user_message());
                Ok(ExitCode::FAILURE)
            }
        };
    }

    // ── Select ───────────────────────────────────────────────────────────
    let Some(ref input) = cli.input else {
        anyhow::bail!("No input file given");
    };
    let mut selector = FileSelector::new();
    let candidate = match Candidate::from_path(input).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Err(e) = selector.select(SelectionSource::Picker, candidate) {
        eprintln!("{} {}", red("✘"), e.warning());
        return Ok(ExitCode::FAILURE);
    }
    let Some(file) = selector.take() else {
        anyhow::bail!("No file staged");
    };

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            green("✓"),
            bold(file.name()),
            dim(&file.size_label())
        );
    }

    // ── Upload ───────────────────────────────────────────────────────────
    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Processing your PDF… this may take up to a minute");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let mut session = UploadSession::new(Arc::new(client));
    let state = session.upload(file).await.cloned();

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    // ── Present ──────────────────────────────────────────────────────────
    match state {
        Some(WorkflowState::Success(result)) => {
            if cli.json {
                let json = allergen_extract::export_json(&result)
                    .context("Failed to serialise result")?;
                println!("{json}");
            } else {
                print!("{}", render(&result));
            }

            if cli.export.is_some() {
                let path = write_export(&result, &config.export_dir)
                    .await
                    .context("Export failed")?;
                if !cli.quiet {
                    eprintln!("{} saved {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            session.reset();
            Ok(ExitCode::SUCCESS)
        }
        Some(WorkflowState::Failure(message)) => {
            eprintln!("{} {}", red("✘"), bold("Processing Error"));
            eprintln!("  {message}");
            session.reset();
            Ok(ExitCode::FAILURE)
        }
        Some(WorkflowState::Idle | WorkflowState::Uploading) | None => {
            anyhow::bail!("Upload did not settle")
        }
    }
}
