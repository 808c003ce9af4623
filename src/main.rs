//! # Job Index CLI (`jobidx`)
//!
//! Builds the offline search artifacts for a job-listing corpus and
//! inspects the result.
//!
//! ## Usage
//!
//! ```bash
//! jobidx --config ./config/jobidx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jobidx build` | Run the full pipeline and write artifacts |
//! | `jobidx stats` | Summarize the artifacts of the last build |
//! | `jobidx lookup <term>...` | Look terms up in the fitted vocabulary |
//!
//! Logs go to stderr and honor `RUST_LOG`; the build summary goes to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use job_index::clean::HtmlTextCleaner;
use job_index::{config, pipeline, stats};

/// Job Index CLI — offline search index builder for job postings.
#[derive(Parser)]
#[command(
    name = "jobidx",
    about = "Job Index — offline TF-IDF index builder for job postings",
    version,
    long_about = "Job Index enriches job postings with structured skills, combines and cleans \
    their text into one document per posting, fits a TF-IDF model, and writes the normalized \
    table, model, and document matrix for a query-time application."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/jobidx.toml`. Input paths, vectorizer settings
    /// and column lists are read from this file.
    #[arg(long, global = true, default_value = "./config/jobidx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build all artifacts.
    ///
    /// Loads postings, normalizes filter columns, joins structured skills,
    /// builds document text, fits and applies the TF-IDF model, and writes
    /// `postings.json`, `vectorizer.json`, `matrix.json` and `manifest.json`.
    Build,

    /// Print statistics about the last build.
    Stats,

    /// Look terms up in the persisted vocabulary.
    Lookup {
        /// Terms to look up (lowercased before lookup).
        #[arg(required = true)]
        terms: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobidx=info,job_index=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build => {
            pipeline::run_build(&cfg, HtmlTextCleaner)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Lookup { terms } => {
            stats::run_lookup(&cfg, &terms)?;
        }
    }

    Ok(())
}
