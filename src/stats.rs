//! Artifact statistics and vocabulary lookup.
//!
//! Gives a quick summary of what the last build produced: posting count,
//! vocabulary size, matrix sparsity and artifact sizes. Used by
//! `jobidx stats` and `jobidx lookup` to check a build without loading it
//! into the query application.

use anyhow::{Context, Result};

use crate::artifacts::{load_manifest, load_matrix, load_vectorizer};
use crate::config::Config;

/// Run the stats command: read the artifacts and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let dir = &config.paths.artifacts_dir;
    let manifest = load_manifest(dir).context("No build found; run `jobidx build` first")?;
    let matrix = load_matrix(dir)?;

    println!("Job Index — Artifact Stats");
    println!("==========================");
    println!();
    println!("  Artifacts:   {}", dir.display());
    println!("  Run:         {}", manifest.run_id);
    println!(
        "  Built:       {}",
        manifest.created_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    println!("  Postings:    {}", manifest.rows);
    println!("  Vocabulary:  {}", manifest.vocabulary);
    println!("  Non-zeros:   {}", matrix.nnz());
    println!("  Density:     {:.4}%", matrix.density() * 100.0);
    println!("  Empty docs:  {}", matrix.empty_rows());
    println!("  Columns:     {}", manifest.columns.join(", "));

    if matrix.rows() != manifest.rows {
        println!();
        println!(
            "  WARNING: matrix has {} rows, manifest records {}",
            matrix.rows(),
            manifest.rows
        );
    }

    println!();
    println!("  {:<18} {:>10}   {}", "FILE", "SIZE", "SHA-256");
    println!("  {}", "-".repeat(96));
    for file in &manifest.files {
        println!(
            "  {:<18} {:>10}   {}",
            file.name,
            format_bytes(file.bytes),
            file.sha256
        );
    }
    println!();

    Ok(())
}

/// Run the lookup command: print column index and idf for each term.
pub fn run_lookup(config: &Config, terms: &[String]) -> Result<()> {
    let model = load_vectorizer(&config.paths.artifacts_dir)
        .context("No build found; run `jobidx build` first")?;

    for term in terms {
        let key = term.to_lowercase();
        match (model.index_of(&key), model.idf_of(&key)) {
            (Some(index), Some(idf)) => println!("{}  index={}  idf={:.4}", key, index, idf),
            _ => println!("{}  not in vocabulary", key),
        }
    }

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
