//! Error taxonomy for the index build.
//!
//! Stages return [`PipelineError`] so callers can tell the recoverable
//! conditions (a missing skill table) from the fatal ones (a missing
//! postings file, a failed artifact write). The CLI wraps these in
//! `anyhow` with extra context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("column '{column}' not found in {table}")]
    MissingColumn { table: String, column: String },

    #[error("{} has more than one key column: {}", path.display(), columns.join(", "))]
    AmbiguousKey { path: PathBuf, columns: Vec<String> },

    #[error("failed to write artifact {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} is malformed: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("matrix has {matrix_rows} rows but the posting table has {table_rows}")]
    RowAlignment {
        matrix_rows: usize,
        table_rows: usize,
    },

    #[error("no text cleaner supplied; call PipelineBuilder::cleaner before build")]
    MissingCleaner,
}

impl PipelineError {
    /// Shorthand for `io::Error` conversion in artifact writes.
    pub(crate) fn persist(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        PipelineError::Persist {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        PipelineError::Artifact {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
