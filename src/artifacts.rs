//! Artifact persistence.
//!
//! Writes the three build outputs plus a manifest into the artifacts
//! directory:
//!
//! | File | Contents |
//! |------|----------|
//! | `postings.json` | projected posting table with its source row index |
//! | `vectorizer.json` | fitted [`TfidfVectorizer`] |
//! | `matrix.json` | [`SparseMatrix`], rows aligned with `postings.json` |
//! | `manifest.json` | run id, counts, SHA-256 of each artifact |
//!
//! Each artifact can be loaded on its own. Writes are not transactional:
//! if one fails, files written before it stay on disk and are logged.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ColumnsConfig;
use crate::error::{PipelineError, Result};
use crate::matrix::SparseMatrix;
use crate::models::{Table, JOB_ID};
use crate::tfidf::TfidfVectorizer;

pub const POSTINGS_FILE: &str = "postings.json";
pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const MATRIX_FILE: &str = "matrix.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub rows: usize,
    pub vocabulary: usize,
    pub nnz: usize,
    pub columns: Vec<String>,
    pub files: Vec<ArtifactFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub name: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Ordered, duplicate-free union of the key, filter and display columns.
pub fn projection_columns(columns: &ColumnsConfig) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let all = std::iter::once(JOB_ID.to_string())
        .chain(columns.filter.iter().cloned())
        .chain(columns.display.iter().cloned());
    for name in all {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Select the projection from `table`, warning about columns it lacks.
pub fn project(table: &Table, columns: &ColumnsConfig) -> Table {
    let wanted = projection_columns(columns);
    for name in &wanted {
        if !table.has_column(name) {
            warn!(column = %name, "projection column not found, skipped");
        }
    }
    let names: Vec<&str> = wanted.iter().map(String::as_str).collect();
    table.select(&names)
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<ArtifactFile> {
    let path = dir.join(name);
    let bytes = serde_json::to_vec(value).map_err(|e| PipelineError::persist(&path, e))?;
    fs::write(&path, &bytes).map_err(|e| PipelineError::persist(&path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    info!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(ArtifactFile {
        name: name.to_string(),
        bytes: bytes.len() as u64,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

/// Persist the projected table, the model and the matrix, then the
/// manifest. The first failure is returned.
pub fn save_artifacts(
    dir: &Path,
    table: &Table,
    columns: &ColumnsConfig,
    model: &TfidfVectorizer,
    matrix: &SparseMatrix,
) -> Result<Manifest> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::persist(dir, e))?;

    let projected = project(table, columns);
    let mut files: Vec<ArtifactFile> = Vec::new();

    for name in [POSTINGS_FILE, VECTORIZER_FILE, MATRIX_FILE] {
        let result = match name {
            POSTINGS_FILE => write_json(dir, name, &projected),
            VECTORIZER_FILE => write_json(dir, name, model),
            _ => write_json(dir, name, matrix),
        };
        match result {
            Ok(file) => files.push(file),
            Err(e) => {
                error!(
                    artifact = name,
                    already_written = ?written(&files),
                    "artifact write failed; earlier artifacts remain on disk"
                );
                return Err(e);
            }
        }
    }

    let manifest = Manifest {
        run_id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
        rows: matrix.rows(),
        vocabulary: model.len(),
        nnz: matrix.nnz(),
        columns: projected
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        files,
    };
    if let Err(e) = write_json(dir, MANIFEST_FILE, &manifest) {
        error!(already_written = ?written(&manifest.files), "manifest write failed");
        return Err(e);
    }
    Ok(manifest)
}

fn written(files: &[ArtifactFile]) -> Vec<&str> {
    files.iter().map(|f| f.name.as_str()).collect()
}

fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    let bytes = fs::read(&path).map_err(|e| PipelineError::artifact(&path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::artifact(&path, e))
}

pub fn load_postings(dir: &Path) -> Result<Table> {
    read_json(dir.join(POSTINGS_FILE))
}

fn invalid(path: PathBuf) -> impl FnOnce(String) -> PipelineError {
    move |reason| PipelineError::InvalidArtifact { path, reason }
}

pub fn load_vectorizer(dir: &Path) -> Result<TfidfVectorizer> {
    let path = dir.join(VECTORIZER_FILE);
    let model: TfidfVectorizer = read_json(path.clone())?;
    model.validate().map_err(invalid(path))?;
    Ok(model)
}

pub fn load_matrix(dir: &Path) -> Result<SparseMatrix> {
    let path = dir.join(MATRIX_FILE);
    let matrix: SparseMatrix = read_json(path.clone())?;
    matrix.validate().map_err(invalid(path))?;
    Ok(matrix)
}

pub fn load_manifest(dir: &Path) -> Result<Manifest> {
    read_json(dir.join(MANIFEST_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorizerConfig;
    use crate::models::Value;
    use tempfile::TempDir;

    fn fixture() -> (Table, TfidfVectorizer, SparseMatrix) {
        let mut t = Table::with_rows(2);
        t.set_column("job_id", vec!["1".into(), "2".into()]);
        t.set_column("title", vec!["Engineer".into(), "Chef".into()]);
        t.set_column("remote_allowed", vec![Value::Bool(true), Value::Bool(false)]);
        t.set_column("texto_vaga", vec!["engineer".into(), "chef".into()]);
        let (model, matrix) =
            TfidfVectorizer::fit_transform(&["engineer", "chef"], &VectorizerConfig::default());
        (t, model, matrix)
    }

    #[test]
    fn test_projection_is_deduplicated_union() {
        let cols = projection_columns(&ColumnsConfig::default());
        assert_eq!(cols[0], "job_id");
        assert_eq!(cols.iter().filter(|c| *c == "job_id").count(), 1);
        assert_eq!(cols.iter().filter(|c| *c == "title").count(), 1);
        assert!(cols.contains(&"normalized_salary".to_string()));
        assert!(cols.contains(&"location".to_string()));
        assert!(!cols.contains(&"texto_vaga".to_string()));
    }

    #[test]
    fn test_save_and_load_each_artifact() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("artifacts");
        let (t, model, matrix) = fixture();
        let manifest = save_artifacts(&dir, &t, &ColumnsConfig::default(), &model, &matrix).unwrap();

        assert_eq!(manifest.rows, 2);
        assert_eq!(manifest.files.len(), 3);
        assert_eq!(manifest.columns, vec!["job_id", "remote_allowed", "title"]);

        let postings = load_postings(&dir).unwrap();
        assert_eq!(postings.len(), 2);
        assert!(!postings.has_column("texto_vaga"));
        assert_eq!(load_vectorizer(&dir).unwrap(), model);
        assert_eq!(load_matrix(&dir).unwrap(), matrix);
        assert_eq!(load_manifest(&dir).unwrap().run_id, manifest.run_id);
    }

    #[test]
    fn test_write_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("artifacts");
        fs::write(&blocker, "not a directory").unwrap();
        let (t, model, matrix) = fixture();
        let err = save_artifacts(&blocker, &t, &ColumnsConfig::default(), &model, &matrix)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
    }

    #[test]
    fn test_missing_artifact() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_matrix(tmp.path()).unwrap_err(),
            PipelineError::Artifact { .. }
        ));
    }

    #[test]
    fn test_malformed_matrix_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(MATRIX_FILE),
            r#"{"n_cols":3,"indptr":[],"indices":[],"data":[]}"#,
        )
        .unwrap();
        let err = load_matrix(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArtifact { .. }));
        assert!(err.to_string().contains("indptr"));

        fs::write(
            tmp.path().join(MATRIX_FILE),
            r#"{"n_cols":2,"indptr":[0,1],"indices":[5],"data":[1.0]}"#,
        )
        .unwrap();
        assert!(matches!(
            load_matrix(tmp.path()).unwrap_err(),
            PipelineError::InvalidArtifact { .. }
        ));
    }

    #[test]
    fn test_malformed_vectorizer_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(VECTORIZER_FILE),
            r#"{"max_features":10,"stop_words":true,"n_documents":1,
                "vocabulary":{"rust":0,"python":1},"idf":[1.0]}"#,
        )
        .unwrap();
        let err = load_vectorizer(tmp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArtifact { .. }));
    }
}
