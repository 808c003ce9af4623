//! Index build orchestration.
//!
//! Runs the stages in order: load postings → normalize filters → enrich
//! skills → combine text → fit + transform → write artifacts. Each stage
//! takes the posting table by value and hands back the next version.
//!
//! The postings file and artifact writes are fatal; the skill tables are
//! not (see [`crate::skills`]).

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

use crate::artifacts::{save_artifacts, Manifest};
use crate::clean::TextCleaner;
use crate::combine::{combine_text, documents};
use crate::config::Config;
use crate::error::PipelineError;
use crate::filters::normalize_filters;
use crate::loader::load_table;
use crate::matrix::SparseMatrix;
use crate::models::Table;
use crate::skills::{enrich_with_skills, SkillsOutcome};
use crate::tfidf::TfidfVectorizer;

/// Assembles a [`Pipeline`]. A text cleaner is required.
pub struct PipelineBuilder {
    config: Config,
    cleaner: Option<Box<dyn TextCleaner>>,
}

impl PipelineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cleaner: None,
        }
    }

    pub fn cleaner(mut self, cleaner: impl TextCleaner + 'static) -> Self {
        self.cleaner = Some(Box::new(cleaner));
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let cleaner = self.cleaner.ok_or(PipelineError::MissingCleaner)?;
        Ok(Pipeline {
            config: self.config,
            cleaner,
        })
    }
}

pub struct Pipeline {
    config: Config,
    cleaner: Box<dyn TextCleaner>,
}

/// In-memory result of the transform stages, before persistence.
#[derive(Debug)]
pub struct IndexBuild {
    pub table: Table,
    pub model: TfidfVectorizer,
    pub matrix: SparseMatrix,
    pub skills: SkillsOutcome,
}

#[derive(Debug)]
pub struct BuildReport {
    pub postings: usize,
    pub skills: SkillsOutcome,
    pub vocabulary: usize,
    pub nnz: usize,
    pub empty_documents: usize,
    pub artifacts_dir: PathBuf,
    pub manifest: Manifest,
}

impl Pipeline {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Everything up to, but not including, writing artifacts.
    pub fn transform(&self, postings: Table) -> Result<IndexBuild> {
        let cfg = &self.config;
        let table = normalize_filters(postings);

        let (table, skills) = match enrich_with_skills(
            table,
            &cfg.paths.skill_map,
            &cfg.paths.job_skills,
            &cfg.columns.key_aliases,
        ) {
            Ok(enriched) => enriched,
            Err(e) if !cfg.skills.strict => {
                error!(error = %e.source, "skill enrichment failed, continuing without skills");
                let error = e.source.to_string();
                (e.table, SkillsOutcome::Failed { error })
            }
            Err(e) => return Err(e).context("Skill enrichment failed"),
        };

        let table = combine_text(table, &cfg.columns.text, &*self.cleaner);

        let corpus = documents(&table);
        let (model, matrix) = TfidfVectorizer::fit_transform(&corpus, &cfg.vectorizer);

        if matrix.rows() != table.len() {
            return Err(PipelineError::RowAlignment {
                matrix_rows: matrix.rows(),
                table_rows: table.len(),
            }
            .into());
        }

        Ok(IndexBuild {
            table,
            model,
            matrix,
            skills,
        })
    }

    /// Load postings, transform, and persist all artifacts.
    pub fn run(&self) -> Result<BuildReport> {
        let cfg = &self.config;
        let postings = load_table(&cfg.paths.postings, &cfg.columns.key_aliases)
            .with_context(|| format!("Failed to load postings: {}", cfg.paths.postings.display()))?;

        let build = self.transform(postings)?;

        let manifest = save_artifacts(
            &cfg.paths.artifacts_dir,
            &build.table,
            &cfg.columns,
            &build.model,
            &build.matrix,
        )
        .context("Failed to save artifacts")?;
        info!(dir = %cfg.paths.artifacts_dir.display(), "artifacts saved");

        Ok(BuildReport {
            postings: build.table.len(),
            skills: build.skills,
            vocabulary: build.model.len(),
            nnz: build.matrix.nnz(),
            empty_documents: build.matrix.empty_rows(),
            artifacts_dir: cfg.paths.artifacts_dir.clone(),
            manifest,
        })
    }
}

/// `jobidx build`: run the pipeline and print a summary.
pub fn run_build(config: &Config, cleaner: impl TextCleaner + 'static) -> Result<()> {
    let pipeline = PipelineBuilder::new(config.clone()).cleaner(cleaner).build()?;
    let report = pipeline.run()?;

    println!("build");
    println!("  postings: {}", report.postings);
    match &report.skills {
        SkillsOutcome::Joined { matched } => println!("  postings with skills: {}", matched),
        SkillsOutcome::Degraded { missing } => println!("  skills: skipped ({})", missing),
        SkillsOutcome::Failed { error } => println!("  skills: failed ({})", error),
    }
    println!("  vocabulary: {}", report.vocabulary);
    println!("  non-zeros: {}", report.nnz);
    println!("  empty documents: {}", report.empty_documents);
    println!("  artifacts: {}", report.artifacts_dir.display());
    println!("  run id: {}", report.manifest.run_id);
    println!("ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::HtmlTextCleaner;
    use crate::models::{Value, DOCUMENT_TEXT, SKILLS_TEXT};
    use tempfile::TempDir;

    #[test]
    fn test_build_requires_cleaner() {
        let tmp = TempDir::new().unwrap();
        let err = PipelineBuilder::new(Config::for_data_dir(tmp.path()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::MissingCleaner));
    }

    #[test]
    fn test_transform_without_skill_files() {
        let tmp = TempDir::new().unwrap();
        let pipeline = PipelineBuilder::new(Config::for_data_dir(tmp.path()))
            .cleaner(HtmlTextCleaner)
            .build()
            .unwrap();

        let mut postings = Table::with_rows(2);
        postings.set_column("job_id", vec!["1".into(), "2".into()]);
        postings.set_column("title", vec!["Data Engineer".into(), Value::Null]);

        let build = pipeline.transform(postings).unwrap();
        assert!(matches!(build.skills, SkillsOutcome::Degraded { .. }));
        assert_eq!(build.table.text(SKILLS_TEXT, 0), Some(""));
        assert_eq!(build.table.text(DOCUMENT_TEXT, 0), Some("data engineer "));
        assert_eq!(build.matrix.rows(), 2);
        assert_eq!(build.matrix.empty_rows(), 1);
    }
}
