use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub postings: PathBuf,
    pub skill_map: PathBuf,
    pub job_skills: PathBuf,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorizerConfig {
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_stop_words")]
    pub stop_words: String,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            stop_words: default_stop_words(),
        }
    }
}

fn default_max_features() -> usize {
    5000
}
fn default_stop_words() -> String {
    "english".to_string()
}

impl VectorizerConfig {
    pub fn uses_stop_words(&self) -> bool {
        self.stop_words == "english"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColumnsConfig {
    #[serde(default = "default_text_columns")]
    pub text: Vec<String>,
    #[serde(default = "default_filter_columns")]
    pub filter: Vec<String>,
    #[serde(default = "default_display_columns")]
    pub display: Vec<String>,
    #[serde(default = "default_key_aliases")]
    pub key_aliases: Vec<String>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            text: default_text_columns(),
            filter: default_filter_columns(),
            display: default_display_columns(),
            key_aliases: default_key_aliases(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_text_columns() -> Vec<String> {
    strings(&["title", "description", "skills_desc", "skills_estruturadas"])
}
fn default_filter_columns() -> Vec<String> {
    strings(&[
        "formatted_experience_level",
        "normalized_salary",
        "remote_allowed",
    ])
}
fn default_display_columns() -> Vec<String> {
    strings(&[
        "job_id",
        "title",
        "company_name",
        "job_posting_url",
        "med_salary",
        "location",
    ])
}
fn default_key_aliases() -> Vec<String> {
    strings(&["job_id", "jobid", "job id", "job-id"])
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkillsConfig {
    /// Abort the build on enrichment errors other than a missing file.
    /// Off by default: the build logs the error and indexes without skills.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
        }
    }
}

fn default_strict() -> bool {
    false
}

impl Config {
    /// A config rooted at `dir` with the conventional data layout:
    /// `data/postings.csv`, `data/mappings/skills.csv`,
    /// `data/jobs/job_skills.csv` and `artifacts/`.
    pub fn for_data_dir(dir: &Path) -> Self {
        Self {
            paths: PathsConfig {
                postings: dir.join("data").join("postings.csv"),
                skill_map: dir.join("data").join("mappings").join("skills.csv"),
                job_skills: dir.join("data").join("jobs").join("job_skills.csv"),
                artifacts_dir: dir.join("artifacts"),
            },
            vectorizer: VectorizerConfig::default(),
            columns: ColumnsConfig::default(),
            skills: SkillsConfig::default(),
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.paths.postings,
            &mut self.paths.skill_map,
            &mut self.paths.job_skills,
            &mut self.paths.artifacts_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vectorizer.max_features == 0 {
            anyhow::bail!("vectorizer.max_features must be > 0");
        }

        match self.vectorizer.stop_words.as_str() {
            "english" | "none" => {}
            other => anyhow::bail!(
                "Unknown stop_words list: '{}'. Must be english or none.",
                other
            ),
        }

        if self.columns.text.is_empty() {
            anyhow::bail!("columns.text must list at least one column");
        }

        if self.columns.key_aliases.is_empty() {
            anyhow::bail!("columns.key_aliases must list at least one alias");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_relative_to(base);
    config.validate()?;

    Ok(config)
}
