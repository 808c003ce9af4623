//! Structured skill enrichment.
//!
//! Joins the posting → skill-code bridge table against the skill
//! dictionary and attaches the space-joined skill names to each posting as
//! [`SKILLS_TEXT`].
//!
//! Enrichment never blocks the base index. A missing auxiliary file
//! degrades to an all-empty column. Any other failure still attaches that
//! column before the error is returned, so the caller gets a
//! schema-complete table back inside [`SkillJoinError`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::loader::load_table;
use crate::models::{Table, Value, JOB_ID, SKILLS_TEXT, SKILL_CODE, SKILL_NAME};

/// How enrichment finished when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillsOutcome {
    /// Skills joined; `matched` postings got at least one skill name.
    Joined { matched: usize },
    /// An auxiliary table was missing; every posting got `""`.
    Degraded { missing: String },
    /// The join failed and the build went on with empty skills.
    Failed { error: String },
}

/// Enrichment failed after the fallback column was attached.
#[derive(Debug, Error)]
#[error("skill enrichment failed")]
pub struct SkillJoinError {
    /// The posting table with an all-empty skills column.
    pub table: Table,
    #[source]
    pub source: PipelineError,
}

/// Left-join bridge rows to the dictionary and group names per job.
///
/// Unmatched codes are dropped instead of being rendered, and each name is
/// kept once per job in first-seen order.
pub fn aggregate_skills(
    dictionary: &Table,
    bridge: &Table,
) -> Result<HashMap<String, String>, PipelineError> {
    let codes = require(dictionary, SKILL_CODE, "skill dictionary")?;
    let names = require(dictionary, SKILL_NAME, "skill dictionary")?;
    let bridge_jobs = require(bridge, JOB_ID, "skill bridge")?;
    let bridge_codes = require(bridge, SKILL_CODE, "skill bridge")?;

    let mut lookup: HashMap<String, &str> = HashMap::with_capacity(codes.len());
    for (code, name) in codes.iter().zip(names) {
        let (Some(code), Some(name)) = (code.as_key(), name.as_text()) else {
            continue;
        };
        if lookup.contains_key(&code) {
            warn!(code = %code, "duplicate skill code in dictionary, keeping first");
            continue;
        }
        lookup.insert(code, name.trim());
    }

    let mut grouped: HashMap<String, (String, HashSet<&str>)> = HashMap::new();
    let mut unmatched = 0usize;
    for (job, code) in bridge_jobs.iter().zip(bridge_codes) {
        let (Some(job), Some(code)) = (job.as_key(), code.as_key()) else {
            continue;
        };
        let Some(name) = lookup.get(&code).copied().filter(|n| !n.is_empty()) else {
            unmatched += 1;
            continue;
        };
        let (text, seen) = grouped.entry(job).or_default();
        if seen.insert(name) {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(name);
        }
    }
    if unmatched > 0 {
        warn!(unmatched, "bridge rows reference unknown skill codes");
    }

    Ok(grouped
        .into_iter()
        .map(|(job, (text, _))| (job, text))
        .collect())
}

fn require<'a>(table: &'a Table, column: &str, name: &str) -> Result<&'a [Value], PipelineError> {
    table
        .column(column)
        .ok_or_else(|| PipelineError::MissingColumn {
            table: name.to_string(),
            column: column.to_string(),
        })
}

/// Attach [`SKILLS_TEXT`] by left-joining `skills` onto the posting table.
/// Postings without skills, or without a key, get `""`.
pub fn attach_skills(mut postings: Table, skills: &HashMap<String, String>) -> (Table, usize) {
    let values: Vec<Value> = match postings.column(JOB_ID) {
        Some(keys) => keys
            .iter()
            .map(|k| {
                let text = k.as_key().and_then(|k| skills.get(&k)).cloned();
                Value::Text(text.unwrap_or_default())
            })
            .collect(),
        None => vec![Value::Text(String::new()); postings.len()],
    };
    let matched = values
        .iter()
        .filter(|v| v.as_text().is_some_and(|s| !s.is_empty()))
        .count();
    postings.set_column(SKILLS_TEXT, values);
    (postings, matched)
}

fn with_empty_skills(mut postings: Table) -> Table {
    postings.set_column(SKILLS_TEXT, vec![Value::Text(String::new()); postings.len()]);
    postings
}

/// Load the two auxiliary tables and enrich `postings` with skill names.
pub fn enrich_with_skills(
    postings: Table,
    skill_map: &Path,
    job_skills: &Path,
    key_aliases: &[String],
) -> Result<(Table, SkillsOutcome), SkillJoinError> {
    info!("enriching postings with structured skills");

    let joined = load_table(skill_map, key_aliases).and_then(|dictionary| {
        let bridge = load_table(job_skills, key_aliases)?;
        aggregate_skills(&dictionary, &bridge)
    });

    match joined {
        Ok(skills) => {
            if !postings.has_column(JOB_ID) {
                return Err(SkillJoinError {
                    table: with_empty_skills(postings),
                    source: PipelineError::MissingColumn {
                        table: "postings".to_string(),
                        column: JOB_ID.to_string(),
                    },
                });
            }
            let (table, matched) = attach_skills(postings, &skills);
            info!(matched, jobs_with_skills = skills.len(), "skill enrichment complete");
            Ok((table, SkillsOutcome::Joined { matched }))
        }
        Err(PipelineError::MissingFile { path }) => {
            warn!(
                path = %path.display(),
                "skill table not found, continuing without structured skills"
            );
            Ok((
                with_empty_skills(postings),
                SkillsOutcome::Degraded {
                    missing: path.display().to_string(),
                },
            ))
        }
        Err(source) => {
            warn!(error = %source, "skill enrichment failed, attached empty skills column");
            Err(SkillJoinError {
                table: with_empty_skills(postings),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn text_table(columns: &[(&str, &[&str])]) -> Table {
        let rows = columns.first().map_or(0, |(_, v)| v.len());
        let mut t = Table::with_rows(rows);
        for (name, values) in columns {
            t.set_column(name, values.iter().map(|v| Value::from(*v)).collect());
        }
        t
    }

    fn dictionary() -> Table {
        text_table(&[
            ("skill_abr", &["PY", "RS", "MKT"]),
            ("skill_name", &["Python", "Rust", "Marketing"]),
        ])
    }

    #[test]
    fn test_aggregate_joins_in_bridge_order() {
        let bridge = text_table(&[
            ("job_id", &["1", "1", "2"]),
            ("skill_abr", &["RS", "PY", "MKT"]),
        ]);
        let skills = aggregate_skills(&dictionary(), &bridge).unwrap();
        assert_eq!(skills["1"], "Rust Python");
        assert_eq!(skills["2"], "Marketing");
    }

    #[test]
    fn test_unmatched_codes_leave_no_marker() {
        let bridge = text_table(&[
            ("job_id", &["1", "1", "1"]),
            ("skill_abr", &["PY", "NOPE", "RS"]),
        ]);
        let skills = aggregate_skills(&dictionary(), &bridge).unwrap();
        assert_eq!(skills["1"], "Python Rust");
        assert!(!skills["1"].contains("None"));
        assert!(!skills["1"].contains("  "));
    }

    #[test]
    fn test_only_unmatched_codes_means_no_entry() {
        let bridge = text_table(&[("job_id", &["3"]), ("skill_abr", &["NOPE"])]);
        let skills = aggregate_skills(&dictionary(), &bridge).unwrap();
        assert!(!skills.contains_key("3"));
    }

    #[test]
    fn test_duplicate_bridge_rows_collapse() {
        let bridge = text_table(&[("job_id", &["1", "1"]), ("skill_abr", &["PY", "PY"])]);
        let skills = aggregate_skills(&dictionary(), &bridge).unwrap();
        assert_eq!(skills["1"], "Python");
    }

    #[test]
    fn test_missing_dictionary_column() {
        let bad = text_table(&[("code", &["PY"])]);
        let bridge = text_table(&[("job_id", &["1"]), ("skill_abr", &["PY"])]);
        let err = aggregate_skills(&bad, &bridge).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_attach_preserves_order_and_fills_empty() {
        let postings = text_table(&[("job_id", &["2", "9", "1"])]);
        let mut skills = HashMap::new();
        skills.insert("1".to_string(), "Python".to_string());
        skills.insert("2".to_string(), "Marketing".to_string());
        let (t, matched) = attach_skills(postings, &skills);
        assert_eq!(matched, 2);
        assert_eq!(t.text(SKILLS_TEXT, 0), Some("Marketing"));
        assert_eq!(t.text(SKILLS_TEXT, 1), Some(""));
        assert_eq!(t.text(SKILLS_TEXT, 2), Some("Python"));
    }

    #[test]
    fn test_attach_matches_numeric_keys() {
        let postings = text_table(&[("job_id", &["7.0"])]);
        let mut skills = HashMap::new();
        skills.insert("7".to_string(), "Rust".to_string());
        let (t, _) = attach_skills(postings, &skills);
        assert_eq!(t.text(SKILLS_TEXT, 0), Some("Rust"));
    }

    #[test]
    fn test_zero_padded_keys_join() {
        let bridge = text_table(&[("job_id", &["7"]), ("skill_abr", &["PY"])]);
        let skills = aggregate_skills(&dictionary(), &bridge).unwrap();
        let postings = text_table(&[("job_id", &["007", "8"])]);
        let (t, matched) = attach_skills(postings, &skills);
        assert_eq!(matched, 1);
        assert_eq!(t.text(SKILLS_TEXT, 0), Some("Python"));
        assert_eq!(t.text(SKILLS_TEXT, 1), Some(""));
    }

    #[test]
    fn test_join_error_message_names_cause_once() {
        let err = SkillJoinError {
            table: Table::with_rows(0),
            source: PipelineError::MissingColumn {
                table: "skill bridge".to_string(),
                column: "skill_abr".to_string(),
            },
        };
        assert_eq!(err.to_string(), "skill enrichment failed");
        let cause = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("column 'skill_abr' not found in skill bridge"));
        let chained = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(chained.matches("skill_abr").count(), 1);
    }

    #[test]
    fn test_missing_files_degrade() {
        let tmp = TempDir::new().unwrap();
        let postings = text_table(&[("job_id", &["1", "2"])]);
        let aliases = vec!["job_id".to_string()];
        let (t, outcome) = enrich_with_skills(
            postings,
            &tmp.path().join("skills.csv"),
            &tmp.path().join("job_skills.csv"),
            &aliases,
        )
        .unwrap();
        assert!(matches!(outcome, SkillsOutcome::Degraded { .. }));
        assert_eq!(t.text(SKILLS_TEXT, 0), Some(""));
        assert_eq!(t.text(SKILLS_TEXT, 1), Some(""));
    }

    #[test]
    fn test_bad_bridge_returns_table_with_fallback() {
        let tmp = TempDir::new().unwrap();
        let map = tmp.path().join("skills.csv");
        let bridge = tmp.path().join("job_skills.csv");
        fs::write(&map, "skill_abr,skill_name\nPY,Python\n").unwrap();
        fs::write(&bridge, "job_id,code\n1,PY\n").unwrap();
        let postings = text_table(&[("job_id", &["1"])]);
        let aliases = vec!["job_id".to_string()];
        let err = enrich_with_skills(postings, &map, &bridge, &aliases).unwrap_err();
        assert!(matches!(err.source, PipelineError::MissingColumn { .. }));
        assert_eq!(err.table.text(SKILLS_TEXT, 0), Some(""));
    }

    #[test]
    fn test_enrich_from_files() {
        let tmp = TempDir::new().unwrap();
        let map = tmp.path().join("skills.csv");
        let bridge = tmp.path().join("job_skills.csv");
        fs::write(&map, "skill_abr,skill_name\nPY,Python\nRS,Rust\n").unwrap();
        fs::write(&bridge, "job_id,skill_abr\n1,PY\n1,RS\n").unwrap();
        let postings = text_table(&[("job_id", &["1", "2"])]);
        let aliases = vec!["job_id".to_string()];
        let (t, outcome) = enrich_with_skills(postings, &map, &bridge, &aliases).unwrap();
        assert_eq!(outcome, SkillsOutcome::Joined { matched: 1 });
        assert_eq!(t.text(SKILLS_TEXT, 0), Some("Python Rust"));
        assert_eq!(t.text(SKILLS_TEXT, 1), Some(""));
    }
}
