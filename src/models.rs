//! Core data model: the column-major [`Table`] that flows through every
//! pipeline stage, plus the well-known column names.
//!
//! A table keeps its source row index alongside the columns so the
//! persisted posting table can be traced back to the raw CSV row, and so
//! row *i* of the document matrix always lines up with row *i* here.

use serde::{Deserialize, Serialize};

/// Canonical posting key column.
pub const JOB_ID: &str = "job_id";
pub const EXPERIENCE_LEVEL: &str = "formatted_experience_level";
pub const SALARY: &str = "normalized_salary";
pub const REMOTE_ALLOWED: &str = "remote_allowed";
/// Space-joined skill names attached by the skill enricher.
pub const SKILLS_TEXT: &str = "skills_estruturadas";
/// Combined, cleaned document text per posting.
pub const DOCUMENT_TEXT: &str = "texto_vaga";
pub const SKILL_CODE: &str = "skill_abr";
pub const SKILL_NAME: &str = "skill_name";

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a join key. Integral numbers and their text
    /// forms (`"12.0"`, `"012"`, `"+12"`) collapse to the same key as `"12"`.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(number_key(*n)),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Some(n.to_string());
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() && n.fract() == 0.0 && trimmed.contains('.') => {
                        Some(number_key(n))
                    }
                    _ => Some(trimmed.to_string()),
                }
            }
        }
    }
}

fn number_key(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Column-major table with a preserved source row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub index: Vec<usize>,
    pub columns: Vec<Column>,
}

impl Table {
    /// An empty table with `rows` rows and no columns.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            index: (0..rows).collect(),
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.values)
    }

    /// Add a column, replacing any existing column of the same name in
    /// place. Panics if the length does not match the row count.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        assert_eq!(
            values.len(),
            self.len(),
            "column '{}' has {} values for {} rows",
            name,
            values.len(),
            self.len()
        );
        match self.column_mut(name) {
            Some(existing) => *existing = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
    }

    /// A copy of the named columns, in the given order. Names not present
    /// are skipped.
    pub fn select(&self, names: &[&str]) -> Table {
        let columns = names
            .iter()
            .filter_map(|name| self.columns.iter().find(|c| c.name == *name).cloned())
            .collect();
        Table {
            index: self.index.clone(),
            columns,
        }
    }

    /// Text of a cell, or `None` for nulls and non-text values.
    pub fn text(&self, column: &str, row: usize) -> Option<&str> {
        self.column(column)
            .and_then(|values| values.get(row))
            .and_then(Value::as_text)
    }
}
