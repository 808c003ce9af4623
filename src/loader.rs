//! CSV table loader.
//!
//! Reads a CSV file into a [`Table`] of text cells, normalizes header names
//! (trimmed, BOM stripped, lowercased) and renames the key column to
//! [`JOB_ID`] through an explicit alias set. Only exact alias matches
//! count; a header like `prev_job_id` is left alone.

use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{Value, JOB_ID, Table};

/// Lowercase, trim and drop any byte-order mark from a header name.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Rename the single header matching `aliases` to [`JOB_ID`]. More than one
/// match is ambiguous and rejected.
fn canonicalize_key(headers: &mut [String], aliases: &[String], path: &Path) -> Result<()> {
    let matches: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| aliases.iter().any(|a| normalize_header(a) == **h))
        .map(|(i, _)| i)
        .collect();

    if matches.len() > 1 {
        return Err(PipelineError::AmbiguousKey {
            path: path.to_path_buf(),
            columns: matches.iter().map(|&i| headers[i].clone()).collect(),
        });
    }
    if let Some(&i) = matches.first() {
        headers[i] = JOB_ID.to_string();
    }
    Ok(())
}

/// Load a CSV file. Empty cells become [`Value::Null`]; everything else is
/// kept as text for the later stages to coerce.
pub fn load_table(path: &Path, key_aliases: &[String]) -> Result<Table> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::MissingFile {
            path: path.to_path_buf(),
        },
        _ => PipelineError::Csv {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        },
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(normalize_header)
        .collect();
    canonicalize_key(&mut headers, key_aliases, path)?;

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        for (i, values) in columns.iter_mut().enumerate() {
            let cell = match record.get(i) {
                Some(s) if !s.is_empty() => Value::Text(s.to_string()),
                _ => Value::Null,
            };
            values.push(cell);
        }
    }

    let rows = columns.first().map_or(0, Vec::len);
    let mut table = Table::with_rows(rows);
    for (name, values) in headers.iter().zip(columns) {
        if table.has_column(name) {
            tracing::warn!(path = %path.display(), column = %name, "duplicate column, keeping first");
            continue;
        }
        table.set_column(name, values);
    }

    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns.len(),
        "loaded table"
    );
    Ok(table)
}
