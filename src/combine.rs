//! Document text assembly.
//!
//! Builds the [`DOCUMENT_TEXT`] column: for every row, the cleaned values of
//! the configured text columns joined with a single space, in configured
//! order. Empty fields still contribute their separator, so the output for
//! a given row depends only on that row's values.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::clean::TextCleaner;
use crate::models::{Table, Value, DOCUMENT_TEXT};

/// Combine `columns` into [`DOCUMENT_TEXT`]. Missing columns are skipped
/// with a warning; non-text cells clean to `""`.
pub fn combine_text(mut table: Table, columns: &[String], cleaner: &dyn TextCleaner) -> Table {
    info!(columns = ?columns, "combining text columns");

    let present: Vec<&[Value]> = columns
        .iter()
        .filter_map(|name| {
            let values = table.column(name);
            if values.is_none() {
                warn!(column = %name, "text column not found, skipped");
            }
            values
        })
        .collect();

    let cleaned: Vec<Vec<String>> = present
        .par_iter()
        .map(|values| {
            values
                .par_iter()
                .map(|v| v.as_text().map(|s| cleaner.clean(s)).unwrap_or_default())
                .collect()
        })
        .collect();

    let documents: Vec<Value> = (0..table.len())
        .map(|row| {
            let parts: Vec<&str> = cleaned.iter().map(|col| col[row].as_str()).collect();
            Value::Text(parts.join(" "))
        })
        .collect();

    table.set_column(DOCUMENT_TEXT, documents);
    info!(rows = table.len(), "document text column created");
    table
}

/// Borrow the document corpus in row order.
pub fn documents(table: &Table) -> Vec<&str> {
    match table.column(DOCUMENT_TEXT) {
        Some(values) => values.iter().map(|v| v.as_text().unwrap_or("")).collect(),
        None => vec![""; table.len()],
    }
}
