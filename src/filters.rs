//! Filter column normalization.
//!
//! Maps the raw experience level, salary and remote flag into the small
//! vocabulary the query side filters on. Values that cannot be coerced
//! are replaced with sentinels rather than rejected:
//!
//! | Column | Sentinel |
//! |--------|----------|
//! | `formatted_experience_level` | `"na"` |
//! | `normalized_salary` | `0` |
//! | `remote_allowed` | `false` |
//!
//! A salary of `0` therefore means "not reported or not numeric" as well as
//! a literal zero; consumers must not read it as a real wage.

use tracing::{debug, info, warn};

use crate::models::{Table, Value, EXPERIENCE_LEVEL, REMOTE_ALLOWED, SALARY};

pub const UNKNOWN_LEVEL: &str = "na";

const EXPERIENCE_LEVELS: &[(&str, &str)] = &[
    ("Entry level", "junior"),
    ("Associate", "pleno"),
    ("Mid-Senior level", "senior"),
    ("Director", "senior"),
    ("Executive", "senior"),
];

pub fn map_experience_level(value: &Value) -> &'static str {
    let Some(raw) = value.as_text() else {
        return UNKNOWN_LEVEL;
    };
    let raw = raw.trim();
    EXPERIENCE_LEVELS
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or(UNKNOWN_LEVEL, |(_, to)| *to)
}

/// Coerce a salary cell to a number, `None` when it is not one.
pub fn parse_salary(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => *n,
        Value::Text(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(_) | Value::Null => return None,
    };
    n.is_finite().then_some(n)
}

/// Coerce a remote flag, `None` when it is missing or unrecognized.
pub fn parse_remote(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(*n != 0.0),
        Value::Text(s) => {
            let s = s.trim().to_lowercase();
            match s.as_str() {
                "true" | "t" | "yes" | "y" => Some(true),
                "false" | "f" | "no" | "n" => Some(false),
                _ => s.parse::<f64>().ok().map(|n| n != 0.0),
            }
        }
        Value::Null => None,
    }
}

/// Normalize the three filter columns. Columns absent from the table are
/// skipped with a warning.
pub fn normalize_filters(mut table: Table) -> Table {
    match table.column(EXPERIENCE_LEVEL) {
        Some(values) => {
            let mapped: Vec<Value> = values
                .iter()
                .map(|v| Value::from(map_experience_level(v)))
                .collect();
            let unknown = mapped
                .iter()
                .filter(|v| v.as_text() == Some(UNKNOWN_LEVEL))
                .count();
            debug!(unknown, "experience levels mapped");
            table.set_column(EXPERIENCE_LEVEL, mapped);
        }
        None => warn!(column = EXPERIENCE_LEVEL, "filter column missing, skipped"),
    }

    match table.column(SALARY) {
        Some(values) => {
            let mut coerced = 0usize;
            let salaries: Vec<Value> = values
                .iter()
                .map(|v| {
                    Value::Number(parse_salary(v).unwrap_or_else(|| {
                        coerced += 1;
                        0.0
                    }))
                })
                .collect();
            debug!(coerced, "salaries defaulted to 0");
            table.set_column(SALARY, salaries);
        }
        None => warn!(column = SALARY, "filter column missing, skipped"),
    }

    match table.column(REMOTE_ALLOWED) {
        Some(values) => {
            let flags: Vec<Value> = values
                .iter()
                .map(|v| Value::Bool(parse_remote(v).unwrap_or(false)))
                .collect();
            table.set_column(REMOTE_ALLOWED, flags);
        }
        None => warn!(column = REMOTE_ALLOWED, "filter column missing, skipped"),
    }

    info!("filter features normalized");
    table
}
