//! Cell value inference shared by the tabular parsers

use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};

use crate::types::PreviewRow;

/// Infer a JSON value from a textual cell.
///
/// Empty cells become `null`; integers, floats and booleans are typed; anything
/// else stays a string.
pub fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match trimmed {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Header label for the cell at `index`; blank cells become `Unnamed: <index>`
pub fn header_label(index: usize, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        trimmed.to_string()
    }
}

/// Make header names unique, suffixing repeats with `.1`, `.2`, ...
pub fn dedupe_columns(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    // Next suffix to try per base name
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        let candidate = if seen.contains(&name) {
            let n = next_suffix.entry(name.clone()).or_insert(1);
            loop {
                let candidate = format!("{}.{}", name, n);
                *n += 1;
                if !seen.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            name
        };
        seen.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

/// Zip column names with row values; missing trailing cells become `null`
pub fn row_object<I>(columns: &[String], values: I) -> PreviewRow
where
    I: IntoIterator<Item = Value>,
{
    let mut row = Map::with_capacity(columns.len());
    let mut values = values.into_iter();
    for column in columns {
        row.insert(column.clone(), values.next().unwrap_or(Value::Null));
    }
    row
}
