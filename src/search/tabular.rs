//! CSV records reconciled against an index mapping.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::{LexisError, Result};

/// Field names of a `GET /{index}/_mapping` response, in mapping order.
pub fn mapping_fields(mapping: &Value, index: &str) -> Result<Vec<String>> {
    let properties = mapping
        .get(index)
        .and_then(|entry| entry.get("mappings"))
        .and_then(|mappings| mappings.get("properties"))
        .and_then(Value::as_object)
        .ok_or_else(|| {
            LexisError::Validation(format!("index {index} has no field mapping"))
        })?;
    Ok(properties.keys().cloned().collect())
}

/// Read `path` and keep only `fields`, in that order.
///
/// Missing columns and empty cells become `""`. A column whose non-empty
/// cells all parse as numbers is emitted as numbers.
pub fn read_records(path: &Path, fields: &[String]) -> Result<Vec<Map<String, Value>>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let columns: Vec<Option<usize>> = fields
        .iter()
        .map(|field| headers.iter().position(|header| header == field))
        .collect();
    for (field, column) in fields.iter().zip(&columns) {
        if column.is_none() {
            tracing::warn!(field = %field, path = %path.display(), "mapped field missing from CSV; filling with empty strings");
        }
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(
            columns
                .iter()
                .map(|column| {
                    column
                        .and_then(|i| row.get(i))
                        .unwrap_or_default()
                        .to_string()
                })
                .collect(),
        );
    }

    let numeric: Vec<bool> = (0..fields.len())
        .map(|col| {
            let mut cells = rows.iter().map(|row| row[col].as_str()).filter(|cell| !cell.is_empty()).peekable();
            cells.peek().is_some() && cells.all(|cell| parse_number(cell).is_some())
        })
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            fields
                .iter()
                .zip(row)
                .zip(&numeric)
                .map(|((field, cell), &is_numeric)| {
                    let value = if cell.is_empty() {
                        Value::String(String::new())
                    } else if is_numeric {
                        parse_number(&cell).map_or(Value::String(cell), Value::Number)
                    } else {
                        Value::String(cell)
                    };
                    (field.clone(), value)
                })
                .collect()
        })
        .collect())
}

fn parse_number(cell: &str) -> Option<Number> {
    if let Ok(int) = cell.parse::<i64>() {
        return Some(Number::from(int));
    }
    cell.parse::<f64>().ok().and_then(Number::from_f64)
}
