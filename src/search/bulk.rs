//! Bulk ingestion: batch partitioning, NDJSON payloads and the per-call report.

use std::ops::Range;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

pub const DEFAULT_BATCH_SIZE: usize = 800;

/// Bulk payload shape. Engines before 8.x expect `_type` in the action line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    Legacy,
    Modern,
}

impl PayloadShape {
    /// Shape for a server version string such as `"7.17.9"`.
    #[must_use]
    pub fn for_version(version: &str) -> Self {
        let major = version
            .split('.')
            .next()
            .and_then(|major| major.trim().parse::<u32>().ok())
            .unwrap_or(8);
        if major < 8 { Self::Legacy } else { Self::Modern }
    }
}

/// Contiguous ranges covering `0..len` in order; the last may be short.
///
/// `batch_size` of zero is treated as one.
#[must_use]
pub fn batch_bounds(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let size = batch_size.max(1);
    (0..len.div_ceil(size))
        .map(|i| {
            let start = i * size;
            start..(start + size).min(len)
        })
        .collect()
}

/// Render one batch as an NDJSON bulk body (trailing newline included).
pub fn bulk_body(index: &str, records: &[Map<String, Value>], shape: PayloadShape) -> Result<String> {
    let action = match shape {
        PayloadShape::Legacy => serde_json::json!({"index": {"_index": index, "_type": "_doc"}}),
        PayloadShape::Modern => serde_json::json!({"index": {"_index": index}}),
    };
    let action_line = serde_json::to_string(&action)?;

    let mut body = String::new();
    for record in records {
        body.push_str(&action_line);
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    Ok(body)
}

/// Item-level error summary from a bulk response, if any item failed.
#[must_use]
pub fn bulk_response_error(response: &Value) -> Option<String> {
    if !response
        .get("errors")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return None;
    }

    let items = response.get("items").and_then(Value::as_array);
    let failed: Vec<&Value> = items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object()?.values().next())
                .filter(|outcome| outcome.get("error").is_some())
                .collect()
        })
        .unwrap_or_default();

    let first_reason = failed
        .first()
        .and_then(|outcome| outcome.get("error"))
        .map(|error| {
            error
                .get("reason")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string)
        })
        .unwrap_or_else(|| "unknown item error".to_string());

    Some(format!(
        "{} item(s) rejected; first: {first_reason}",
        failed.len()
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// 1-based batch number.
    pub batch: usize,
    pub start: usize,
    pub len: usize,
    pub message: String,
}

/// Outcome of one bulk ingestion call. Every batch is attempted; failures are
/// collected here rather than aborting the call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub total_records: usize,
    pub batches: usize,
    pub succeeded_batches: usize,
    pub failures: Vec<BatchFailure>,
}

impl BulkReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failed_records(&self) -> usize {
        self.failures.iter().map(|failure| failure.len).sum()
    }
}
