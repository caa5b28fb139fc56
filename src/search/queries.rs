//! Stored query descriptors and the query bodies built by the filter helpers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{LexisError, Result};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySetting {
    pub page_size: u64,
}

impl Default for QuerySetting {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One entry of a query file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub query_id: u64,
    pub index: String,
    #[serde(default)]
    pub query_setting: QuerySetting,
    pub query_body: Value,
}

impl QueryDescriptor {
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.query_setting.page_size
    }

    /// Copy of the body restricted to one 1-based page.
    pub fn page_body(&self, page_num: u64) -> Result<Value> {
        if page_num == 0 {
            return Err(LexisError::Validation(
                "page numbers start at 1".to_string(),
            ));
        }
        let Value::Object(mut body) = self.query_body.clone() else {
            return Err(LexisError::Validation(format!(
                "query {} body is not a JSON object",
                self.query_id
            )));
        };
        let page_size = self.page_size();
        let from = (page_num - 1).checked_mul(page_size).ok_or_else(|| {
            LexisError::Validation(format!(
                "page {page_num} is out of range for page size {page_size}"
            ))
        })?;
        body.insert("from".to_string(), json!(from));
        body.insert("size".to_string(), json!(page_size));
        Ok(Value::Object(body))
    }

    /// Number of pages needed for `total_hits` at this descriptor's page size.
    #[must_use]
    pub const fn pages_for(&self, total_hits: u64) -> u64 {
        if self.page_size() == 0 {
            return 0;
        }
        total_hits.div_ceil(self.page_size())
    }

    /// Whether another page exists after a page that reported `total_hits`.
    #[must_use]
    pub const fn next_page_exists(&self, total_hits: u64) -> bool {
        total_hits >= self.page_size()
    }
}

/// Ordered, in-memory set of query descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryBook {
    queries: Vec<QueryDescriptor>,
}

impl QueryBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of descriptors.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let queries: Vec<QueryDescriptor> = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), count = queries.len(), "queries loaded");
        Ok(Self { queries })
    }

    /// Append a descriptor wrapping `bool_clause` in `{"query":{"bool":..}}`.
    ///
    /// The new id is the book's length after insertion, which is also returned.
    pub fn load_from_json_dict(&mut self, index: &str, bool_clause: Value, page_size: u64) -> usize {
        let query_id = self.queries.len() as u64 + 1;
        self.queries.push(QueryDescriptor {
            query_id,
            index: index.to_string(),
            query_setting: QuerySetting { page_size },
            query_body: json!({
                "query": {
                    "bool": bool_clause
                }
            }),
        });
        self.queries.len()
    }

    pub fn get(&self, query_id: u64) -> Result<&QueryDescriptor> {
        if self.queries.is_empty() {
            return Err(LexisError::QueriesNotLoaded);
        }
        self.queries
            .iter()
            .find(|query| query.query_id == query_id)
            .ok_or_else(|| LexisError::NotFound(format!("query {query_id}")))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryDescriptor> {
        self.queries.iter()
    }
}

/// How the phrases of a `query_string` search are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhraseOperator {
    And,
    #[default]
    Or,
    /// None of the phrases may match.
    Nor,
}

impl fmt::Display for PhraseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Nor => "NOR",
        };
        f.write_str(name)
    }
}

impl FromStr for PhraseOperator {
    type Err = LexisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            "NOR" => Ok(Self::Nor),
            other => Err(LexisError::Validation(format!(
                "invalid operator {other} (expected AND|OR|NOR)"
            ))),
        }
    }
}

#[must_use]
pub fn match_body(field: &str, value: &Value) -> Value {
    json!({"query": {"bool": {"match": {field: value}}}})
}

#[must_use]
pub fn term_body(field: &str, value: &Value) -> Value {
    json!({"query": {"bool": {"term": {field: value}}}})
}

#[must_use]
pub fn range_body(field: &str, minimum: &Value, maximum: &Value) -> Value {
    json!({"query": {"bool": {"range": {field: {"gte": minimum, "lte": maximum}}}}})
}

#[must_use]
pub fn match_all_body(offset: u64, size: u64) -> Value {
    json!({"from": offset, "size": size, "query": {"match_all": {}}})
}

/// Multi-phrase `query_string` body; every phrase is parenthesized.
pub fn query_string_body(
    fields: &[String],
    operator: PhraseOperator,
    highlight: bool,
    phrases: &[String],
) -> Result<Value> {
    if phrases.is_empty() {
        return Err(LexisError::Validation("no phrase given".to_string()));
    }

    let joined = phrases
        .iter()
        .map(|phrase| format!("({phrase})"))
        .collect::<Vec<_>>()
        .join(" ");

    let query_string = match operator {
        PhraseOperator::Nor => json!({
            "fields": fields,
            "query": format!("NOT({joined})"),
        }),
        PhraseOperator::And | PhraseOperator::Or => json!({
            "fields": fields,
            "default_operator": operator.to_string(),
            "query": joined,
        }),
    };

    let mut body = json!({"query": {"bool": {"query_string": query_string}}});
    if highlight {
        body["highlight"] = json!({"fields": {"*": {}}});
    }
    Ok(body)
}
