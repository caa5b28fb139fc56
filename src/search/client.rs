//! Blocking client for an Elasticsearch-compatible HTTP API.
//!
//! Wraps index lifecycle calls, single and bulk ingestion, and the query
//! helpers. Query descriptors live in a caller-owned [`QueryBook`]; the
//! client itself only holds the connection.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::bulk::{self, BatchFailure, BulkReport, PayloadShape};
use super::profile::Profile;
use super::queries::{self, PhraseOperator, QueryBook};
use super::tabular;
use crate::config::{BulkFormat, SearchConfig};
use crate::error::{LexisError, Result};

/// Hit count plus the raw response it came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub total_hits: u64,
    pub response: Value,
}

impl SearchOutcome {
    fn from_response(response: Value) -> Result<Self> {
        Ok(Self {
            total_hits: total_hits(&response)?,
            response,
        })
    }

    /// The `hits.hits` array.
    #[must_use]
    pub fn hits(&self) -> Vec<Value> {
        self.response
            .get("hits")
            .and_then(|hits| hits.get("hits"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

pub struct SearchClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    batch_size: usize,
    page_size: u64,
    bulk_format: BulkFormat,
    timeout: Duration,
    server_version: OnceLock<String>,
}

impl SearchClient {
    /// Connect using a profile's host and credentials.
    pub fn from_profile(profile: &Profile, config: &SearchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let http = build_http(profile, timeout)?;
        Ok(Self {
            http,
            base_url: profile.host.trim_end_matches('/').to_string(),
            username: profile.auth.username.clone(),
            password: profile.auth.password.clone(),
            batch_size: config.batch_size.max(1),
            page_size: config.page_size.max(1),
            bulk_format: config.bulk_format,
            timeout,
            server_version: OnceLock::new(),
        })
    }

    /// Load a profile file and connect with it.
    pub fn from_profile_path(path: &Path, config: &SearchConfig) -> Result<(Self, Profile)> {
        let profile = Profile::load(path)?;
        let client = Self::from_profile(&profile, config)?;
        Ok((client, profile))
    }

    /// Switch to another profile, keeping batch and paging settings.
    pub fn use_profile(&mut self, path: &Path) -> Result<Profile> {
        let profile = Profile::load(path)?;
        self.http = build_http(&profile, self.timeout)?;
        self.base_url = profile.host.trim_end_matches('/').to_string();
        self.username = profile.auth.username.clone();
        self.password = profile.auth.password.clone();
        self.server_version = OnceLock::new();
        info!(host = %self.base_url, "switched profile");
        Ok(profile)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// `version.number` from `GET /`, fetched once.
    pub fn server_version(&self) -> Result<String> {
        if let Some(version) = self.server_version.get() {
            return Ok(version.clone());
        }
        let info = self.send_json(Method::GET, "/", None)?;
        let version = info
            .get("version")
            .and_then(|version| version.get("number"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LexisError::Validation("server info has no version.number".to_string())
            })?
            .to_string();
        Ok(self.server_version.get_or_init(|| version).clone())
    }

    fn payload_shape(&self) -> Result<PayloadShape> {
        match self.bulk_format {
            BulkFormat::Legacy => Ok(PayloadShape::Legacy),
            BulkFormat::Modern => Ok(PayloadShape::Modern),
            BulkFormat::Auto => Ok(PayloadShape::for_version(&self.server_version()?)),
        }
    }

    // ==================== indices ====================

    /// Index metadata; `"*"` lists every index.
    pub fn get_index(&self, index: &str) -> Result<Value> {
        self.send_json(Method::GET, &format!("/{index}"), None)
    }

    pub fn get_index_records_cnt(&self, index: &str) -> Result<u64> {
        let response = self.send_json(Method::GET, &format!("/{index}/_count"), None)?;
        response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| LexisError::Validation(format!("count response for {index} has no count")))
    }

    pub fn create_index(&self, index: &str, body: Option<&Value>) -> Result<Value> {
        info!(index, "creating index");
        self.send_json(Method::PUT, &format!("/{index}"), body)
    }

    /// Create `index` from a named configuration in the profile.
    pub fn create_index_from_profile(
        &self,
        index: &str,
        profile: &Profile,
        config_name: &str,
    ) -> Result<Value> {
        let body = profile.index_config(config_name)?.create_body();
        info!(index, config = config_name, "creating index from profile configuration");
        self.create_index(index, Some(&body))
    }

    pub fn delete_index(&self, index: &str) -> Result<Value> {
        info!(index, "deleting index");
        self.send_json(Method::DELETE, &format!("/{index}"), None)
    }

    pub fn get_mapping(&self, index: &str) -> Result<Value> {
        self.send_json(Method::GET, &format!("/{index}/_mapping"), None)
    }

    // ==================== ingestion ====================

    pub fn ingest_one_record(&self, index: &str, record: &Value) -> Result<Value> {
        if !record.is_object() {
            return Err(LexisError::Validation(
                "a record must be a JSON object".to_string(),
            ));
        }
        self.send_json(Method::POST, &format!("/{index}/_doc"), Some(record))
    }

    /// Submit `records` in batches of the configured size.
    ///
    /// Every batch is attempted. A failed batch is logged and recorded in the
    /// report; earlier batches are not rolled back.
    pub fn ingest_bulk_from_list(
        &self,
        index: &str,
        records: &[Map<String, Value>],
    ) -> Result<BulkReport> {
        let bounds = bulk::batch_bounds(records.len(), self.batch_size);
        let mut report = BulkReport {
            total_records: records.len(),
            batches: bounds.len(),
            ..BulkReport::default()
        };
        if bounds.is_empty() {
            return Ok(report);
        }

        let shape = self.payload_shape()?;
        let path = format!("/{index}/_bulk");
        for (i, range) in bounds.into_iter().enumerate() {
            let batch = &records[range.clone()];
            info!(
                index,
                batch = i + 1,
                records = batch.len(),
                "ingesting batch"
            );

            let outcome = bulk::bulk_body(index, batch, shape).and_then(|body| {
                let response = self.send_ndjson(&path, body)?;
                match bulk::bulk_response_error(&response) {
                    Some(message) => Err(LexisError::Validation(message)),
                    None => Ok(()),
                }
            });

            match outcome {
                Ok(()) => report.succeeded_batches += 1,
                Err(err) => {
                    warn!(index, batch = i + 1, error = %err, "bulk batch failed");
                    report.failures.push(BatchFailure {
                        batch: i + 1,
                        start: range.start,
                        len: range.len(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Read a CSV file, keep the columns the index maps, and bulk-ingest.
    pub fn ingest_bulk_from_csv(&self, index: &str, csv_path: &Path) -> Result<BulkReport> {
        let mapping = self.get_mapping(index)?;
        let fields = tabular::mapping_fields(&mapping, index)?;
        let records = tabular::read_records(csv_path, &fields)?;
        debug!(index, fields = ?fields, rows = records.len(), "csv reconciled against mapping");
        self.ingest_bulk_from_list(index, &records)
    }

    // ==================== queries ====================

    pub fn search(&self, index: &str, body: &Value) -> Result<SearchOutcome> {
        debug!(index, body = %body, "search");
        let response = self.send_json(Method::POST, &format!("/{index}/_search"), Some(body))?;
        SearchOutcome::from_response(response)
    }

    /// Run a stored query; returns `(total_hits, pages)`.
    pub fn query(&self, book: &QueryBook, query_id: u64) -> Result<(u64, u64)> {
        let query = book.get(query_id)?;
        let outcome = self.search(&query.index, &query.query_body)?;
        let pages = query.pages_for(outcome.total_hits);
        info!(
            query_id,
            hits = outcome.total_hits,
            pages,
            "query returned {} hits, split in {} pages",
            outcome.total_hits,
            pages
        );
        Ok((outcome.total_hits, pages))
    }

    /// Run one page of a stored query; returns `(total_hits, next_exists)`.
    pub fn query_page(&self, book: &QueryBook, query_id: u64, page_num: u64) -> Result<(u64, bool)> {
        let outcome = self.query_page_with_response(book, query_id, page_num)?;
        let query = book.get(query_id)?;
        Ok((outcome.total_hits, query.next_page_exists(outcome.total_hits)))
    }

    pub fn query_page_with_response(
        &self,
        book: &QueryBook,
        query_id: u64,
        page_num: u64,
    ) -> Result<SearchOutcome> {
        let query = book.get(query_id)?;
        let body = query.page_body(page_num)?;
        let outcome = self.search(&query.index, &body)?;
        if query.next_page_exists(outcome.total_hits) {
            info!(query_id, page_num, hits = outcome.total_hits, "next page can be queried");
        } else {
            info!(query_id, page_num, hits = outcome.total_hits, "no next page");
        }
        Ok(outcome)
    }

    /// `match_all` documents from `offset`, at most `size` of them.
    pub fn get_docs(&self, index: &str, offset: u64, size: u64) -> Result<Vec<Value>> {
        let outcome = self.search(index, &queries::match_all_body(offset, size))?;
        Ok(outcome.hits())
    }

    pub fn match_filter(&self, index: &str, field: &str, value: &Value) -> Result<u64> {
        Ok(self.match_filter_with_response(index, field, value)?.total_hits)
    }

    pub fn match_filter_with_response(
        &self,
        index: &str,
        field: &str,
        value: &Value,
    ) -> Result<SearchOutcome> {
        self.search(index, &queries::match_body(field, value))
    }

    pub fn term_filter(&self, index: &str, field: &str, value: &Value) -> Result<u64> {
        Ok(self.term_filter_with_response(index, field, value)?.total_hits)
    }

    pub fn term_filter_with_response(
        &self,
        index: &str,
        field: &str,
        value: &Value,
    ) -> Result<SearchOutcome> {
        self.search(index, &queries::term_body(field, value))
    }

    /// Inclusive range on `field`.
    pub fn range_filter(
        &self,
        index: &str,
        field: &str,
        minimum: &Value,
        maximum: &Value,
    ) -> Result<u64> {
        Ok(self
            .range_filter_with_response(index, field, minimum, maximum)?
            .total_hits)
    }

    pub fn range_filter_with_response(
        &self,
        index: &str,
        field: &str,
        minimum: &Value,
        maximum: &Value,
    ) -> Result<SearchOutcome> {
        self.search(index, &queries::range_body(field, minimum, maximum))
    }

    /// Search `fields` for several phrases joined by `operator`.
    pub fn query_strings(
        &self,
        index: &str,
        fields: &[String],
        operator: PhraseOperator,
        highlight: bool,
        phrases: &[String],
    ) -> Result<u64> {
        Ok(self
            .query_strings_with_response(index, fields, operator, highlight, phrases)?
            .total_hits)
    }

    pub fn query_strings_with_response(
        &self,
        index: &str,
        fields: &[String],
        operator: PhraseOperator,
        highlight: bool,
        phrases: &[String],
    ) -> Result<SearchOutcome> {
        let body = queries::query_string_body(fields, operator, highlight, phrases)?;
        self.search(index, &body)
    }

    // ==================== transport ====================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match self.username.as_deref() {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        }
    }

    fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        read_response(builder.send()?)
    }

    fn send_ndjson(&self, path: &str, body: String) -> Result<Value> {
        let response = self
            .request(Method::POST, path)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()?;
        read_response(response)
    }
}

fn build_http(profile: &Profile, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("lexis/", env!("CARGO_PKG_VERSION")));
    if let Some(ca_path) = profile.auth.ca_certs.as_ref() {
        let pem = std::fs::read(ca_path).map_err(|err| {
            LexisError::Config(format!("read ca_certs {}: {err}", ca_path.display()))
        })?;
        let certificate = reqwest::Certificate::from_pem(&pem).map_err(|err| {
            LexisError::Config(format!("parse ca_certs {}: {err}", ca_path.display()))
        })?;
        builder = builder.add_root_certificate(certificate);
    }
    builder
        .build()
        .map_err(|err| LexisError::Config(format!("search http client: {err}")))
}

fn read_response(response: reqwest::blocking::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text()?;
    if !status.is_success() {
        return Err(LexisError::Search {
            status: status.as_u16(),
            body: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// `hits.total` as either `{"value": n}` or a bare number.
pub fn total_hits(response: &Value) -> Result<u64> {
    let total = response
        .get("hits")
        .and_then(|hits| hits.get("total"))
        .ok_or_else(|| LexisError::Validation("search response has no hits.total".to_string()))?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
        .ok_or_else(|| LexisError::Validation(format!("unrecognized hits.total: {total}")))
}
