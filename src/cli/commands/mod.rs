//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::path::Path;

use clap::Subcommand;
use serde_json::Value;

pub mod index;
pub mod infer;
pub mod ingest;
pub mod query;
pub mod search;
pub mod sentiment;

use crate::app::AppContext;
use crate::error::{LexisError, Result};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect, create and delete indices
    Index(index::IndexArgs),

    /// Ingest records one at a time, from a JSON list or from CSV
    Ingest(ingest::IngestArgs),

    /// Run stored queries from a query file
    Query(query::QueryArgs),

    /// Ad-hoc match, term, range and query-string searches
    Search(search::SearchArgs),

    /// Train the Doc2Vec models and rank them by sentiment error rate
    Sentiment(sentiment::SentimentArgs),

    /// Infer a document vector with a model trained on a toy corpus
    Infer(infer::InferArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Index(args) => index::run(ctx, args),
        Commands::Ingest(args) => ingest::run(ctx, args),
        Commands::Query(args) => query::run(ctx, args),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Sentiment(args) => sentiment::run(ctx, args),
        Commands::Infer(args) => infer::run(ctx, args),
    }
}

/// Read and parse a JSON file.
pub(crate) fn read_json_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| LexisError::Config(format!("read {}: {err}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Command-line value as JSON: numbers and booleans keep their type,
/// anything else is a string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|value| value.is_number() || value.is_boolean())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
