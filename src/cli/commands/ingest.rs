//! lexis ingest - Ingest one record, a JSON list, or a CSV file

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use crate::app::AppContext;
use crate::cli::commands::read_json_file;
use crate::cli::output::{emit_json, robot_ok, robot_partial};
use crate::error::{LexisError, Result};
use crate::search::BulkReport;

#[derive(Args, Debug)]
pub struct IngestArgs {
    #[command(subcommand)]
    pub command: IngestCommand,
}

#[derive(Subcommand, Debug)]
pub enum IngestCommand {
    /// Index a single JSON object
    Record(SourceArgs),

    /// Bulk-index a JSON array of objects
    List(SourceArgs),

    /// Bulk-index the rows of a CSV file, keeping the mapped columns
    Csv(SourceArgs),
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Target index
    pub index: String,

    /// Input file
    pub file: PathBuf,
}

pub fn run(ctx: &AppContext, args: &IngestArgs) -> Result<()> {
    let (client, _) = ctx.search_client()?;
    match &args.command {
        IngestCommand::Record(args) => {
            let record = read_json_file(&args.file)?;
            let response = client.ingest_one_record(&args.index, &record)?;
            if ctx.robot_mode {
                return emit_json(&robot_ok(response));
            }
            let id = response.get("_id").and_then(Value::as_str).unwrap_or("?");
            println!("{} {} into {}", "Indexed".green(), id, args.index.bold());
            Ok(())
        }
        IngestCommand::List(args) => {
            let records = records_from_json(read_json_file(&args.file)?)?;
            let report = client.ingest_bulk_from_list(&args.index, &records)?;
            finish(ctx, &args.index, &report)
        }
        IngestCommand::Csv(args) => {
            let report = client.ingest_bulk_from_csv(&args.index, &args.file)?;
            finish(ctx, &args.index, &report)
        }
    }
}

fn records_from_json(value: Value) -> Result<Vec<Map<String, Value>>> {
    let Value::Array(items) = value else {
        return Err(LexisError::Validation("expected a JSON array of records".to_string()));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(LexisError::Validation(format!("record {i} is not a JSON object"))),
        })
        .collect()
}

/// Print the report; any failed batch makes the command fail.
fn finish(ctx: &AppContext, index: &str, report: &BulkReport) -> Result<()> {
    if ctx.robot_mode {
        if report.is_success() {
            emit_json(&robot_ok(report))?;
        } else {
            let warnings = report
                .failures
                .iter()
                .map(|failure| format!("batch {}: {}", failure.batch, failure.message))
                .collect();
            emit_json(&robot_partial(
                report,
                report.succeeded_batches,
                report.failures.len(),
                warnings,
            ))?;
        }
    } else {
        println!(
            "{} {} records into {} ({} of {} batches)",
            "Ingested".green(),
            report.total_records - report.failed_records(),
            index.bold(),
            report.succeeded_batches,
            report.batches
        );
        for failure in &report.failures {
            println!(
                "  {} batch {} (records {}..{}): {}",
                "failed".red(),
                failure.batch,
                failure.start,
                failure.start + failure.len,
                failure.message
            );
        }
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(LexisError::PartialFailure(format!(
            "{} of {} batches failed ({} records)",
            report.failures.len(),
            report.batches,
            report.failed_records()
        )))
    }
}
