//! lexis search - Ad-hoc filters, query strings and document listing

use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{Value, json};

use crate::app::AppContext;
use crate::cli::commands::parse_value;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::search::{PhraseOperator, SearchOutcome};

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub command: SearchCommand,
}

#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    /// Full-text match on one field
    Match(FieldValueArgs),

    /// Exact term on one field
    Term(FieldValueArgs),

    /// Inclusive range on one field
    Range(RangeArgs),

    /// Several phrases over several fields
    Strings(StringsArgs),

    /// List documents with match_all
    Docs(DocsArgs),
}

#[derive(Args, Debug)]
pub struct FieldValueArgs {
    pub index: String,
    pub field: String,
    /// Numbers and booleans are sent as JSON scalars
    pub value: String,

    /// Print the hits as well as the count
    #[arg(long)]
    pub show_hits: bool,
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    pub index: String,
    pub field: String,
    pub min: String,
    pub max: String,

    #[arg(long)]
    pub show_hits: bool,
}

#[derive(Args, Debug)]
pub struct StringsArgs {
    pub index: String,

    /// Fields to search (repeatable)
    #[arg(long = "field", short, required = true)]
    pub fields: Vec<String>,

    /// AND, OR or NOR
    #[arg(long, default_value = "OR")]
    pub operator: PhraseOperator,

    /// Do not request highlights
    #[arg(long)]
    pub no_highlight: bool,

    #[arg(long)]
    pub show_hits: bool,

    #[arg(required = true)]
    pub phrases: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DocsArgs {
    pub index: String,

    #[arg(long, default_value = "0")]
    pub offset: u64,

    #[arg(long, default_value = "10")]
    pub size: u64,
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let (client, _) = ctx.search_client()?;
    match &args.command {
        SearchCommand::Match(args) => {
            let outcome = client.match_filter_with_response(&args.index, &args.field, &parse_value(&args.value))?;
            report(ctx, &args.index, &outcome, args.show_hits)
        }
        SearchCommand::Term(args) => {
            let outcome = client.term_filter_with_response(&args.index, &args.field, &parse_value(&args.value))?;
            report(ctx, &args.index, &outcome, args.show_hits)
        }
        SearchCommand::Range(args) => {
            let outcome = client.range_filter_with_response(
                &args.index,
                &args.field,
                &parse_value(&args.min),
                &parse_value(&args.max),
            )?;
            report(ctx, &args.index, &outcome, args.show_hits)
        }
        SearchCommand::Strings(args) => {
            let outcome = client.query_strings_with_response(
                &args.index,
                &args.fields,
                args.operator,
                !args.no_highlight,
                &args.phrases,
            )?;
            report(ctx, &args.index, &outcome, args.show_hits)
        }
        SearchCommand::Docs(args) => {
            let docs = client.get_docs(&args.index, args.offset, args.size)?;
            if ctx.robot_mode {
                return emit_json(&robot_ok(json!({ "index": args.index, "docs": docs })));
            }
            print_hits(&format!("{} documents from {}", docs.len(), args.index), &docs);
            Ok(())
        }
    }
}

fn report(ctx: &AppContext, index: &str, outcome: &SearchOutcome, show_hits: bool) -> Result<()> {
    if ctx.robot_mode {
        let mut data = json!({ "index": index, "total_hits": outcome.total_hits });
        if show_hits {
            data["hits"] = Value::Array(outcome.hits());
        }
        return emit_json(&robot_ok(data));
    }
    if show_hits {
        print_hits(&format!("{} hits in {index}", outcome.total_hits), &outcome.hits());
    } else {
        println!("{} hits in {}", outcome.total_hits.to_string().cyan(), index.bold());
    }
    Ok(())
}

fn print_hits(title: &str, hits: &[Value]) {
    let mut layout = HumanLayout::new();
    layout.title(title);
    for hit in hits {
        let id = hit.get("_id").and_then(Value::as_str).unwrap_or("?");
        let source = hit.get("_source").map_or_else(String::new, Value::to_string);
        layout.bullet(&format!("{id} {source}"));
    }
    emit_human(&layout);
}
