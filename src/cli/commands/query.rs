//! lexis query - Run stored queries from a query file

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::search::QueryBook;

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommand,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Run one query (or one page of it) by id
    Run(RunArgs),

    /// List the descriptors in a query file
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file with an array of query descriptors
    pub file: PathBuf,

    /// Query id within the file
    pub id: u64,

    /// Fetch one 1-based page instead of counting pages
    #[arg(long)]
    pub page: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub file: PathBuf,
}

pub fn run(ctx: &AppContext, args: &QueryArgs) -> Result<()> {
    match &args.command {
        QueryCommand::Run(args) => run_query(ctx, args),
        QueryCommand::List(args) => list(ctx, args),
    }
}

fn run_query(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let book = QueryBook::load_from_file(&args.file)?;
    let (client, _) = ctx.search_client()?;

    if let Some(page) = args.page {
        let outcome = client.query_page_with_response(&book, args.id, page)?;
        let next_exists = book.get(args.id)?.next_page_exists(outcome.total_hits);
        if ctx.robot_mode {
            return emit_json(&robot_ok(json!({
                "query_id": args.id,
                "page": page,
                "total_hits": outcome.total_hits,
                "next_exists": next_exists,
                "hits": outcome.hits(),
            })));
        }
        let mut layout = HumanLayout::new();
        layout
            .title(&format!("Query {} page {page}", args.id))
            .kv("total hits", &outcome.total_hits.to_string())
            .kv("next page", if next_exists { "yes" } else { "no" });
        for hit in outcome.hits() {
            layout.bullet(&hit.to_string());
        }
        emit_human(&layout);
        return Ok(());
    }

    let (total_hits, pages) = client.query(&book, args.id)?;
    if ctx.robot_mode {
        return emit_json(&robot_ok(json!({
            "query_id": args.id,
            "total_hits": total_hits,
            "pages": pages,
        })));
    }
    println!(
        "Query {} returns {} hits in {} pages",
        args.id.to_string().bold(),
        total_hits.to_string().cyan(),
        pages
    );
    Ok(())
}

fn list(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let book = QueryBook::load_from_file(&args.file)?;
    if ctx.robot_mode {
        return emit_json(&robot_ok(&book));
    }
    let mut layout = HumanLayout::new();
    layout.title(&format!("{} queries", book.len()));
    for query in book.iter() {
        layout.bullet(&format!(
            "{} on {} (page size {}): {}",
            query.query_id,
            query.index,
            query.page_size(),
            query.query_body
        ));
    }
    emit_human(&layout);
    Ok(())
}
