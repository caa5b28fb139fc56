//! lexis index - Inspect, create and delete indices

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::commands::read_json_file;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::{LexisError, Result};

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Show index information (all indices by default)
    Get(GetArgs),

    /// Count the records in an index
    Count(NameArgs),

    /// Create an index from a profile configuration or a JSON body
    Create(CreateArgs),

    /// Delete an index
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Index name or pattern
    #[arg(default_value = "*")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the index to create
    pub name: String,

    /// Index configuration from the profile's `indices` list
    #[arg(long, value_name = "CONFIG", conflicts_with = "body")]
    pub index_config: Option<String>,

    /// JSON file with the full create body (settings and mappings)
    #[arg(long, value_name = "FILE")]
    pub body: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(ctx: &AppContext, args: &IndexArgs) -> Result<()> {
    match &args.command {
        IndexCommand::Get(args) => get(ctx, args),
        IndexCommand::Count(args) => count(ctx, args),
        IndexCommand::Create(args) => create(ctx, args),
        IndexCommand::Delete(args) => delete(ctx, args),
    }
}

fn get(ctx: &AppContext, args: &GetArgs) -> Result<()> {
    let (client, _) = ctx.search_client()?;
    let info = client.get_index(&args.name)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(info));
    }
    let mut layout = HumanLayout::new();
    layout.title(&format!("Indices matching {}", args.name));
    if let Some(indices) = info.as_object() {
        for name in indices.keys() {
            layout.bullet(name);
        }
    }
    emit_human(&layout);
    Ok(())
}

fn count(ctx: &AppContext, args: &NameArgs) -> Result<()> {
    let (client, _) = ctx.search_client()?;
    let count = client.get_index_records_cnt(&args.name)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(json!({ "index": args.name, "count": count })));
    }
    println!("{} {}", args.name.bold(), count);
    Ok(())
}

fn create(ctx: &AppContext, args: &CreateArgs) -> Result<()> {
    let (client, profile) = ctx.search_client()?;

    let body = match (&args.index_config, &args.body) {
        (Some(config_name), _) => {
            let config = profile.index_config(config_name)?;
            if !args.yes {
                if ctx.robot_mode {
                    return Err(LexisError::Validation(
                        "--yes is required to create from a profile configuration in robot mode"
                            .to_string(),
                    ));
                }
                println!(
                    "Index configuration {}:\n{}",
                    config_name.bold(),
                    serde_json::to_string_pretty(&config.create_body())?
                );
                if !confirm(&format!("Create index {} with this configuration?", args.name))? {
                    return Err(LexisError::Validation("index creation cancelled".to_string()));
                }
            }
            Some(config.create_body())
        }
        (None, Some(path)) => Some(read_json_file(path)?),
        (None, None) => {
            return Err(LexisError::Validation(format!(
                "pass --index-config (one of {}) or --body",
                profile.index_names().join(", ")
            )));
        }
    };

    let response = client.create_index(&args.name, body.as_ref())?;
    if ctx.robot_mode {
        return emit_json(&robot_ok(response));
    }
    println!("{} {}", "Created index".green(), args.name.bold());
    Ok(())
}

fn delete(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    if !args.yes {
        if ctx.robot_mode {
            return Err(LexisError::Validation(
                "--yes is required to delete an index in robot mode".to_string(),
            ));
        }
        if !confirm(&format!("Delete index {}?", args.name))? {
            return Err(LexisError::Validation("index deletion cancelled".to_string()));
        }
    }
    let (client, _) = ctx.search_client()?;
    let response = client.delete_index(&args.name)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(response));
    }
    println!("{} {}", "Deleted index".yellow(), args.name.bold());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
