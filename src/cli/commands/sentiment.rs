//! lexis sentiment - Train the Doc2Vec models and rank them by error rate

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::pipeline::{self, BenchmarkOptions};

#[derive(Args, Debug)]
pub struct SentimentArgs {
    /// Directory holding (or receiving) the corpus archive
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Use this archive instead of downloading the corpus
    #[arg(long, conflicts_with = "data_dir")]
    pub archive: Option<PathBuf>,

    /// Training passes per model
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Training threads (0 = all cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Keep at most N documents of each split and label
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &SentimentArgs) -> Result<()> {
    let mut corpus = ctx.config.corpus.clone();
    if let Some(dir) = &args.data_dir {
        corpus.data_dir.clone_from(dir);
    }
    let mut settings = ctx.config.doc2vec.clone();
    if let Some(epochs) = args.epochs {
        settings.epochs = epochs;
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }

    if args.archive.is_none() && !ctx.robot_mode {
        println!(
            "Corpus archive: {}",
            pipeline::archive_path(&corpus)?.display().to_string().dimmed()
        );
    }

    let options = BenchmarkOptions {
        archive: args.archive.clone(),
        limit: args.limit,
        show_progress: ctx.show_progress(),
    };
    let report = pipeline::run(&corpus, &settings, &options)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(&report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Achieved sentiment-prediction accuracy")
        .kv("documents", &report.documents.to_string())
        .kv("train", &report.train_docs.to_string())
        .kv("test", &report.test_docs.to_string())
        .push_line(String::new())
        .push_line(score_header());
    for score in &report.scores {
        layout.push_line(format!("{:<10.6} {}", score.error_rate, score.model));
    }
    emit_human(&layout);
    Ok(())
}

fn score_header() -> String {
    format!("{} {}", format!("{:<10}", "Err_rate").bold(), "Model".bold())
}
