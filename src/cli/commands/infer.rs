//! lexis infer - Infer a vector with a model trained on the toy corpus

use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::doc2vec::{Doc2Vec, Doc2VecConfig, DocEmbedder, common_texts};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Words of the document to embed
    #[arg(default_values = ["system", "response"])]
    pub words: Vec<String>,

    #[arg(long, default_value = "500")]
    pub vector_size: usize,

    #[arg(long, default_value = "2")]
    pub window: usize,

    #[arg(long, default_value = "4")]
    pub workers: usize,
}

pub fn run(ctx: &AppContext, args: &InferArgs) -> Result<()> {
    let docs = common_texts();
    let mut model = Doc2Vec::new(Doc2VecConfig {
        vector_size: args.vector_size,
        window: args.window,
        min_count: 1,
        workers: args.workers,
        seed: ctx.config.doc2vec.seed,
        ..Doc2VecConfig::default()
    })?;
    model.build_vocab(&docs)?;
    model.train(&docs)?;

    let name = model.to_string();
    let vector = DocEmbedder::new(model).embed(&args.words)?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(json!({
            "model": name,
            "words": args.words,
            "vector": vector,
        })));
    }
    println!("{vector:?}");
    Ok(())
}
