//! Sentiment benchmark: train the model zoo on one corpus and rank every
//! model (and the paired concatenations) by probe error rate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

use crate::config::{CorpusConfig, Doc2VecSettings};
use crate::corpus::{self, SentimentDocument, Split};
use crate::doc2vec::{ConcatenatedDoc2Vec, Doc2Vec, Doc2VecConfig, DocVectors, TrainingMode};
use crate::error::{LexisError, Result};
use crate::eval::{ErrorReport, error_rate_for_model};

/// One ranked line of the benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub model: String,
    pub error_rate: f64,
    pub errors: usize,
    pub test_count: usize,
}

impl ModelScore {
    fn new(model: String, report: &ErrorReport) -> Self {
        Self {
            model,
            error_rate: report.error_rate,
            errors: report.errors,
            test_count: report.test_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub documents: usize,
    pub train_docs: usize,
    pub test_docs: usize,
    /// Ascending by error rate, ties by model name.
    pub scores: Vec<ModelScore>,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkOptions {
    /// Corpus archive to read instead of downloading.
    pub archive: Option<PathBuf>,
    /// Keep at most this many documents per split and label.
    pub limit: Option<usize>,
    pub show_progress: bool,
}

/// The three base configurations: plain PV-DBOW, PV-DM mean with a higher
/// starting rate, PV-DM concat.
pub fn build_models(settings: &Doc2VecSettings) -> Result<Vec<Doc2Vec>> {
    let common = Doc2VecConfig::from_settings(settings);
    let configs = [
        Doc2VecConfig {
            mode: TrainingMode::Dbow,
            ..common.clone()
        },
        Doc2VecConfig {
            mode: TrainingMode::DmMean,
            window: 10,
            alpha: 0.05,
            comment: Some("alpha=0.05".to_string()),
            ..common.clone()
        },
        Doc2VecConfig {
            mode: TrainingMode::DmConcat,
            window: 5,
            ..common
        },
    ];
    configs.into_iter().map(Doc2Vec::new).collect()
}

/// Keep the first `limit` documents of each split and label, then renumber
/// tags densely.
#[must_use]
pub fn limit_documents(docs: Vec<SentimentDocument>, limit: usize) -> Vec<SentimentDocument> {
    let mut seen: HashMap<(Split, Option<bool>), usize> = HashMap::new();
    docs.into_iter()
        .filter(|doc| {
            let label = doc.sentiment.map(|sentiment| sentiment >= 0.5);
            let count = seen.entry((doc.split, label)).or_default();
            *count += 1;
            *count <= limit
        })
        .enumerate()
        .map(|(tag, doc)| SentimentDocument { tag, ..doc })
        .collect()
}

/// Download (if needed) and parse the configured corpus.
pub fn load_corpus(corpus_config: &CorpusConfig, options: &BenchmarkOptions) -> Result<Vec<SentimentDocument>> {
    let archive = match &options.archive {
        Some(path) => path.clone(),
        None => corpus::download_dataset(&corpus_config.url, &corpus_config.data_dir, options.show_progress)?,
    };
    let docs = corpus::extract_documents(&archive, &corpus_config.member_pattern)?;
    Ok(match options.limit {
        Some(limit) => limit_documents(docs, limit),
        None => docs,
    })
}

/// Train every model on a shuffled copy of `docs`, then score each model and
/// the `dbow+dmm` and `dbow+dmc` concatenations on the labeled splits.
pub fn run_benchmark(docs: &[SentimentDocument], settings: &Doc2VecSettings, show_progress: bool) -> Result<BenchmarkReport> {
    let (train_docs, test_docs) = corpus::split_documents(docs);
    info!(
        documents = docs.len(),
        train = train_docs.len(),
        test = test_docs.len(),
        "starting sentiment benchmark"
    );

    let mut models = build_models(settings)?
        .into_iter()
        .map(|model| model.with_progress(show_progress))
        .collect::<Vec<_>>();
    for model in &mut models {
        model.build_vocab(docs)?;
    }

    let mut shuffled: Vec<&SentimentDocument> = docs.iter().collect();
    shuffled.shuffle(&mut StdRng::seed_from_u64(settings.seed));

    let mut scores = Vec::new();
    for model in &mut models {
        info!(model = %model, "training");
        model.train(&shuffled)?;
        let report = error_rate_for_model(&*model, &train_docs, &test_docs)?;
        info!(model = %model, error_rate = report.error_rate, "evaluated");
        scores.push(ModelScore::new(model.to_string(), &report));
    }

    let [dbow, dmm, dmc] = models.as_slice() else {
        return Err(LexisError::Training(format!("expected 3 models, built {}", models.len())));
    };
    for pair in [vec![dbow, dmm], vec![dbow, dmc]] {
        let joined = ConcatenatedDoc2Vec::new(pair)?;
        let report = error_rate_for_model(&joined, &train_docs, &test_docs)?;
        info!(model = %joined, vector_size = joined.vector_size(), error_rate = report.error_rate, "evaluated");
        scores.push(ModelScore::new(joined.to_string(), &report));
    }

    sort_scores(&mut scores);
    Ok(BenchmarkReport {
        documents: docs.len(),
        train_docs: train_docs.len(),
        test_docs: test_docs.len(),
        scores,
    })
}

/// Full run from configuration: load the corpus, then benchmark it.
pub fn run(corpus_config: &CorpusConfig, settings: &Doc2VecSettings, options: &BenchmarkOptions) -> Result<BenchmarkReport> {
    let docs = load_corpus(corpus_config, options)?;
    run_benchmark(&docs, settings, options.show_progress)
}

fn sort_scores(scores: &mut [ModelScore]) {
    scores.sort_by(|a, b| {
        a.error_rate
            .total_cmp(&b.error_rate)
            .then_with(|| a.model.cmp(&b.model))
    });
}

/// Archive file name for the configured corpus URL, inside `data_dir`.
pub fn archive_path(corpus_config: &CorpusConfig) -> Result<PathBuf> {
    let name = corpus::dataset_file_name(&corpus_config.url)?;
    Ok(Path::new(&corpus_config.data_dir).join(name))
}
