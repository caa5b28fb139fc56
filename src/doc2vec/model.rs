//! Paragraph-vector training with negative sampling.
//!
//! Supports PV-DBOW (optionally interleaved with skip-gram word training),
//! PV-DM with averaged or summed context, and PV-DM with a concatenated
//! fixed-size context window.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::vocab::Vocabulary;
use super::weights::SharedMatrix;
use super::{DocVectors, TaggedText};
use crate::config::Doc2VecSettings;
use crate::error::{LexisError, Result};

/// Documents handed to one rayon task.
const CHUNK_DOCS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Distributed bag of words: predict words from the document vector.
    Dbow,
    /// Distributed memory, mean of document and context vectors.
    DmMean,
    /// Distributed memory, sum of document and context vectors.
    DmSum,
    /// Distributed memory over the concatenated window.
    DmConcat,
}

impl TrainingMode {
    const fn label(self) -> &'static str {
        match self {
            Self::Dbow => "dbow",
            Self::DmMean => "dm/m",
            Self::DmSum => "dm/s",
            Self::DmConcat => "dm/c",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Doc2VecConfig {
    pub mode: TrainingMode,
    pub vector_size: usize,
    /// Context words on each side of the target.
    pub window: usize,
    pub alpha: f32,
    pub min_alpha: f32,
    pub min_count: usize,
    /// Downsampling threshold for frequent words; 0 disables it.
    pub sample: f64,
    pub negative: usize,
    pub epochs: usize,
    /// 0 means one per available core.
    pub workers: usize,
    pub seed: u64,
    /// Also train word vectors skip-gram style in DBOW mode.
    pub dbow_words: bool,
    pub comment: Option<String>,
}

impl Default for Doc2VecConfig {
    fn default() -> Self {
        Self {
            mode: TrainingMode::Dbow,
            vector_size: 100,
            window: 5,
            alpha: 0.025,
            min_alpha: 0.0001,
            min_count: 2,
            sample: 0.0,
            negative: 5,
            epochs: 20,
            workers: 0,
            seed: 1,
            dbow_words: false,
            comment: None,
        }
    }
}

impl Doc2VecConfig {
    /// Shared settings from the config file with everything else defaulted.
    #[must_use]
    pub fn from_settings(settings: &Doc2VecSettings) -> Self {
        Self {
            vector_size: settings.vector_size,
            epochs: settings.epochs,
            min_count: settings.min_count,
            sample: settings.sample,
            negative: settings.negative,
            workers: settings.workers,
            seed: settings.seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    /// Width of the hidden layer fed to the output weights.
    const fn layer1_size(&self) -> usize {
        match self.mode {
            TrainingMode::DmConcat => (2 * self.window + 1) * self.vector_size,
            _ => self.vector_size,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.vector_size == 0 {
            return Err(LexisError::Training("vector_size must be at least 1".to_string()));
        }
        if self.mode != TrainingMode::Dbow && self.window == 0 {
            return Err(LexisError::Training("window must be at least 1 in DM modes".to_string()));
        }
        if self.negative == 0 {
            return Err(LexisError::Training(
                "negative must be at least 1; hierarchical softmax is not supported".to_string(),
            ));
        }
        if !(self.alpha > 0.0 && self.min_alpha >= 0.0 && self.min_alpha <= self.alpha) {
            return Err(LexisError::Training(format!(
                "invalid learning rates alpha={} min_alpha={}",
                self.alpha, self.min_alpha
            )));
        }
        Ok(())
    }
}

struct ModelState {
    vocab: Vocabulary,
    /// Word vectors; concat mode appends one padding row.
    words: SharedMatrix,
    docs: SharedMatrix,
    /// Negative-sampling output weights, one row per vocabulary word.
    output: SharedMatrix,
    padding: Option<usize>,
}

/// Which weights one training call may update.
#[derive(Clone, Copy)]
struct Learn {
    doc: bool,
    words: bool,
    hidden: bool,
}

const LEARN_ALL: Learn = Learn {
    doc: true,
    words: true,
    hidden: true,
};

const LEARN_DOC_ONLY: Learn = Learn {
    doc: true,
    words: false,
    hidden: false,
};

/// Per-task buffers reused across documents.
struct Scratch {
    doc: Vec<f32>,
    l1: Vec<f32>,
    neu1e: Vec<f32>,
    word: Vec<f32>,
}

impl Scratch {
    fn new(vector_size: usize, layer1_size: usize) -> Self {
        Self {
            doc: vec![0.0; vector_size],
            l1: vec![0.0; layer1_size],
            neu1e: vec![0.0; layer1_size],
            word: vec![0.0; vector_size],
        }
    }
}

pub struct Doc2Vec {
    config: Doc2VecConfig,
    state: Option<ModelState>,
    show_progress: bool,
}

impl Doc2Vec {
    pub fn new(config: Doc2VecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
            show_progress: false,
        })
    }

    /// Show an epoch progress bar while training.
    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Doc2VecConfig {
        &self.config
    }

    /// Words in the vocabulary, or 0 before [`Self::build_vocab`].
    #[must_use]
    pub fn vocab_len(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.vocab.len())
    }

    /// Number of document vectors (highest tag + 1).
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.docs.rows())
    }

    /// Scan the corpus, build the vocabulary and initialize all weights.
    pub fn build_vocab<D: TaggedText>(&mut self, docs: &[D]) -> Result<()> {
        let vocab = Vocabulary::build(
            docs.iter().map(TaggedText::words),
            self.config.min_count,
            self.config.sample,
        )?;
        let doc_rows = docs.iter().map(|doc| doc.tag() + 1).max().unwrap_or(0);
        let vs = self.config.vector_size;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let padding = (self.config.mode == TrainingMode::DmConcat).then(|| vocab.len());
        let word_rows = vocab.len() + usize::from(padding.is_some());
        let words = SharedMatrix::random(word_rows, vs, &mut rng);
        let docs_matrix = SharedMatrix::random(doc_rows, vs, &mut rng);
        let output = SharedMatrix::zeros(vocab.len(), self.config.layer1_size());

        info!(model = %self, words = vocab.len(), docs = doc_rows, "vocabulary scanned & state initialized");

        self.state = Some(ModelState {
            vocab,
            words,
            docs: docs_matrix,
            output,
            padding,
        });
        Ok(())
    }

    /// Train for the configured number of epochs over `docs` in order.
    ///
    /// The learning rate decays linearly from `alpha` to `min_alpha` across
    /// all epochs. With one worker the result is fully determined by the seed.
    pub fn train<D: TaggedText + Sync>(&mut self, docs: &[D]) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| LexisError::Training("build_vocab must run before train".to_string()))?;
        if let Some(doc) = docs.iter().find(|doc| doc.tag() >= state.docs.rows()) {
            return Err(LexisError::Training(format!(
                "document tag {} was not seen by build_vocab",
                doc.tag()
            )));
        }

        let config = &self.config;
        let workers = config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|err| LexisError::Training(format!("thread pool: {err}")))?;

        let total = (config.epochs * docs.len()).max(1);
        let processed = AtomicUsize::new(0);
        let pb = epoch_progress(self.show_progress, config.epochs)?;

        for epoch in 0..config.epochs {
            pool.install(|| {
                docs.par_chunks(CHUNK_DOCS)
                    .enumerate()
                    .for_each(|(chunk_index, chunk)| {
                        let mut rng = StdRng::seed_from_u64(chunk_seed(config.seed, epoch, chunk_index));
                        let mut scratch = Scratch::new(config.vector_size, config.layer1_size());
                        for doc in chunk {
                            let done = processed.fetch_add(1, Ordering::Relaxed);
                            let progress = done as f32 / total as f32;
                            let alpha = (config.min_alpha - config.alpha).mul_add(progress, config.alpha);
                            let words = state.vocab.encode(doc.words(), &mut rng);
                            state.docs.read_row(doc.tag(), &mut scratch.doc);
                            train_document(state, config, &words, alpha, LEARN_ALL, &mut rng, &mut scratch);
                            state.docs.write_row(doc.tag(), &scratch.doc);
                        }
                    });
            });
            pb.inc(1);
            debug!(model = %self, epoch = epoch + 1, "epoch complete");
        }
        pb.finish_and_clear();
        info!(model = %self, epochs = config.epochs, docs = docs.len(), "training complete");
        Ok(())
    }

    /// Trained vector for `tag`.
    #[must_use]
    pub fn doc_vector(&self, tag: usize) -> Option<Vec<f32>> {
        let state = self.state.as_ref()?;
        (tag < state.docs.rows()).then(|| state.docs.row_vec(tag))
    }

    /// Word vector, if the word made it into the vocabulary.
    #[must_use]
    pub fn word_vector(&self, word: &str) -> Option<Vec<f32>> {
        let state = self.state.as_ref()?;
        state.vocab.get(word).map(|i| state.words.row_vec(i))
    }

    /// Fit a fresh document vector for `words` against frozen word and
    /// output weights. Deterministic for a given word list.
    pub fn infer_vector(&self, words: &[String]) -> Result<Vec<f32>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| LexisError::Training("model has no vocabulary yet".to_string()))?;
        let config = &self.config;
        let vs = config.vector_size;

        let mut rng = StdRng::seed_from_u64(config.seed ^ fnv1a(words));
        let mut scratch = Scratch::new(vs, config.layer1_size());
        let scale = 1.0 / vs as f32;
        for x in &mut scratch.doc {
            *x = (rng.random::<f32>() - 0.5) * scale;
        }

        let epochs = config.epochs.max(1);
        for epoch in 0..epochs {
            let progress = epoch as f32 / epochs as f32;
            let alpha = (config.min_alpha - config.alpha).mul_add(progress, config.alpha);
            let encoded = state.vocab.encode(words, &mut rng);
            train_document(state, config, &encoded, alpha, LEARN_DOC_ONLY, &mut rng, &mut scratch);
        }
        Ok(scratch.doc)
    }
}

impl DocVectors for Doc2Vec {
    fn vector_size(&self) -> usize {
        self.config.vector_size
    }

    fn doc_vector(&self, tag: usize) -> Option<Vec<f32>> {
        Self::doc_vector(self, tag)
    }

    fn infer_vector(&self, words: &[String]) -> Result<Vec<f32>> {
        Self::infer_vector(self, words)
    }
}

impl fmt::Display for Doc2Vec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        let mut segments = Vec::new();
        if let Some(comment) = c.comment.as_deref() {
            segments.push(format!("\"{comment}\""));
        }
        if c.dbow_words && c.mode == TrainingMode::Dbow {
            segments.push("dbow+w".to_string());
        } else {
            segments.push(c.mode.label().to_string());
        }
        segments.push(format!("d{}", c.vector_size));
        segments.push(format!("n{}", c.negative));
        if c.mode != TrainingMode::Dbow || c.dbow_words {
            segments.push(format!("w{}", c.window));
        }
        if c.min_count > 1 {
            segments.push(format!("mc{}", c.min_count));
        }
        if c.sample > 0.0 {
            segments.push(format!("s{}", c.sample));
        }
        let workers = c.effective_workers();
        if workers > 1 {
            segments.push(format!("t{workers}"));
        }
        write!(f, "Doc2Vec<{}>", segments.join(","))
    }
}

fn epoch_progress(show: bool, epochs: usize) -> Result<ProgressBar> {
    if !show {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(epochs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] epoch {pos}/{len}")
            .map_err(|err| LexisError::Config(format!("progress template: {err}")))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn chunk_seed(seed: u64, epoch: usize, chunk: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((epoch as u64) << 32)
        .wrapping_add(chunk as u64)
}

/// FNV-1a over the words, separated by a zero byte.
fn fnv1a(words: &[String]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for word in words {
        for byte in word.bytes().chain(std::iter::once(0)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// One positive and `negative` sampled updates against hidden vector `l1`.
/// The input-side error is accumulated into `neu1e`.
#[allow(clippy::too_many_arguments)]
fn train_pair<R: Rng>(
    state: &ModelState,
    target: usize,
    l1: &[f32],
    neu1e: &mut [f32],
    alpha: f32,
    negative: usize,
    learn_hidden: bool,
    rng: &mut R,
) {
    for d in 0..=negative {
        let (word, label) = if d == 0 {
            (target, 1.0)
        } else {
            let sampled = state.vocab.sample_negative(rng);
            if sampled == target {
                continue;
            }
            (sampled, 0.0)
        };
        let f = state.output.dot_row(word, l1);
        let g = (label - sigmoid(f)) * alpha;
        state.output.accumulate_row(word, neu1e, g);
        if learn_hidden {
            state.output.add_to_row(word, l1, g);
        }
    }
}

/// Train on one encoded document. `scratch.doc` holds the document vector
/// and is updated in place when `learn.doc` is set.
fn train_document<R: Rng>(
    state: &ModelState,
    config: &Doc2VecConfig,
    words: &[usize],
    alpha: f32,
    learn: Learn,
    rng: &mut R,
    scratch: &mut Scratch,
) {
    match config.mode {
        TrainingMode::Dbow => train_dbow(state, config, words, alpha, learn, rng, scratch),
        TrainingMode::DmMean | TrainingMode::DmSum => {
            train_dm(state, config, words, alpha, learn, rng, scratch);
        }
        TrainingMode::DmConcat => train_dm_concat(state, config, words, alpha, learn, rng, scratch),
    }
}

fn train_dbow<R: Rng>(
    state: &ModelState,
    config: &Doc2VecConfig,
    words: &[usize],
    alpha: f32,
    learn: Learn,
    rng: &mut R,
    scratch: &mut Scratch,
) {
    for (pos, &word) in words.iter().enumerate() {
        if config.dbow_words && learn.words {
            let reduced = rng.random_range(0..config.window.max(1));
            let reach = config.window.max(1) - reduced;
            let start = pos.saturating_sub(reach);
            let end = (pos + reach + 1).min(words.len());
            for (ctx_pos, &context) in words.iter().enumerate().take(end).skip(start) {
                if ctx_pos == pos {
                    continue;
                }
                state.words.read_row(context, &mut scratch.word);
                scratch.neu1e.fill(0.0);
                train_pair(state, word, &scratch.word, &mut scratch.neu1e, alpha, config.negative, learn.hidden, rng);
                state.words.add_to_row(context, &scratch.neu1e, 1.0);
            }
        }

        scratch.neu1e.fill(0.0);
        train_pair(state, word, &scratch.doc, &mut scratch.neu1e, alpha, config.negative, learn.hidden, rng);
        if learn.doc {
            for (x, e) in scratch.doc.iter_mut().zip(&scratch.neu1e) {
                *x += e;
            }
        }
    }
}

fn train_dm<R: Rng>(
    state: &ModelState,
    config: &Doc2VecConfig,
    words: &[usize],
    alpha: f32,
    learn: Learn,
    rng: &mut R,
    scratch: &mut Scratch,
) {
    let mut context = Vec::with_capacity(2 * config.window);
    for (pos, &target) in words.iter().enumerate() {
        let reduced = rng.random_range(0..config.window);
        let reach = config.window - reduced;
        let start = pos.saturating_sub(reach);
        let end = (pos + reach + 1).min(words.len());
        context.clear();
        context.extend(
            (start..end)
                .filter(|&i| i != pos)
                .map(|i| words[i]),
        );

        scratch.l1.copy_from_slice(&scratch.doc);
        for &c in &context {
            state.words.accumulate_row(c, &mut scratch.l1, 1.0);
        }
        let inv_count = 1.0 / (context.len() + 1) as f32;
        if config.mode == TrainingMode::DmMean {
            for x in &mut scratch.l1 {
                *x *= inv_count;
            }
        }

        scratch.neu1e.fill(0.0);
        train_pair(state, target, &scratch.l1, &mut scratch.neu1e, alpha, config.negative, learn.hidden, rng);
        if config.mode == TrainingMode::DmSum {
            for e in &mut scratch.neu1e {
                *e *= inv_count;
            }
        }

        if learn.doc {
            for (x, e) in scratch.doc.iter_mut().zip(&scratch.neu1e) {
                *x += e;
            }
        }
        if learn.words {
            for &c in &context {
                state.words.add_to_row(c, &scratch.neu1e, 1.0);
            }
        }
    }
}

fn train_dm_concat<R: Rng>(
    state: &ModelState,
    config: &Doc2VecConfig,
    words: &[usize],
    alpha: f32,
    learn: Learn,
    rng: &mut R,
    scratch: &mut Scratch,
) {
    let vs = config.vector_size;
    let window = config.window;
    let Some(padding) = state.padding else {
        return;
    };
    let mut slots = Vec::with_capacity(2 * window);

    for (pos, &target) in words.iter().enumerate() {
        slots.clear();
        for offset in (1..=window).rev() {
            slots.push(pos.checked_sub(offset).map_or(padding, |i| words[i]));
        }
        for offset in 1..=window {
            slots.push(words.get(pos + offset).copied().unwrap_or(padding));
        }

        scratch.l1[..vs].copy_from_slice(&scratch.doc);
        for (slot, &row) in slots.iter().enumerate() {
            let begin = (slot + 1) * vs;
            state.words.read_row(row, &mut scratch.l1[begin..begin + vs]);
        }

        scratch.neu1e.fill(0.0);
        train_pair(state, target, &scratch.l1, &mut scratch.neu1e, alpha, config.negative, learn.hidden, rng);

        if learn.doc {
            for (x, e) in scratch.doc.iter_mut().zip(&scratch.neu1e[..vs]) {
                *x += e;
            }
        }
        if learn.words {
            for (slot, &row) in slots.iter().enumerate() {
                let begin = (slot + 1) * vs;
                state.words.add_to_row(row, &scratch.neu1e[begin..begin + vs], 1.0);
            }
        }
    }
}
