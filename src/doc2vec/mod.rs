//! Document embeddings.
//!
//! [`Doc2Vec`] trains paragraph vectors over any corpus of [`TaggedText`]
//! documents. Anything that can look up and infer document vectors
//! implements [`DocVectors`], which is what the evaluation code consumes.

mod concat;
mod model;
mod vocab;
mod weights;

use crate::corpus::SentimentDocument;
use crate::error::Result;

pub use concat::ConcatenatedDoc2Vec;
pub use model::{Doc2Vec, Doc2VecConfig, TrainingMode};
pub use vocab::Vocabulary;

/// A tokenized document with a dense integer tag.
pub trait TaggedText {
    fn words(&self) -> &[String];
    fn tag(&self) -> usize;
}

impl TaggedText for SentimentDocument {
    fn words(&self) -> &[String] {
        &self.words
    }

    fn tag(&self) -> usize {
        self.tag
    }
}

impl<T: TaggedText> TaggedText for &T {
    fn words(&self) -> &[String] {
        (*self).words()
    }

    fn tag(&self) -> usize {
        (*self).tag()
    }
}

/// Plain tagged document for corpora without sentiment labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDocument {
    pub words: Vec<String>,
    pub tag: usize,
}

impl TaggedDocument {
    #[must_use]
    pub const fn new(words: Vec<String>, tag: usize) -> Self {
        Self { words, tag }
    }
}

impl TaggedText for TaggedDocument {
    fn words(&self) -> &[String] {
        &self.words
    }

    fn tag(&self) -> usize {
        self.tag
    }
}

/// Source of document vectors: trained lookups by tag, inference for
/// unseen text.
pub trait DocVectors {
    fn vector_size(&self) -> usize;

    fn doc_vector(&self, tag: usize) -> Option<Vec<f32>>;

    /// # Errors
    ///
    /// Fails if the model has not been trained.
    fn infer_vector(&self, words: &[String]) -> Result<Vec<f32>>;
}

/// Callable view over a model: token list in, inferred vector out.
pub struct DocEmbedder<M> {
    model: M,
}

impl<M: DocVectors> DocEmbedder<M> {
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    /// # Errors
    ///
    /// Fails if the model has not been trained.
    pub fn embed(&self, words: &[String]) -> Result<Vec<f32>> {
        self.model.infer_vector(words)
    }
}

/// Small built-in corpus used when inferring vectors without a trained
/// sentiment model.
pub const COMMON_TEXTS: [&str; 9] = [
    "human interface computer",
    "survey user computer system response time",
    "eps user interface system",
    "system human system eps",
    "user response time",
    "trees",
    "graph trees",
    "graph minors trees",
    "graph minors survey",
];

/// [`COMMON_TEXTS`] as tagged documents, tags in order.
#[must_use]
pub fn common_texts() -> Vec<TaggedDocument> {
    COMMON_TEXTS
        .iter()
        .enumerate()
        .map(|(tag, text)| TaggedDocument::new(text.split_whitespace().map(str::to_string).collect(), tag))
        .collect()
}
