use std::fmt;

use super::{Doc2Vec, DocVectors};
use crate::error::{LexisError, Result};

/// Several trained models viewed as one, vectors joined end to end.
pub struct ConcatenatedDoc2Vec<'a> {
    models: Vec<&'a Doc2Vec>,
}

impl<'a> ConcatenatedDoc2Vec<'a> {
    pub fn new(models: Vec<&'a Doc2Vec>) -> Result<Self> {
        if models.is_empty() {
            return Err(LexisError::Validation(
                "concatenation needs at least one model".to_string(),
            ));
        }
        Ok(Self { models })
    }
}

impl DocVectors for ConcatenatedDoc2Vec<'_> {
    fn vector_size(&self) -> usize {
        self.models.iter().map(|m| m.config().vector_size).sum()
    }

    fn doc_vector(&self, tag: usize) -> Option<Vec<f32>> {
        let mut out = Vec::with_capacity(self.vector_size());
        for model in &self.models {
            out.extend(model.doc_vector(tag)?);
        }
        Some(out)
    }

    fn infer_vector(&self, words: &[String]) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(self.vector_size());
        for model in &self.models {
            out.extend(model.infer_vector(words)?);
        }
        Ok(out)
    }
}

impl fmt::Display for ConcatenatedDoc2Vec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.models.iter().map(ToString::to_string).collect();
        f.write_str(&names.join("+"))
    }
}
