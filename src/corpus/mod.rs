//! Sentiment corpus: download, tarball extraction and labeled documents.

mod download;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use regex::Regex;
use serde::Serialize;

use crate::config::DEFAULT_MEMBER_PATTERN;
use crate::error::{LexisError, Result};

pub use download::{dataset_file_name, download_dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
    /// Unlabeled documents; used for training the embeddings only.
    Extra,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::Extra => "extra",
        };
        f.write_str(name)
    }
}

/// One review: whitespace tokens, a dense tag, its split and its label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentDocument {
    pub words: Vec<String>,
    pub tag: usize,
    pub split: Split,
    /// `Some(1.0)` positive, `Some(0.0)` negative, `None` unlabeled.
    pub sentiment: Option<f64>,
}

/// Build a document from an archive member name like
/// `aclImdb/train/pos/0_9.txt`.
///
/// Unlabeled (`unsup`) members always land in [`Split::Extra`].
pub fn create_sentiment_document(name: &str, text: &str, index: usize) -> Result<SentimentDocument> {
    let parts: Vec<&str> = name.split('/').collect();
    let [_, split, label, _] = parts.as_slice() else {
        return Err(LexisError::Corpus(format!(
            "unexpected member path {name}"
        )));
    };

    let sentiment = match *label {
        "pos" => Some(1.0),
        "neg" => Some(0.0),
        "unsup" => None,
        other => {
            return Err(LexisError::Corpus(format!(
                "unknown sentiment label {other} in {name}"
            )));
        }
    };

    let split = match (*split, sentiment) {
        (_, None) => Split::Extra,
        ("train", _) => Split::Train,
        ("test", _) => Split::Test,
        (other, _) => {
            return Err(LexisError::Corpus(format!(
                "unknown split {other} in {name}"
            )));
        }
    };

    Ok(SentimentDocument {
        words: text.split_whitespace().map(str::to_string).collect(),
        tag: index,
        split,
        sentiment,
    })
}

/// Parse every member matching `pattern` from a `.tar.gz` archive.
///
/// Tags are assigned densely in archive order. Members are single-line
/// reviews; a member containing a newline is rejected.
pub fn extract_documents(archive: &Path, pattern: &str) -> Result<Vec<SentimentDocument>> {
    let member_re = Regex::new(pattern)
        .map_err(|err| LexisError::Config(format!("invalid member pattern {pattern}: {err}")))?;

    let file = File::open(archive).map_err(|err| {
        LexisError::Corpus(format!("open {}: {err}", archive.display()))
    })?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));

    let mut docs = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        if !member_re.is_match(&name) {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        if text.contains('\n') {
            return Err(LexisError::Corpus(format!(
                "member {name} spans more than one line"
            )));
        }
        docs.push(create_sentiment_document(&name, &text, docs.len())?);
    }

    tracing::info!(archive = %archive.display(), docs = docs.len(), "corpus extracted");
    Ok(docs)
}

/// [`extract_documents`] with the stock IMDB member pattern.
pub fn extract_imdb_documents(archive: &Path) -> Result<Vec<SentimentDocument>> {
    extract_documents(archive, DEFAULT_MEMBER_PATTERN)
}

/// Labeled `(train, test)` documents; `Extra` is left out.
#[must_use]
pub fn split_documents(docs: &[SentimentDocument]) -> (Vec<&SentimentDocument>, Vec<&SentimentDocument>) {
    let train = docs.iter().filter(|doc| doc.split == Split::Train).collect();
    let test = docs.iter().filter(|doc| doc.split == Split::Test).collect();
    (train, test)
}
