//! lexis: a search-engine wrapper and a Doc2Vec sentiment benchmark.

pub mod app;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod doc2vec;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod search;
pub mod test_utils;

pub use error::{LexisError, Result};
