//! Error types shared by the search wrapper and the embedding pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine returned {status}: {body}")]
    Search { status: u16, body: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("queries not loaded; load a query file first")]
    QueriesNotLoaded,

    #[error("validation failed: {0}")]
    Validation(String),

    /// Some units of work failed after the command already printed its report.
    #[error("partial failure: {0}")]
    PartialFailure(String),

    #[error("corpus error: {0}")]
    Corpus(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("model fit failed: {0}")]
    ModelFit(String),
}

impl LexisError {
    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Http(_) => "http",
            Self::Search { .. } => "search",
            Self::Csv(_) => "csv",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::QueriesNotLoaded => "queries_not_loaded",
            Self::Validation(_) => "validation",
            Self::PartialFailure(_) => "partial",
            Self::Corpus(_) => "corpus",
            Self::Training(_) => "training",
            Self::ModelFit(_) => "model_fit",
        }
    }
}

impl LexisError {
    /// Whether the command already printed a report describing this error.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::PartialFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, LexisError>;
