//! Search engine wrapper
//!
//! Index lifecycle, single and bulk ingestion (lists or CSV files), stored
//! queries with pagination, and match/term/range/query_string helpers over
//! an Elasticsearch-compatible HTTP API.

pub mod bulk;
pub mod client;
pub mod profile;
pub mod queries;
pub mod tabular;

pub use bulk::{BatchFailure, BulkReport, PayloadShape, batch_bounds};
pub use client::{SearchClient, SearchOutcome};
pub use profile::{Auth, IndexConfig, Profile};
pub use queries::{PhraseOperator, QueryBook, QueryDescriptor, QuerySetting};
