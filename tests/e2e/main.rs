//! E2E test suite entry point.

mod search_workflow;
