mod corpus_tests;
mod query_tests;
