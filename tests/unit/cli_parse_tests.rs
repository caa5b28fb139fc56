use std::path::PathBuf;

use clap::Parser;

use lexis::cli::commands::{index, ingest, query, search};
use lexis::cli::{Cli, Commands};
use lexis::search::PhraseOperator;

fn parse(args: &[&str]) -> Commands {
    let mut argv = vec!["lexis"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv).command
}

#[test]
fn parse_index_get_defaults_to_all() {
    match parse(&["index", "get"]) {
        Commands::Index(args) => match args.command {
            index::IndexCommand::Get(get) => assert_eq!(get.name, "*"),
            other => panic!("unexpected index command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_index_create_from_profile() {
    match parse(&["index", "create", "movies", "--index-config", "films", "-y"]) {
        Commands::Index(args) => match args.command {
            index::IndexCommand::Create(create) => {
                assert_eq!(create.name, "movies");
                assert_eq!(create.index_config.as_deref(), Some("films"));
                assert!(create.body.is_none());
                assert!(create.yes);
            }
            other => panic!("unexpected index command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_index_create_rejects_both_sources() {
    let result = Cli::try_parse_from([
        "lexis", "index", "create", "movies", "--index-config", "films", "--body", "b.json",
    ]);
    assert!(result.is_err());
}

#[test]
fn parse_ingest_csv() {
    match parse(&["ingest", "csv", "movies", "data/movies.csv"]) {
        Commands::Ingest(args) => match args.command {
            ingest::IngestCommand::Csv(source) => {
                assert_eq!(source.index, "movies");
                assert_eq!(source.file, PathBuf::from("data/movies.csv"));
            }
            other => panic!("unexpected ingest command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_query_run_page() {
    match parse(&["query", "run", "queries.json", "3", "--page", "2"]) {
        Commands::Query(args) => match args.command {
            query::QueryCommand::Run(run) => {
                assert_eq!(run.file, PathBuf::from("queries.json"));
                assert_eq!(run.id, 3);
                assert_eq!(run.page, Some(2));
            }
            other => panic!("unexpected query command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_search_strings_flags() {
    match parse(&[
        "search", "strings", "movies", "-f", "title", "-f", "plot", "--operator", "NOR",
        "--no-highlight", "space opera", "heist",
    ]) {
        Commands::Search(args) => match args.command {
            search::SearchCommand::Strings(strings) => {
                assert_eq!(strings.fields, vec!["title", "plot"]);
                assert_eq!(strings.operator, PhraseOperator::Nor);
                assert!(strings.no_highlight);
                assert!(!strings.show_hits);
                assert_eq!(strings.phrases, vec!["space opera", "heist"]);
            }
            other => panic!("unexpected search command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_search_strings_rejects_bad_operator() {
    let result = Cli::try_parse_from(["lexis", "search", "strings", "movies", "-f", "title", "--operator", "XOR", "x"]);
    assert!(result.is_err());
}

#[test]
fn parse_search_docs_defaults() {
    match parse(&["search", "docs", "movies"]) {
        Commands::Search(args) => match args.command {
            search::SearchCommand::Docs(docs) => {
                assert_eq!(docs.offset, 0);
                assert_eq!(docs.size, 10);
            }
            other => panic!("unexpected search command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_sentiment_archive_conflicts_with_data_dir() {
    let result = Cli::try_parse_from(["lexis", "sentiment", "--archive", "a.tar.gz", "--data-dir", "d"]);
    assert!(result.is_err());

    match parse(&["sentiment", "--archive", "a.tar.gz", "--limit", "100", "--epochs", "3"]) {
        Commands::Sentiment(args) => {
            assert_eq!(args.archive, Some(PathBuf::from("a.tar.gz")));
            assert_eq!(args.limit, Some(100));
            assert_eq!(args.epochs, Some(3));
            assert!(args.workers.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_infer_default_words() {
    match parse(&["infer"]) {
        Commands::Infer(args) => {
            assert_eq!(args.words, vec!["system", "response"]);
            assert_eq!(args.vector_size, 500);
            assert_eq!(args.window, 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
