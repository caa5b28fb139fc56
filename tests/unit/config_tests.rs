use std::fs;
use std::path::PathBuf;

use lexis::LexisError;
use lexis::config::{BulkFormat, Config};
use lexis::doc2vec::{Doc2VecConfig, TrainingMode};
use lexis::test_utils::{TestCase, run_table_tests};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn parse_fixture(relative: &str) -> Config {
    let content = fs::read_to_string(fixture_path(relative)).expect("read fixture");
    toml::from_str(&content).expect("parse config")
}

#[test]
fn config_search_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (None, 60u64, 800usize, 20u64, BulkFormat::Auto),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (
                Some(PathBuf::from("/etc/lexis/profile.json")),
                15u64,
                250usize,
                20u64,
                BulkFormat::Legacy,
            ),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = parse_fixture(relative_path);
        (
            config.search.profile_path,
            config.search.timeout_secs,
            config.search.batch_size,
            config.search.page_size,
            config.search.bulk_format,
        )
    })?;
    Ok(())
}

#[test]
fn config_corpus_and_doc2vec_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (PathBuf::from("."), 100usize, 20usize, 2usize, 0usize, 0.0f64),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (PathBuf::from("/tmp/imdb"), 50usize, 5usize, 2usize, 2usize, 0.001f64),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = parse_fixture(relative_path);
        (
            config.corpus.data_dir,
            config.doc2vec.vector_size,
            config.doc2vec.epochs,
            config.doc2vec.min_count,
            config.doc2vec.workers,
            config.doc2vec.sample,
        )
    })?;
    Ok(())
}

#[test]
fn config_custom_keeps_unset_defaults() {
    let config = parse_fixture("tests/fixtures/configs/custom.toml");
    assert_eq!(config.search.page_size, 20);
    assert_eq!(config.doc2vec.negative, 5);
    assert_eq!(config.doc2vec.seed, 1);
    assert!(config.corpus.url.ends_with("aclImdb_v1.tar.gz"));
}

#[test]
fn doc2vec_config_from_settings() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (TrainingMode::Dbow, 100usize, 20usize, 2usize, 5usize, 1u64),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (TrainingMode::Dbow, 50usize, 5usize, 2usize, 5usize, 1u64),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = Doc2VecConfig::from_settings(&parse_fixture(relative_path).doc2vec);
        (
            config.mode,
            config.vector_size,
            config.epochs,
            config.min_count,
            config.negative,
            config.seed,
        )
    })?;
    Ok(())
}

#[test]
fn config_load_explicit_file() {
    let config = Config::load_with_env(Some(&fixture_path("tests/fixtures/configs/custom.toml")), |_| None)
        .expect("load");
    assert_eq!(config.search.batch_size, 250);
    assert_eq!(config.corpus.data_dir, PathBuf::from("/tmp/imdb"));
}

#[test]
fn config_load_missing_explicit_file_is_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config::load_with_env(Some(&dir.path().join("absent.toml")), |_| None).expect("load");
    assert_eq!(config.search.batch_size, 800);
    assert_eq!(config.doc2vec.vector_size, 100);
}

#[test]
fn config_rejects_unknown_bulk_format() {
    let result = toml::from_str::<Config>("[search]\nbulk_format = \"ancient\"\n");
    assert!(result.is_err());
}

fn load_with_vars(relative: &str, vars: &[(&str, &str)]) -> lexis::Result<Config> {
    Config::load_with_env(Some(&fixture_path(relative)), |key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| (*value).to_string())
    })
}

#[test]
fn config_env_overrides_file_values() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "file_only",
            input: vec![],
            expected: (250usize, 20u64, BulkFormat::Legacy, 50usize, PathBuf::from("/tmp/imdb")),
            should_panic: false,
        },
        TestCase {
            name: "env_wins_over_file",
            input: vec![
                ("LEXIS_SEARCH_BATCH_SIZE", "64"),
                ("LEXIS_SEARCH_BULK_FORMAT", "modern"),
                ("LEXIS_DOC2VEC_VECTOR_SIZE", "12"),
                ("LEXIS_CORPUS_DATA_DIR", "/srv/corpus"),
            ],
            expected: (64usize, 20u64, BulkFormat::Modern, 12usize, PathBuf::from("/srv/corpus")),
            should_panic: false,
        },
        TestCase {
            name: "env_sets_field_missing_from_file",
            input: vec![("LEXIS_SEARCH_PAGE_SIZE", "5")],
            expected: (250usize, 5u64, BulkFormat::Legacy, 50usize, PathBuf::from("/tmp/imdb")),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |vars: Vec<(&'static str, &'static str)>| {
        let config = load_with_vars("tests/fixtures/configs/custom.toml", &vars).expect("load");
        (
            config.search.batch_size,
            config.search.page_size,
            config.search.bulk_format,
            config.doc2vec.vector_size,
            config.corpus.data_dir,
        )
    })?;
    Ok(())
}

#[test]
fn config_env_invalid_values_are_config_errors() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "batch_size_not_a_number",
            input: ("LEXIS_SEARCH_BATCH_SIZE", "abc"),
            expected: "config",
            should_panic: false,
        },
        TestCase {
            name: "negative_seed",
            input: ("LEXIS_DOC2VEC_SEED", "-1"),
            expected: "config",
            should_panic: false,
        },
        TestCase {
            name: "zero_page_size",
            input: ("LEXIS_SEARCH_PAGE_SIZE", "0"),
            expected: "config",
            should_panic: false,
        },
        TestCase {
            name: "unknown_bulk_format",
            input: ("LEXIS_SEARCH_BULK_FORMAT", "ancient"),
            expected: "config",
            should_panic: false,
        },
    ];

    run_table_tests(cases, |var: (&'static str, &'static str)| {
        match load_with_vars("tests/fixtures/configs/default.toml", &[var]) {
            Err(err @ LexisError::Config(_)) => err.code(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => "ok",
        }
    })?;
    Ok(())
}

#[test]
fn config_env_names_explicit_file() {
    let custom = fixture_path("tests/fixtures/configs/custom.toml");
    let custom = custom.to_str().expect("utf-8 path");
    let config =
        Config::load_with_env(None, |key| (key == "LEXIS_CONFIG").then(|| custom.to_string()))
            .expect("load");
    assert_eq!(config.search.batch_size, 250);
}
