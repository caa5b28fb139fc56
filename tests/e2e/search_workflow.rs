//! E2E Scenario: search wrapper against a mock engine
//!
//! Covers stored queries, the filter helpers, paging, and bulk ingestion
//! from lists and CSV files with partial failures.

use httpmock::prelude::*;
use lexis::LexisError;
use lexis::config::{BulkFormat, SearchConfig};
use lexis::search::{PhraseOperator, QueryBook, SearchClient};
use lexis::test_utils::fixtures::SearchFixture;
use serde_json::{Map, Value, json};

const QUERIES: &str = r#"[
  {"query_id": 1, "index": "movies", "query_setting": {"page_size": 20},
   "query_body": {"query": {"bool": {"match": {"title": "alien"}}}}},
  {"query_id": 2, "index": "movies", "query_setting": {"page_size": 10},
   "query_body": {"query": {"bool": {"term": {"genre": "horror"}}}}},
  {"query_id": 3, "index": "movies", "query_setting": {"page_size": 5},
   "query_body": {"query": {"bool": {"range": {"year": {"gte": 1980, "lte": 1989}}}}}},
  {"query_id": 4, "index": "books",
   "query_body": {"query": {"match_all": {}}}},
  {"query_id": 5, "index": "books", "query_setting": {"page_size": 50},
   "query_body": {"query": {"bool": {"match": {"author": "le guin"}}}}}
]"#;

fn hits(total: u64) -> Value {
    json!({"hits": {"total": {"value": total, "relation": "eq"}, "hits": []}})
}

fn client_for(server: &MockServer, config: &SearchConfig) -> (SearchFixture, SearchClient) {
    let fixture = SearchFixture::new();
    let profile = fixture.create_profile(&server.base_url());
    let (client, _) = SearchClient::from_profile_path(&profile, config).unwrap();
    (fixture, client)
}

fn records(n: usize) -> Vec<Map<String, Value>> {
    (0..n)
        .map(|i| {
            let mut map = Map::new();
            map.insert("title".to_string(), json!(format!("movie {i}")));
            map.insert("year".to_string(), json!(1950 + i % 70));
            map
        })
        .collect()
}

#[test]
fn test_filters_return_literal_hit_counts() {
    let server = MockServer::start();
    let fixture = SearchFixture::new();
    let book = QueryBook::load_from_file(&fixture.create_file("queries.json", QUERIES)).unwrap();
    assert_eq!(book.len(), 5);

    let match_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/movies/_search")
            .json_body(json!({"query": {"bool": {"match": {"title": "alien"}}}}));
        then.status(200).json_body(hits(7));
    });
    let term_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/movies/_search")
            .json_body(json!({"query": {"bool": {"term": {"genre": "horror"}}}}));
        then.status(200).json_body(hits(123));
    });
    let range_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/movies/_search")
            .json_body(json!({"query": {"bool": {"range": {"year": {"gte": 1980, "lte": 1989}}}}}));
        then.status(200).json_body(hits(0));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    assert_eq!(client.match_filter("movies", "title", &json!("alien")).unwrap(), 7);
    assert_eq!(client.term_filter("movies", "genre", &json!("horror")).unwrap(), 123);
    assert_eq!(
        client
            .range_filter("movies", "year", &json!(1980), &json!(1989))
            .unwrap(),
        0
    );

    match_mock.assert();
    term_mock.assert();
    range_mock.assert();
}

#[test]
fn test_stored_query_round_trip() {
    let server = MockServer::start();
    let fixture = SearchFixture::new();
    let book = QueryBook::load_from_file(&fixture.create_file("queries.json", QUERIES)).unwrap();
    let stored = book.get(2).unwrap().query_body.clone();

    let mock = server.mock(|when, then| {
        when.method(POST).path("/movies/_search").json_body(stored);
        then.status(200).json_body(hits(25));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    let (total, pages) = client.query(&book, 2).unwrap();
    assert_eq!(total, 25);
    assert_eq!(pages, 3);
    mock.assert();
}

#[test]
fn test_query_page_sets_window_and_next_flag() {
    let server = MockServer::start();
    let fixture = SearchFixture::new();
    let book = QueryBook::load_from_file(&fixture.create_file("queries.json", QUERIES)).unwrap();

    let page_two = server.mock(|when, then| {
        when.method(POST).path("/movies/_search").json_body(json!({
            "query": {"bool": {"range": {"year": {"gte": 1980, "lte": 1989}}}},
            "from": 5,
            "size": 5
        }));
        then.status(200).json_body(hits(12));
    });
    let books_page = server.mock(|when, then| {
        when.method(POST).path("/books/_search").json_body(json!({
            "query": {"match_all": {}},
            "from": 0,
            "size": 20
        }));
        then.status(200).json_body(hits(19));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    assert_eq!(client.query_page(&book, 3, 2).unwrap(), (12, true));
    assert_eq!(client.query_page(&book, 4, 1).unwrap(), (19, false));
    page_two.assert();
    books_page.assert();

    // The stored body is untouched by paging.
    assert!(book.get(3).unwrap().query_body.get("from").is_none());
}

#[test]
fn test_query_errors_are_typed() {
    let server = MockServer::start();
    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());

    let empty = QueryBook::new();
    assert!(matches!(client.query(&empty, 1), Err(LexisError::QueriesNotLoaded)));

    let fixture = SearchFixture::new();
    let book = QueryBook::load_from_file(&fixture.create_file("queries.json", QUERIES)).unwrap();
    assert!(matches!(client.query(&book, 99), Err(LexisError::NotFound(_))));
    assert!(matches!(client.query_page(&book, 1, 0), Err(LexisError::Validation(_))));
}

#[test]
fn test_search_error_carries_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/missing/_search");
        then.status(404).body("index_not_found_exception");
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    match client.match_filter("missing", "title", &json!("x")) {
        Err(LexisError::Search { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("index_not_found_exception"));
        }
        other => panic!("expected search error, got {other:?}"),
    }
}

#[test]
fn test_query_strings_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/articles/_search").json_body(json!({
            "query": {"bool": {"query_string": {
                "fields": ["title", "content"],
                "query": "NOT((hello world) (good morning))"
            }}}
        }));
        then.status(200).json_body(hits(3));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    let total = client
        .query_strings(
            "articles",
            &["title".to_string(), "content".to_string()],
            PhraseOperator::Nor,
            false,
            &["hello world".to_string(), "good morning".to_string()],
        )
        .unwrap();
    assert_eq!(total, 3);
    mock.assert();
}

#[test]
fn test_get_docs_returns_hit_list() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/movies/_search")
            .json_body(json!({"from": 10, "size": 2, "query": {"match_all": {}}}));
        then.status(200).json_body(json!({
            "hits": {"total": {"value": 40}, "hits": [{"_id": "a"}, {"_id": "b"}]}
        }));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    let docs = client.get_docs("movies", 10, 2).unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1]["_id"], "b");
}

#[test]
fn test_bulk_list_in_batches_of_800() {
    let server = MockServer::start();
    let info = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).json_body(json!({"version": {"number": "8.11.1"}}));
    });
    let bulk = server.mock(|when, then| {
        when.method(POST).path("/movies/_bulk");
        then.status(200).json_body(json!({"errors": false, "items": []}));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    let report = client.ingest_bulk_from_list("movies", &records(1700)).unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.succeeded_batches, 3);
    assert!(report.is_success());
    bulk.assert_hits(3);
    info.assert_hits(1);
}

#[test]
fn test_bulk_empty_list_sends_nothing() {
    let server = MockServer::start();
    let bulk = server.mock(|when, then| {
        when.method(POST).path("/movies/_bulk");
        then.status(200).json_body(json!({"errors": false}));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    let report = client.ingest_bulk_from_list("movies", &[]).unwrap();
    assert_eq!(report.batches, 0);
    assert!(report.is_success());
    bulk.assert_hits(0);
}

#[test]
fn test_bulk_failures_are_reported_and_all_batches_attempted() {
    let server = MockServer::start();
    let bulk = server.mock(|when, then| {
        when.method(POST).path("/movies/_bulk");
        then.status(200).json_body(json!({
            "errors": true,
            "items": [{"index": {"status": 400, "error": {"type": "mapper_parsing_exception", "reason": "failed to parse field [year]"}}}]
        }));
    });

    let config = SearchConfig {
        batch_size: 10,
        bulk_format: BulkFormat::Modern,
        ..SearchConfig::default()
    };
    let (_profile_dir, client) = client_for(&server, &config);
    let report = client.ingest_bulk_from_list("movies", &records(25)).unwrap();

    assert_eq!(report.batches, 3);
    assert_eq!(report.succeeded_batches, 0);
    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.failed_records(), 25);
    assert_eq!(report.failures[2].start, 20);
    assert_eq!(report.failures[2].len, 5);
    assert!(report.failures[0].message.contains("failed to parse field [year]"));
    bulk.assert_hits(3);
}

#[test]
fn test_legacy_engine_gets_type_in_action_lines() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).json_body(json!({"version": {"number": "7.17.9"}}));
    });
    let mut expected = String::new();
    for record in records(2) {
        expected.push_str(r#"{"index":{"_index":"movies","_type":"_doc"}}"#);
        expected.push('\n');
        expected.push_str(&serde_json::to_string(&record).unwrap());
        expected.push('\n');
    }
    let bulk = server.mock(|when, then| {
        when.method(POST).path("/movies/_bulk").body(expected);
        then.status(200).json_body(json!({"errors": false}));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    assert_eq!(client.server_version().unwrap(), "7.17.9");
    assert!(client.ingest_bulk_from_list("movies", &records(2)).unwrap().is_success());
    bulk.assert();
}

#[test]
fn test_csv_ingest_keeps_mapped_columns() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/movies/_mapping");
        then.status(200).json_body(json!({
            "movies": {"mappings": {"properties": {
                "title": {"type": "text"},
                "year": {"type": "integer"}
            }}}
        }));
    });
    let expected = concat!(
        r#"{"index":{"_index":"movies"}}"#, "\n",
        r#"{"title":"Alien","year":1979}"#, "\n",
        r#"{"index":{"_index":"movies"}}"#, "\n",
        r#"{"title":"Heat","year":""}"#, "\n",
    );
    let bulk = server.mock(|when, then| {
        when.method(POST).path("/movies/_bulk").body(expected);
        then.status(200).json_body(json!({"errors": false}));
    });

    let config = SearchConfig {
        bulk_format: BulkFormat::Modern,
        ..SearchConfig::default()
    };
    let (fixture, client) = client_for(&server, &config);
    let csv = fixture.create_file("movies.csv", "title,director,year\nAlien,Scott,1979\nHeat,Mann,\n");
    let report = client.ingest_bulk_from_csv("movies", &csv).unwrap();

    assert_eq!(report.total_records, 2);
    assert!(report.is_success());
    bulk.assert();
}

#[test]
fn test_index_lifecycle() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(PUT).path("/movies_v2").json_body(json!({
            "settings": {"number_of_shards": 1},
            "mappings": {"properties": {
                "title": {"type": "text"},
                "year": {"type": "integer"}
            }}
        }));
        then.status(200).json_body(json!({"acknowledged": true, "index": "movies_v2"}));
    });
    let count = server.mock(|when, then| {
        when.method(GET).path("/movies_v2/_count");
        then.status(200).json_body(json!({"count": 42}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/movies_v2");
        then.status(200).json_body(json!({"acknowledged": true}));
    });

    let fixture = SearchFixture::new();
    let profile_path = fixture.create_profile(&server.base_url());
    let (client, profile) = SearchClient::from_profile_path(&profile_path, &SearchConfig::default()).unwrap();

    let created = client.create_index_from_profile("movies_v2", &profile, "movies").unwrap();
    assert_eq!(created["acknowledged"], true);
    assert_eq!(client.get_index_records_cnt("movies_v2").unwrap(), 42);
    assert_eq!(client.delete_index("movies_v2").unwrap()["acknowledged"], true);
    assert!(matches!(
        client.create_index_from_profile("x", &profile, "nope"),
        Err(LexisError::NotFound(_))
    ));

    create.assert();
    count.assert();
    delete.assert();
}

#[test]
fn test_use_profile_switches_host() {
    let first = MockServer::start();
    let second = MockServer::start();
    let counted = second.mock(|when, then| {
        when.method(GET).path("/movies/_count");
        then.status(200).json_body(json!({"count": 3}));
    });

    let (_first_dir, mut client) = client_for(&first, &SearchConfig::default());
    let fixture = SearchFixture::new();
    let other = fixture.create_profile(&second.base_url());
    client.use_profile(&other).unwrap();

    assert_eq!(client.base_url(), second.base_url());
    assert_eq!(client.get_index_records_cnt("movies").unwrap(), 3);
    counted.assert();
}

#[test]
fn test_single_record_must_be_object() {
    let server = MockServer::start();
    let doc = server.mock(|when, then| {
        when.method(POST).path("/movies/_doc").json_body(json!({"title": "Alien"}));
        then.status(201).json_body(json!({"_id": "abc", "result": "created"}));
    });

    let (_profile_dir, client) = client_for(&server, &SearchConfig::default());
    assert!(matches!(
        client.ingest_one_record("movies", &json!(["not", "an", "object"])),
        Err(LexisError::Validation(_))
    ));
    let response = client.ingest_one_record("movies", &json!({"title": "Alien"})).unwrap();
    assert_eq!(response["_id"], "abc");
    doc.assert();
}
