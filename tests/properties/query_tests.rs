use proptest::prelude::*;
use serde_json::json;

use lexis::search::QueryBook;

proptest! {
    #[test]
    fn test_page_body_window(page_size in 1u64..200, page_num in 1u64..500) {
        let mut book = QueryBook::new();
        let id = book.load_from_json_dict("movies", json!({"must": {"match_all": {}}}), page_size);
        let descriptor = book.get(id as u64).unwrap();
        let stored = descriptor.query_body.clone();

        let body = descriptor.page_body(page_num).unwrap();
        prop_assert_eq!(&body["from"], &json!((page_num - 1) * page_size));
        prop_assert_eq!(&body["size"], &json!(page_size));
        prop_assert_eq!(&body["query"], &stored["query"]);
        prop_assert_eq!(&descriptor.query_body, &stored);
    }

    #[test]
    fn test_next_page_flag(page_size in 1u64..200, total_hits in 0u64..1000) {
        let mut book = QueryBook::new();
        let id = book.load_from_json_dict("movies", json!({}), page_size);
        let descriptor = book.get(id as u64).unwrap();

        prop_assert_eq!(descriptor.next_page_exists(total_hits), total_hits >= page_size);
        let pages = descriptor.pages_for(total_hits);
        prop_assert!(pages * page_size >= total_hits);
        prop_assert!(pages == 0 || (pages - 1) * page_size < total_hits);
    }
}
