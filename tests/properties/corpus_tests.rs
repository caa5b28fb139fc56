use proptest::prelude::*;

use lexis::corpus::{Split, create_sentiment_document};

fn split_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["train", "test"])
}

fn label_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["pos", "neg", "unsup"])
}

proptest! {
    #[test]
    fn test_unlabeled_iff_extra(
        split in split_name(),
        label in label_name(),
        id in 0u32..50_000,
        index in 0usize..100_000,
    ) {
        let name = format!("aclImdb/{split}/{label}/{id}_7.txt");
        let doc = create_sentiment_document(&name, "a fine film", index).unwrap();

        prop_assert_eq!(doc.tag, index);
        prop_assert_eq!(doc.sentiment.is_none(), doc.split == Split::Extra);
        prop_assert_eq!(doc.sentiment.is_none(), label == "unsup");
        let expected = match label {
            "pos" => Some(1.0),
            "neg" => Some(0.0),
            _ => None,
        };
        prop_assert_eq!(doc.sentiment, expected);
    }

    #[test]
    fn test_words_are_whitespace_tokens(text in "[a-z]{1,6}( {1,3}[a-z]{1,6}){0,20}") {
        let doc = create_sentiment_document("aclImdb/train/pos/1_9.txt", &text, 0).unwrap();
        let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        prop_assert_eq!(doc.words, expected);
    }
}
