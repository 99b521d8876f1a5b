use alloc::vec::Vec;

use quickcheck::QuickCheck;
use serde_json::Value as Json;

use super::arbitrary::{JsonDoc, test_count};
use crate::{ShapeOptions, Tokenizer, detect_shape};

/// Property: detection is a pure function of the bytes and never panics, and
/// neither does tokenizing, whatever the input.
#[test]
fn arbitrary_bytes_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(bytes: Vec<u8>) -> bool {
        let options = ShapeOptions::default();
        let first = detect_shape(&bytes, &options);
        let mut tokenizer = Tokenizer::default();
        let tokens = match tokenizer.parse(&bytes) {
            Ok(stream) => stream.len(),
            Err(err) => err.partial.len(),
        };
        tokens <= bytes.len() && detect_shape(&bytes, &options) == first
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Property: an array that fits in the sample window is counted exactly.
#[test]
fn small_arrays_are_counted_exactly_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(docs: Vec<JsonDoc>) -> bool {
        let array = Json::Array(docs.iter().map(|d| d.0.clone()).collect());
        let text = serde_json::to_string_pretty(&array).unwrap();
        let options = ShapeOptions::default();
        if text.len() >= options.sample_window_bytes || docs.len() > options.sample_max_elements {
            return true;
        }
        detect_shape(text.as_bytes(), &options).estimated_elements == docs.len()
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(Vec<JsonDoc>) -> bool);
}
