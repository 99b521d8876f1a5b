#![no_main]

use arbitrary::Arbitrary;
use jsonspan::{ShapeOptions, Tokenizer, TokenizerOptions, Value, detect_shape};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput<'a> {
    threshold: u8,
    window: u16,
    max_elements: u8,
    headroom: u8,
    detect: bool,
    bytes: &'a [u8],
}

fuzz_target!(|input: FuzzInput<'_>| {
    let shape_options = ShapeOptions {
        large_array_threshold: usize::from(input.threshold),
        sample_window_bytes: usize::from(input.window),
        sample_max_elements: usize::from(input.max_elements),
        ..Default::default()
    };
    let shape = detect_shape(input.bytes, &shape_options);
    assert_eq!(shape, detect_shape(input.bytes, &shape_options));

    let mut tokenizer = Tokenizer::new(TokenizerOptions {
        shape: shape_options,
        detect_shape: input.detect,
        presize_headroom_percent: usize::from(input.headroom),
        ..Default::default()
    });
    let printed = match tokenizer.parse(input.bytes) {
        Ok(stream) => {
            assert!(stream.len() <= input.bytes.len());
            let value = Value::from_tokens(&stream).expect("a complete stream decodes");
            // Printing and re-tokenizing must be stable.
            let printed = value.to_string();
            let mut again = Tokenizer::default();
            let restream = again.parse(printed.as_bytes()).expect("printed value tokenizes");
            assert_eq!(restream.len(), stream.len());
            Some(printed)
        }
        Err(err) => {
            assert!(err.error.offset <= input.bytes.len());
            assert!(err.partial.len() <= input.bytes.len());
            None
        }
    };

    if let Ok(expected) = serde_json::from_slice::<serde_json::Value>(input.bytes) {
        let printed = printed.expect("serde_json accepted input the tokenizer rejected");
        let reparsed: serde_json::Value =
            serde_json::from_str(&printed).expect("printed value is valid JSON");
        assert_eq!(reparsed, expected);
    }
});
