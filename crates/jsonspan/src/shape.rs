//! Shape detection: a bounded pre-pass that spots large uniform arrays.
//!
//! The detector never fails. It reads at most a sample window of the input,
//! walks array elements by tracking bracket depth and string boundaries, and
//! extrapolates the element count from the average element size. Anything it
//! does not understand is reported as "not a large array", which only costs
//! the tokenizer its up-front reservation.

use bstr::ByteSlice;

use crate::options::ShapeOptions;

/// What the detector learned about the input.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArrayShapeInfo {
    /// `true` when `estimated_elements` exceeds the configured threshold.
    pub is_large_array: bool,
    /// Estimated number of elements in the (possibly enveloped) array. Exact
    /// when the whole array fit in the sample window.
    pub estimated_elements: usize,
    /// Average number of tokens per sampled element, separators excluded.
    pub tokens_per_element: usize,
}

impl ArrayShapeInfo {
    /// The conservative answer: not an array worth pre-sizing for.
    pub const NOT_LARGE: Self = Self {
        is_large_array: false,
        estimated_elements: 0,
        tokens_per_element: 0,
    };

    /// Estimated token count of the array: every element, one separator per
    /// element and the two brackets.
    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_elements
            .saturating_mul(self.tokens_per_element.saturating_add(1))
            .saturating_add(2)
    }
}

/// Classifies `input` without tokenizing it.
///
/// # Examples
///
/// ```rust
/// use jsonspan::{ShapeOptions, detect_shape};
///
/// let shape = detect_shape(br#"{"data":[{"x":1},{"x":2}]}"#, &ShapeOptions::default());
/// assert_eq!(shape.estimated_elements, 2);
/// assert_eq!(shape.tokens_per_element, 5);
/// assert!(!shape.is_large_array);
/// ```
#[must_use]
pub fn detect_shape(input: &[u8], options: &ShapeOptions) -> ArrayShapeInfo {
    let start = skip_whitespace(input, 0);
    let shape = match input.get(start) {
        Some(b'[') => sample_array(input, start, options),
        Some(b'{') => sample_envelope(input, start, options),
        _ => ArrayShapeInfo::NOT_LARGE,
    };
    log::trace!(
        "shape: large={} elements~{} tokens/element={} ({} bytes)",
        shape.is_large_array,
        shape.estimated_elements,
        shape.tokens_per_element,
        input.len()
    );
    shape
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub(crate) fn skip_whitespace(input: &[u8], mut pos: usize) -> usize {
    while input.get(pos).is_some_and(|&b| is_whitespace(b)) {
        pos += 1;
    }
    pos
}

/// Returns the position after the closing quote of the string starting at
/// `quote`, or `None` if it does not close before `limit`.
fn skip_string(input: &[u8], quote: usize, limit: usize) -> Option<usize> {
    let mut pos = quote + 1;
    while pos < limit {
        pos += input[pos..limit].find_byteset(b"\"\\")?;
        if input[pos] == b'"' {
            return Some(pos + 1);
        }
        // Backslash: the escaped byte can never end the string.
        pos += 2;
    }
    None
}

/// Skips a number or literal run.
fn skip_scalar(input: &[u8], mut pos: usize, limit: usize) -> usize {
    while pos < limit
        && !matches!(
            input[pos],
            b',' | b':' | b'[' | b']' | b'{' | b'}' | b'"' | b' ' | b'\t' | b'\n' | b'\r'
        )
    {
        pos += 1;
    }
    pos
}

/// Samples the array whose `[` is at `open`.
fn sample_array(input: &[u8], open: usize, options: &ShapeOptions) -> ArrayShapeInfo {
    let limit = input
        .len()
        .min(open.saturating_add(1).saturating_add(options.sample_window_bytes));
    let first = skip_whitespace(input, open + 1);
    if first >= input.len() || input[first] == b']' {
        return ArrayShapeInfo::NOT_LARGE;
    }

    let mut pos = first;
    let mut depth = 0usize;
    let mut elements = 0usize;
    let mut tokens = 0usize;
    let mut element_tokens = 0usize;
    // End of the last complete element, including its separator.
    let mut sampled_end = first;
    let mut closed = false;

    while pos < limit && elements < options.sample_max_elements {
        match input[pos] {
            b'"' => {
                element_tokens += 1;
                match skip_string(input, pos, limit) {
                    Some(end) => pos = end,
                    None => break,
                }
                continue;
            }
            b'{' | b'[' => {
                depth += 1;
                element_tokens += 1;
            }
            b'}' | b']' if depth > 0 => {
                depth -= 1;
                element_tokens += 1;
            }
            b']' => {
                if element_tokens > 0 {
                    elements += 1;
                    tokens += element_tokens;
                }
                sampled_end = pos;
                closed = true;
                break;
            }
            b',' if depth == 0 => {
                elements += 1;
                tokens += element_tokens;
                element_tokens = 0;
                pos += 1;
                sampled_end = pos;
                continue;
            }
            // A stray `}` at depth 0 still ends the element's token count.
            b',' | b':' | b'}' => element_tokens += 1,
            b if is_whitespace(b) => {}
            _ => {
                element_tokens += 1;
                pos = skip_scalar(input, pos, limit);
                continue;
            }
        }
        pos += 1;
    }

    if elements == 0 {
        return ArrayShapeInfo::NOT_LARGE;
    }
    let tokens_per_element = (tokens + elements / 2) / elements;
    let estimated_elements = if closed {
        elements
    } else {
        let sampled_bytes = sampled_end - first;
        let mut end = input.len();
        while end > first && is_whitespace(input[end - 1]) {
            end -= 1;
        }
        ((end - first).saturating_mul(elements) / sampled_bytes.max(1)).max(elements)
    };

    ArrayShapeInfo {
        is_large_array: estimated_elements > options.large_array_threshold,
        estimated_elements,
        tokens_per_element,
    }
}

/// Samples every top-level member of the object at `open` whose value is an
/// array, as long as the member starts within the envelope scan window, and
/// keeps the one with the most estimated elements. Ties go to the earlier
/// member, so `{"errors":[],"data":[...]}` is judged by `data`.
fn sample_envelope(input: &[u8], open: usize, options: &ShapeOptions) -> ArrayShapeInfo {
    let limit = input
        .len()
        .min(open.saturating_add(1).saturating_add(options.envelope_scan_bytes));
    let mut best = ArrayShapeInfo::NOT_LARGE;
    let mut pos = open + 1;
    let mut depth = 0usize;
    let mut after_colon = false;

    while pos < limit {
        match input[pos] {
            b'"' => {
                after_colon = false;
                match skip_string(input, pos, limit) {
                    Some(end) => pos = end,
                    None => break,
                }
                continue;
            }
            b':' if depth == 0 => after_colon = true,
            b'[' if depth == 0 && after_colon => {
                let shape = sample_array(input, pos, options);
                if shape.estimated_elements > best.estimated_elements {
                    best = shape;
                }
                // Keep scanning inside it; later members are reached once
                // its brackets balance.
                depth += 1;
                after_colon = false;
            }
            b'{' | b'[' => {
                depth += 1;
                after_colon = false;
            }
            b'}' | b']' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => break,
            },
            b',' => after_colon = false,
            b if is_whitespace(b) => {}
            _ => after_colon = false,
        }
        pos += 1;
    }
    best
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::String};

    use rstest::rstest;

    use super::*;

    fn uniform_objects(count: usize, value: impl Fn(usize) -> String) -> String {
        let mut s = String::from("[");
        for i in 0..count {
            if i > 0 {
                s.push(',');
            }
            s.push_str(&format!("{{\"x\":{}}}", value(i)));
        }
        s.push(']');
        s
    }

    fn opts(threshold: usize) -> ShapeOptions {
        ShapeOptions {
            large_array_threshold: threshold,
            ..Default::default()
        }
    }

    #[test]
    fn two_element_array_is_exact() {
        let shape = detect_shape(br#"[{"id":1},{"id":2}]"#, &ShapeOptions::default());
        assert_eq!(
            shape,
            ArrayShapeInfo {
                is_large_array: false,
                estimated_elements: 2,
                tokens_per_element: 5,
            }
        );
    }

    #[test]
    fn ten_thousand_fixed_width_objects() {
        let input = uniform_objects(10_000, |_| String::from("7"));
        let shape = detect_shape(input.as_bytes(), &ShapeOptions::default());
        assert!(shape.is_large_array);
        assert_eq!(shape.estimated_elements, 10_000);
        assert_eq!(shape.tokens_per_element, 5);
    }

    #[test]
    fn ten_thousand_counting_objects_is_close() {
        let input = uniform_objects(10_000, |i| format!("{i}"));
        let shape = detect_shape(input.as_bytes(), &ShapeOptions::default());
        assert!(shape.is_large_array);
        assert!(
            (8_000..=12_500).contains(&shape.estimated_elements),
            "estimate {} too far from 10000",
            shape.estimated_elements
        );
        assert_eq!(shape.tokens_per_element, 5);
    }

    #[test]
    fn envelope_recurses_into_nested_array() {
        let shape = detect_shape(br#"{"data":[{"x":1},{"x":2}]}"#, &ShapeOptions::default());
        assert_eq!(shape.estimated_elements, 2);
        assert_eq!(shape.tokens_per_element, 5);
        assert!(!shape.is_large_array);
    }

    #[test]
    fn envelope_skips_scalar_and_nested_members() {
        let input = br#"{"total":3,"meta":{"tags":["a","b"]},"next":"[x]","items":[1,2,3]}"#;
        let shape = detect_shape(input, &opts(2));
        assert_eq!(shape.estimated_elements, 3);
        assert_eq!(shape.tokens_per_element, 1);
        assert!(shape.is_large_array);
    }

    #[rstest]
    #[case::empty_array_first(r#"{"errors":[],"data":"#)]
    #[case::small_array_first(r#"{"tags":["a"],"data":"#)]
    #[case::two_small_arrays_first(r#"{"a":[1,2],"b":{"c":[1,2,3]},"data":"#)]
    fn envelope_picks_the_largest_array(#[case] prefix: &str) {
        let mut input = String::from(prefix);
        input.push_str(&uniform_objects(5_000, |_| String::from("1")));
        input.push('}');
        let shape = detect_shape(input.as_bytes(), &ShapeOptions::default());
        assert!(shape.is_large_array, "{shape:?}");
        assert_eq!(shape.estimated_elements, 5_000);
        assert_eq!(shape.tokens_per_element, 5);
    }

    #[test]
    fn envelope_keeps_a_small_array_when_nothing_larger_follows() {
        let shape = detect_shape(br#"{"tags":["a"],"next":null}"#, &opts(0));
        assert_eq!(shape.estimated_elements, 1);
        assert_eq!(shape.tokens_per_element, 1);
    }

    #[test]
    fn envelope_outside_scan_window_is_ignored() {
        let options = ShapeOptions {
            envelope_scan_bytes: 8,
            ..opts(0)
        };
        let shape = detect_shape(br#"{"padding":"xxxxxxxx","items":[1,2,3]}"#, &options);
        assert_eq!(shape, ArrayShapeInfo::NOT_LARGE);
    }

    #[rstest]
    #[case::empty_array(b"[]")]
    #[case::empty_array_with_spaces(b"  [ \n ]  ")]
    #[case::empty_input(b"")]
    #[case::scalar(b"42")]
    #[case::string(br#""[1,2,3]""#)]
    #[case::object_without_array(br#"{"a":{"b":{"c":1}}}"#)]
    #[case::nested_array_not_member(br#"{"a":{"b":[1,2,3]}}"#)]
    #[case::truncated_first_element(br#"[{"a":"#)]
    #[case::garbage(b"@@@")]
    fn degrades_to_not_large(#[case] input: &[u8]) {
        assert_eq!(detect_shape(input, &opts(0)), ArrayShapeInfo::NOT_LARGE);
    }

    #[test]
    fn truncated_mid_sample_extrapolates_from_complete_elements() {
        let shape = detect_shape(br#"[{"a":1},{"a":2},{"a""#, &opts(0));
        assert_eq!(shape.tokens_per_element, 5);
        assert!(shape.estimated_elements >= 2);
    }

    #[test]
    fn brackets_inside_strings_do_not_split_elements() {
        let input = br#"[{"s":"]},[{"},{"s":"\"]"}]"#;
        let shape = detect_shape(input, &opts(0));
        assert_eq!(shape.estimated_elements, 2);
        assert_eq!(shape.tokens_per_element, 5);
    }

    #[test]
    fn scalar_arrays_have_one_token_per_element() {
        let shape = detect_shape(b"[1, -2.5e3, true, null, \"x\"]", &opts(3));
        assert_eq!(shape.estimated_elements, 5);
        assert_eq!(shape.tokens_per_element, 1);
        assert!(shape.is_large_array);
    }

    #[rstest]
    #[case::below(99, false)]
    #[case::at(100, false)]
    #[case::above(101, true)]
    fn threshold_boundaries(#[case] count: usize, #[case] large: bool) {
        let input = uniform_objects(count, |i| format!("{i}"));
        let shape = detect_shape(input.as_bytes(), &opts(100));
        assert_eq!(shape.estimated_elements, count);
        assert_eq!(shape.is_large_array, large);
    }

    #[test]
    fn element_cap_triggers_extrapolation() {
        let options = ShapeOptions {
            sample_max_elements: 10,
            ..opts(50)
        };
        let input = uniform_objects(100, |_| String::from("1"));
        let shape = detect_shape(input.as_bytes(), &options);
        assert_eq!(shape.estimated_elements, 100);
        assert!(shape.is_large_array);
    }

    #[test]
    fn byte_window_triggers_extrapolation() {
        let options = ShapeOptions {
            sample_window_bytes: 64,
            ..opts(50)
        };
        let input = uniform_objects(100, |_| String::from("1"));
        let shape = detect_shape(input.as_bytes(), &options);
        assert_eq!(shape.estimated_elements, 100);
    }

    #[test]
    fn estimated_tokens_counts_separators_and_brackets() {
        let shape = ArrayShapeInfo {
            is_large_array: true,
            estimated_elements: 10,
            tokens_per_element: 5,
        };
        assert_eq!(shape.estimated_tokens(), 62);
    }
}
