/// Tuning knobs for the shape detector.
///
/// The defaults are starting points; the `large_arrays` benchmark is the
/// place to re-derive them for a given workload.
///
/// # Examples
///
/// ```rust
/// use jsonspan::{ShapeOptions, detect_shape};
///
/// let options = ShapeOptions {
///     large_array_threshold: 1,
///     ..Default::default()
/// };
/// assert!(detect_shape(b"[1,2,3]", &options).is_large_array);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeOptions {
    /// An array is "large" when its estimated element count is strictly
    /// greater than this value.
    ///
    /// # Default
    ///
    /// `1_000`
    pub large_array_threshold: usize,

    /// Maximum number of bytes the detector reads while sampling array
    /// elements.
    ///
    /// # Default
    ///
    /// `65_536`
    pub sample_window_bytes: usize,

    /// Maximum number of array elements the detector samples before it
    /// extrapolates.
    ///
    /// # Default
    ///
    /// `256`
    pub sample_max_elements: usize,

    /// When the input is an object, the number of leading bytes searched for
    /// a member whose value is an array (the `{"data":[...]}` envelope).
    ///
    /// # Default
    ///
    /// `4_096`
    pub envelope_scan_bytes: usize,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            large_array_threshold: 1_000,
            sample_window_bytes: 64 * 1024,
            sample_max_elements: 256,
            envelope_scan_bytes: 4 * 1024,
        }
    }
}

/// Configuration for a [`Tokenizer`](crate::Tokenizer).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Shape detector settings used before each parse.
    pub shape: ShapeOptions,

    /// Whether to run the shape detector at all. Disabling it trades the
    /// single up-front reservation for amortized growth.
    ///
    /// # Default
    ///
    /// `true`
    pub detect_shape: bool,

    /// Token capacity reserved for inputs that are not large arrays.
    ///
    /// # Default
    ///
    /// `64`
    pub initial_capacity: usize,

    /// Extra room, in percent of the estimate, reserved on top of the shape
    /// estimate so that slightly irregular arrays still fit in one allocation.
    ///
    /// # Default
    ///
    /// `12`
    pub presize_headroom_percent: usize,

    /// Maximum container nesting depth.
    ///
    /// Tokenizing itself is iterative, so any value is safe here. Building a
    /// [`Value`](crate::Value) tree is capped separately at
    /// [`Value::MAX_DEPTH`](crate::Value::MAX_DEPTH).
    ///
    /// # Default
    ///
    /// `512`
    pub max_depth: usize,

    /// Whether to accept several whitespace-separated root values in one
    /// input, as in JSON Lines / ND-JSON.
    ///
    /// # Examples
    ///
    /// ```json
    /// {"a":1}
    /// {"a":2}
    /// ```
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_values: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            shape: ShapeOptions::default(),
            detect_shape: true,
            initial_capacity: 64,
            presize_headroom_percent: 12,
            max_depth: 512,
            allow_multiple_values: false,
        }
    }
}

/// Configuration for a [`TokenizerPool`](crate::TokenizerPool).
#[cfg(feature = "std")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of idle tokenizers kept. Returned instances beyond this
    /// are dropped.
    ///
    /// # Default
    ///
    /// `16`
    pub max_idle: usize,

    /// Options for tokenizers the pool creates.
    pub tokenizer: TokenizerOptions,
}

#[cfg(feature = "std")]
impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_idle: 16,
            tokenizer: TokenizerOptions::default(),
        }
    }
}
