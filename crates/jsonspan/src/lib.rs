//! A zero-copy JSON tokenizer tuned for large arrays of uniform objects.
//!
//! The crate has three layers:
//!
//! - [`detect_shape`] samples the input and estimates whether it is a large,
//!   uniform array (optionally wrapped in an envelope object such as
//!   `{"data":[...]}`), and how many tokens each element needs.
//! - [`Tokenizer`] performs one forward pass over the bytes and emits a flat
//!   list of [`Token`]s. Tokens are spans into the caller's buffer; strings
//!   and numbers stay undecoded until a consumer asks for them. The shape
//!   estimate is used to reserve the token buffer in one allocation.
//! - [`TokenizerPool`] (with the default `std` feature) hands out tokenizers
//!   so their buffers are reused across parses.
//!
//! ```rust
//! use jsonspan::{TokenKind, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::default();
//! let stream = tokenizer.parse(br#"[{"id":1},{"id":2}]"#).unwrap();
//! assert_eq!(stream.shape().estimated_elements, 2);
//!
//! let ids: Vec<i64> = stream
//!     .elements()
//!     .filter_map(|element| element.field("id"))
//!     .filter_map(|id| id.first_number()?.as_i64())
//!     .collect();
//! assert_eq!(ids, [1, 2]);
//! assert_eq!(stream.tokens()[0].kind, TokenKind::ArrayOpen);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod escape_buffer;
mod options;
#[cfg(feature = "std")]
mod pool;
mod raw;
mod shape;
mod stream;
mod token;
mod tokenizer;
mod value;

#[cfg(test)]
mod tests;

pub use error::{DecodeError, Error, LexError, StringError, SyntaxError, TokenizeError};
pub use options::{ShapeOptions, TokenizerOptions};
#[cfg(feature = "std")]
pub use options::PoolOptions;
#[cfg(feature = "std")]
pub use pool::{PoolStats, PooledTokenizer, TokenizerPool};
pub use raw::{RawNumber, RawStr};
pub use shape::{ArrayShapeInfo, detect_shape};
pub use stream::{Elements, TokenStream};
pub use token::{Token, TokenKind};
pub use tokenizer::Tokenizer;
pub use value::{Value, parse_value};
