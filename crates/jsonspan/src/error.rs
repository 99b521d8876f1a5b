use thiserror::Error;

use crate::{stream::TokenStream, token::TokenKind};

/// A lexical error found while tokenizing, positioned at a byte offset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct LexError {
    /// What went wrong.
    pub kind: SyntaxError,
    /// Byte offset into the input where the problem was detected.
    pub offset: usize,
}

impl LexError {
    pub(crate) fn new(kind: SyntaxError, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Converts the byte offset into a 1-based `(line, column)` pair for the
    /// given input. Columns count bytes, not characters.
    #[must_use]
    pub fn line_column(&self, input: &[u8]) -> (usize, usize) {
        let end = self.offset.min(input.len());
        let prefix = &input[..end];
        let line = 1 + prefix.iter().filter(|&&b| b == b'\n').count();
        let column = match prefix.iter().rposition(|&b| b == b'\n') {
            Some(nl) => end - nl,
            None => end + 1,
        };
        (line, column)
    }
}

/// The kinds of lexical error the tokenizer reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A byte that cannot start the token expected at this position.
    #[error("unexpected character {found:?}, expected {expected}")]
    UnexpectedCharacter {
        /// The offending character (U+FFFD for invalid UTF-8).
        found: char,
        /// What the tokenizer was looking for.
        expected: &'static str,
    },
    /// Input ended where a token was still required.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput {
        /// What the tokenizer was looking for.
        expected: &'static str,
    },
    /// A string literal without its closing quote.
    #[error("unterminated string")]
    UnterminatedString,
    /// A backslash followed by a character JSON does not allow.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    /// `\u` not followed by four hex digits.
    #[error("invalid unicode escape sequence, expected four hex digits")]
    InvalidUnicodeEscape,
    /// A raw control byte (below 0x20) inside a string literal.
    #[error("unescaped control character 0x{0:02X} in string")]
    ControlCharacterInString(u8),
    /// A number that does not follow the JSON number grammar.
    #[error("malformed number, expected {expected}")]
    MalformedNumber {
        /// The part of the number grammar that was missing.
        expected: &'static str,
    },
    /// A closing bracket that does not match the innermost open container.
    #[error("unbalanced bracket {found:?}, expected {expected:?}")]
    UnbalancedBracket {
        /// The closing bracket found.
        found: char,
        /// The closing bracket the open container needs.
        expected: char,
    },
    /// Input ended with containers still open.
    #[error("unexpected end of input, expected {expected:?} to close depth {depth}")]
    UnclosedBracket {
        /// Closing bracket of the innermost open container.
        expected: char,
        /// Number of containers still open.
        depth: usize,
    },
    /// Containers nested deeper than [`TokenizerOptions::max_depth`](crate::TokenizerOptions::max_depth).
    #[error("nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
}

/// The error side of [`Tokenizer::parse`](crate::Tokenizer::parse): the lexical
/// error plus every token emitted before it.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct TokenizeError<'t, 'src> {
    /// The first lexical error encountered.
    pub error: LexError,
    /// Tokens accumulated up to the failure point.
    pub partial: TokenStream<'t, 'src>,
}

impl TokenizeError<'_, '_> {
    /// Drops the partial tokens and keeps only the positioned error.
    #[must_use]
    pub fn into_lex_error(self) -> LexError {
        self.error
    }
}

/// Failure to materialize a raw string span into text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StringError {
    /// The unescaped bytes are not UTF-8; the offset is relative to the span.
    #[error("string is not valid UTF-8 at byte {0}")]
    InvalidUtf8(usize),
    /// A malformed escape; the offset is relative to the span.
    #[error("invalid escape sequence at byte {0}")]
    InvalidEscape(usize),
    /// A `\u` escape naming half of a surrogate pair without its partner.
    #[error("unpaired surrogate \\u{code:04X} at byte {offset}")]
    LoneSurrogate {
        /// The surrogate code unit.
        code: u32,
        /// Offset of the escape, relative to the span.
        offset: usize,
    },
}

/// Failure to build a [`Value`](crate::Value) tree from a token stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// There were no tokens to decode.
    #[error("empty token stream")]
    Empty,
    /// A token that cannot appear at this point of a value.
    #[error("unexpected {kind:?} token at index {index}")]
    UnexpectedToken {
        /// Kind of the offending token.
        kind: TokenKind,
        /// Its index in the stream.
        index: usize,
    },
    /// The stream stopped before every container was closed.
    #[error("token stream ended inside a container")]
    UnexpectedEnd,
    /// More tokens followed the first complete value.
    #[error("trailing tokens after the root value at index {0}")]
    TrailingTokens(usize),
    /// Containers nested deeper than [`Value::MAX_DEPTH`](crate::Value::MAX_DEPTH).
    #[error("nesting too deep to decode at index {index}")]
    DepthLimitExceeded {
        /// Index of the opening token one level too deep.
        index: usize,
    },
}

/// Any failure surfaced by the decode layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input is not well-formed JSON.
    #[error("syntax error: {0}")]
    Lex(#[from] LexError),
    /// The tokens do not form a single value.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// A string could not be materialized.
    #[error("string error: {0}")]
    String(#[from] StringError),
}

impl<'t, 'src> From<TokenizeError<'t, 'src>> for Error {
    fn from(err: TokenizeError<'t, 'src>) -> Self {
        Error::Lex(err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_counts_newlines() {
        let input = b"{\n  \"a\": x\n}";
        let err = LexError::new(
            SyntaxError::UnexpectedCharacter {
                found: 'x',
                expected: "a value",
            },
            9,
        );
        assert_eq!(err.line_column(input), (2, 8));
    }

    #[test]
    fn line_column_first_line() {
        let err = LexError::new(SyntaxError::UnterminatedString, 3);
        assert_eq!(err.line_column(b"[1,\"abc"), (1, 4));
    }

    #[test]
    fn display_includes_offset_and_expectation() {
        let err = LexError::new(
            SyntaxError::UnexpectedCharacter {
                found: '}',
                expected: "a value",
            },
            5,
        );
        assert_eq!(
            alloc::string::ToString::to_string(&err),
            "unexpected character '}', expected a value at byte 5"
        );
    }
}
