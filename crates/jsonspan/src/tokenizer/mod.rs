//! The single-pass tokenizer.
//!
//! A [`Tokenizer`] turns a complete input buffer into a flat list of
//! [`Token`]s in one forward scan:
//!
//! - Structural bytes (`{ } [ ] , :`) become one-byte tokens.
//! - Strings are scanned to their closing quote and recorded as a span that
//!   excludes the quotes. Escapes are validated but left in place; decoding is
//!   the job of [`RawStr::decode`](crate::RawStr::decode).
//! - Numbers are scanned to the end of the JSON number grammar and recorded as
//!   a span. They are never converted here.
//! - Keyword literals are chosen by their first byte and then matched in full.
//!
//! The scanner tracks what may come next (a key, a value, a separator) and a
//! stack of open containers. That is what tells a `Key` apart from a
//! `StringValue`, rejects trailing commas, and catches mismatched brackets.
//!
//! Buffer sizing
//! -------------
//! Before scanning, the shape detector runs over the input. For a large array
//! the token buffer is reserved once for the estimated token count plus a
//! headroom percentage, capped by the input length (a token always consumes at
//! least one byte). Other inputs get
//! [`initial_capacity`](crate::TokenizerOptions::initial_capacity). The buffer
//! is cleared, never shrunk, between parses, so a reused tokenizer stops
//! allocating once it has seen its largest input.

mod literal;

use alloc::vec::Vec;

use bstr::ByteSlice;

use self::literal::Literal;
use crate::{
    error::{LexError, SyntaxError, TokenizeError},
    escape_buffer::hex4,
    options::TokenizerOptions,
    shape::{ArrayShapeInfo, detect_shape, skip_whitespace},
    stream::TokenStream,
    token::{Token, TokenKind},
};

/// A reusable JSON tokenizer.
///
/// Each call to [`parse`](Self::parse) clears the previous result and keeps
/// the allocation. The returned [`TokenStream`] borrows both the tokenizer and
/// the input, so the tokenizer cannot be reused while a stream is alive.
///
/// `Tokenizer` is not `Clone`, so an instance leased from a
/// [`TokenizerPool`](crate::TokenizerPool) can only be returned once.
///
/// # Examples
///
/// ```rust
/// use jsonspan::{TokenKind, Tokenizer};
///
/// let mut tokenizer = Tokenizer::default();
/// let stream = tokenizer.parse(br#"{"a":[true,null]}"#).unwrap();
/// let kinds: Vec<_> = stream.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     [
///         TokenKind::ObjectOpen,
///         TokenKind::Key,
///         TokenKind::Colon,
///         TokenKind::ArrayOpen,
///         TokenKind::True,
///         TokenKind::Comma,
///         TokenKind::Null,
///         TokenKind::ArrayClose,
///         TokenKind::ObjectClose,
///     ]
/// );
/// ```
#[derive(Debug, Default)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    containers: Vec<Container>,
    shape: Option<ArrayShapeInfo>,
    options: TokenizerOptions,
    /// Id of the pool this instance is currently checked out from.
    #[cfg(feature = "std")]
    pub(crate) lease: Option<u64>,
}

impl Tokenizer {
    /// Creates a tokenizer. No memory is reserved until the first parse.
    #[must_use]
    pub fn new(options: TokenizerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The options this tokenizer was created with.
    #[must_use]
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Tokenizes `input`.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error, positioned at a byte offset, together
    /// with the tokens emitted before it.
    pub fn parse<'t, 'src>(
        &'t mut self,
        input: &'src [u8],
    ) -> Result<TokenStream<'t, 'src>, TokenizeError<'t, 'src>> {
        self.reset();
        let shape = if self.options.detect_shape {
            detect_shape(input, &self.options.shape)
        } else {
            ArrayShapeInfo::NOT_LARGE
        };
        self.reserve_for(&shape, input.len());
        self.shape = Some(shape);

        let result = Scanner {
            input,
            pos: 0,
            expect: Expect::Root,
            tokens: &mut self.tokens,
            containers: &mut self.containers,
            options: &self.options,
        }
        .run();

        let stream = TokenStream::new(&self.tokens, input, shape);
        match result {
            Ok(()) => Ok(stream),
            Err(error) => Err(TokenizeError {
                error,
                partial: stream,
            }),
        }
    }

    /// Clears the tokens of the previous parse. Capacity is kept.
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.containers.clear();
        self.shape = None;
    }

    /// Tokens of the most recent parse, complete or partial.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The shape detected by the most recent parse, if any.
    #[must_use]
    pub fn last_shape(&self) -> Option<ArrayShapeInfo> {
        self.shape
    }

    /// Number of tokens the buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tokens.capacity()
    }

    fn reserve_for(&mut self, shape: &ArrayShapeInfo, input_len: usize) {
        let wanted = if shape.is_large_array {
            let estimate = shape.estimated_tokens();
            let headroom = estimate.saturating_mul(self.options.presize_headroom_percent) / 100;
            estimate
                .saturating_add(headroom)
                .min(input_len.max(self.options.initial_capacity))
        } else {
            self.options.initial_capacity
        };
        if self.tokens.capacity() < wanted {
            log::trace!(
                "reserving {wanted} tokens (had {}, ~{} elements)",
                self.tokens.capacity(),
                shape.estimated_elements
            );
            self.tokens.reserve_exact(wanted);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn close(self) -> u8 {
        match self {
            Self::Object => b'}',
            Self::Array => b']',
        }
    }

    fn close_kind(self) -> TokenKind {
        match self {
            Self::Object => TokenKind::ObjectClose,
            Self::Array => TokenKind::ArrayClose,
        }
    }
}

/// What the grammar allows at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Root,
    Value,
    ValueOrClose,
    Key,
    KeyOrClose,
    Colon,
    CommaOrClose,
    End,
}

/// The character starting at `pos`, for error messages.
fn char_at(input: &[u8], pos: usize) -> char {
    bstr::decode_utf8(&input[pos..])
        .0
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn malformed(expected: &'static str, offset: usize) -> LexError {
    LexError::new(SyntaxError::MalformedNumber { expected }, offset)
}

struct Scanner<'a, 'src> {
    input: &'src [u8],
    pos: usize,
    expect: Expect,
    tokens: &'a mut Vec<Token>,
    containers: &'a mut Vec<Container>,
    options: &'a TokenizerOptions,
}

impl Scanner<'_, '_> {
    fn run(&mut self) -> Result<(), LexError> {
        loop {
            self.pos = skip_whitespace(self.input, self.pos);
            let Some(&byte) = self.input.get(self.pos) else {
                return self.finish();
            };
            match byte {
                b'{' => self.open(Container::Object)?,
                b'[' => self.open(Container::Array)?,
                b'}' | b']' => self.close(byte)?,
                b',' => self.comma()?,
                b':' => self.colon()?,
                b'"' => self.string()?,
                b'-' | b'0'..=b'9' => self.number()?,
                _ => match Literal::from_first(byte) {
                    Some(literal) => self.literal(literal)?,
                    None => return Err(self.unexpected()),
                },
            }
        }
    }

    fn depth(&self) -> u32 {
        u32::try_from(self.containers.len()).unwrap_or(u32::MAX)
    }

    #[inline]
    fn emit(&mut self, kind: TokenKind, offset: usize, len: usize) {
        let depth = self.depth();
        self.tokens.push(Token::new(kind, depth, offset, len));
    }

    fn unexpected(&self) -> LexError {
        LexError::new(
            SyntaxError::UnexpectedCharacter {
                found: char_at(self.input, self.pos),
                expected: self.describe_expected(),
            },
            self.pos,
        )
    }

    fn describe_expected(&self) -> &'static str {
        match self.expect {
            Expect::Root | Expect::Value => "a value",
            Expect::ValueOrClose => "a value or ']'",
            Expect::Key => "a string key",
            Expect::KeyOrClose => "a string key or '}'",
            Expect::Colon => "':'",
            Expect::CommaOrClose => match self.containers.last() {
                Some(Container::Object) => "',' or '}'",
                _ => "',' or ']'",
            },
            Expect::End => "end of input",
        }
    }

    /// Checks that a value may start here.
    fn begin_value(&self) -> Result<(), LexError> {
        match self.expect {
            Expect::Root | Expect::Value | Expect::ValueOrClose => Ok(()),
            Expect::End if self.options.allow_multiple_values => Ok(()),
            _ => Err(self.unexpected()),
        }
    }

    fn end_value(&mut self) {
        self.expect = if self.containers.is_empty() {
            Expect::End
        } else {
            Expect::CommaOrClose
        };
    }

    fn open(&mut self, container: Container) -> Result<(), LexError> {
        self.begin_value()?;
        if self.containers.len() >= self.options.max_depth {
            return Err(LexError::new(
                SyntaxError::DepthLimitExceeded(self.options.max_depth),
                self.pos,
            ));
        }
        let (kind, expect) = match container {
            Container::Object => (TokenKind::ObjectOpen, Expect::KeyOrClose),
            Container::Array => (TokenKind::ArrayOpen, Expect::ValueOrClose),
        };
        self.emit(kind, self.pos, 1);
        self.containers.push(container);
        self.expect = expect;
        self.pos += 1;
        Ok(())
    }

    fn close(&mut self, byte: u8) -> Result<(), LexError> {
        let Some(&top) = self.containers.last() else {
            return Err(self.unexpected());
        };
        if !matches!(
            self.expect,
            Expect::KeyOrClose | Expect::ValueOrClose | Expect::CommaOrClose
        ) {
            return Err(self.unexpected());
        }
        if byte != top.close() {
            return Err(LexError::new(
                SyntaxError::UnbalancedBracket {
                    found: char::from(byte),
                    expected: char::from(top.close()),
                },
                self.pos,
            ));
        }
        self.containers.pop();
        self.emit(top.close_kind(), self.pos, 1);
        self.pos += 1;
        self.end_value();
        Ok(())
    }

    fn comma(&mut self) -> Result<(), LexError> {
        if self.expect != Expect::CommaOrClose {
            return Err(self.unexpected());
        }
        self.emit(TokenKind::Comma, self.pos, 1);
        self.pos += 1;
        self.expect = match self.containers.last() {
            Some(Container::Object) => Expect::Key,
            _ => Expect::Value,
        };
        Ok(())
    }

    fn colon(&mut self) -> Result<(), LexError> {
        if self.expect != Expect::Colon {
            return Err(self.unexpected());
        }
        self.emit(TokenKind::Colon, self.pos, 1);
        self.pos += 1;
        self.expect = Expect::Value;
        Ok(())
    }

    fn string(&mut self) -> Result<(), LexError> {
        let is_key = matches!(self.expect, Expect::Key | Expect::KeyOrClose);
        if !is_key {
            self.begin_value()?;
        }
        let quote = self.pos;
        let close = self.scan_string(quote)?;
        let kind = if is_key {
            TokenKind::Key
        } else {
            TokenKind::StringValue
        };
        self.emit(kind, quote + 1, close - quote - 1);
        self.pos = close + 1;
        if is_key {
            self.expect = Expect::Colon;
        } else {
            self.end_value();
        }
        Ok(())
    }

    /// Returns the position of the closing quote of the string opened at
    /// `quote`.
    fn scan_string(&self, quote: usize) -> Result<usize, LexError> {
        let mut pos = quote + 1;
        loop {
            let rest = &self.input[pos..];
            let run = rest
                .find_byteset(b"\"\\")
                .ok_or_else(|| LexError::new(SyntaxError::UnterminatedString, quote))?;
            if let Some(i) = rest[..run].iter().position(|&b| b < 0x20) {
                return Err(LexError::new(SyntaxError::ControlCharacterInString(rest[i]), pos + i));
            }
            pos += run;
            if self.input[pos] == b'"' {
                return Ok(pos);
            }
            pos = self.scan_escape(quote, pos)?;
        }
    }

    /// Validates the escape whose backslash is at `backslash` and returns the
    /// position after it.
    fn scan_escape(&self, quote: usize, backslash: usize) -> Result<usize, LexError> {
        match self.input.get(backslash + 1) {
            None => Err(LexError::new(SyntaxError::UnterminatedString, quote)),
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => Ok(backslash + 2),
            Some(b'u') => {
                let digits = self.input.get(backslash + 2..backslash + 6);
                match digits.and_then(hex4) {
                    Some(_) => Ok(backslash + 6),
                    None => Err(LexError::new(SyntaxError::InvalidUnicodeEscape, backslash)),
                }
            }
            Some(_) => Err(LexError::new(
                SyntaxError::InvalidEscape(char_at(self.input, backslash + 1)),
                backslash,
            )),
        }
    }

    fn digits(&self, mut pos: usize) -> usize {
        while self.input.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        pos
    }

    fn number(&mut self) -> Result<(), LexError> {
        self.begin_value()?;
        let start = self.pos;
        let mut pos = start;
        if self.input[pos] == b'-' {
            pos += 1;
        }
        match self.input.get(pos) {
            Some(b'0') => {
                pos += 1;
                if self.input.get(pos).is_some_and(u8::is_ascii_digit) {
                    return Err(malformed("no digits after a leading zero", pos));
                }
            }
            Some(b'1'..=b'9') => pos = self.digits(pos),
            _ => return Err(malformed("a digit", pos)),
        }

        if self.input.get(pos) == Some(&b'.') {
            pos += 1;
            let end = self.digits(pos);
            if end == pos {
                return Err(malformed("a digit after the decimal point", pos));
            }
            pos = end;
        }

        if matches!(self.input.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            if matches!(self.input.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            let end = self.digits(pos);
            if end == pos {
                return Err(malformed("a digit in the exponent", pos));
            }
            pos = end;
        }

        self.emit(TokenKind::NumberValue, start, pos - start);
        self.pos = pos;
        self.end_value();
        Ok(())
    }

    fn literal(&mut self, literal: Literal) -> Result<(), LexError> {
        self.begin_value()?;
        let rest = &self.input[self.pos..];
        match literal.match_prefix(rest) {
            Ok(len) => {
                self.emit(literal.kind(), self.pos, len);
                self.pos += len;
                self.end_value();
                Ok(())
            }
            Err(matched) if matched == rest.len() => Err(LexError::new(
                SyntaxError::UnexpectedEndOfInput {
                    expected: literal.expected(),
                },
                self.input.len(),
            )),
            Err(matched) => {
                let at = self.pos + matched;
                Err(LexError::new(
                    SyntaxError::UnexpectedCharacter {
                        found: char_at(self.input, at),
                        expected: literal.expected(),
                    },
                    at,
                ))
            }
        }
    }

    fn finish(&self) -> Result<(), LexError> {
        match (self.expect, self.containers.last()) {
            (Expect::End, _) => Ok(()),
            (_, Some(&top)) => Err(LexError::new(
                SyntaxError::UnclosedBracket {
                    expected: char::from(top.close()),
                    depth: self.containers.len(),
                },
                self.input.len(),
            )),
            (_, None) => Err(LexError::new(
                SyntaxError::UnexpectedEndOfInput {
                    expected: self.describe_expected(),
                },
                self.input.len(),
            )),
        }
    }
}
