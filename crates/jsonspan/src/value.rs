//! A borrowed value tree decoded from a token stream.
//!
//! [`Value`] is the convenience layer on top of the tokenizer: strings and
//! numbers stay as [`RawStr`] / [`RawNumber`] spans into the input, so
//! building the tree allocates only the `Vec`s of arrays and objects. Its
//! `Display` writes compact JSON that reproduces each scalar exactly as it was
//! written.

use alloc::vec::Vec;
use core::fmt;

use crate::{
    error::{DecodeError, Error},
    raw::{RawNumber, RawStr},
    stream::TokenStream,
    token::{Token, TokenKind},
    tokenizer::Tokenizer,
};

/// A JSON value whose scalars borrow from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'src> {
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// A number, as written.
    Number(RawNumber<'src>),
    /// A string, escapes still in place.
    String(RawStr<'src>),
    /// An array.
    Array(Vec<Value<'src>>),
    /// An object. Members keep input order; duplicate keys are kept.
    Object(Vec<(RawStr<'src>, Value<'src>)>),
}

/// Tokenizes `input` and decodes it into a [`Value`].
///
/// A fresh tokenizer is used for the call. Hot paths should hold on to a
/// [`Tokenizer`] (or a pool) and call [`Value::from_tokens`] instead.
///
/// # Errors
///
/// Returns [`Error::Lex`] for malformed input.
///
/// # Examples
///
/// ```rust
/// let value = jsonspan::parse_value(br#"{"a":[1,2.50,"x"]}"#).unwrap();
/// assert_eq!(value["a"][1].as_number().unwrap().as_str(), "2.50");
/// assert_eq!(value.to_string(), r#"{"a":[1,2.50,"x"]}"#);
/// ```
pub fn parse_value(input: &[u8]) -> Result<Value<'_>, Error> {
    let mut tokenizer = Tokenizer::default();
    let stream = tokenizer.parse(input)?;
    Ok(Value::from_tokens(&stream)?)
}

impl<'src> Value<'src> {
    /// Deepest container nesting [`from_tokens`](Self::from_tokens) builds.
    /// The decoder recurses once per level, so this bounds its stack use
    /// independently of [`TokenizerOptions::max_depth`](crate::TokenizerOptions::max_depth).
    pub const MAX_DEPTH: usize = 512;

    /// Builds the value spanned by `stream`, which must hold exactly one
    /// complete value.
    ///
    /// # Errors
    ///
    /// Fails on an empty stream, a partial stream, trailing tokens, or
    /// nesting deeper than [`MAX_DEPTH`](Self::MAX_DEPTH).
    pub fn from_tokens(stream: &TokenStream<'_, 'src>) -> Result<Self, DecodeError> {
        if stream.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut decoder = Decoder {
            stream,
            pos: 0,
            depth: 0,
        };
        let value = decoder.value()?;
        if decoder.pos != stream.len() {
            return Err(DecodeError::TrailingTokens(decoder.pos));
        }
        Ok(value)
    }

    /// Returns `true` for `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one.
    #[must_use]
    pub fn as_number(&self) -> Option<RawNumber<'src>> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The raw string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<RawStr<'src>> {
        match self {
            Self::String(s) => Some(*s),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value<'src>]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The members, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&[(RawStr<'src>, Value<'src>)]> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    /// The first member named `key`, if this is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value<'src>> {
        self.as_object()?
            .iter()
            .find(|(name, _)| name.eq_str(key))
            .map(|(_, value)| value)
    }

    /// The element at `index`, if this is an array.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value<'src>> {
        self.as_array()?.get(index)
    }
}

static NULL: Value<'static> = Value::Null;

impl<'src> core::ops::Index<&str> for Value<'src> {
    type Output = Value<'src>;

    /// Like [`Value::get`], returning `Null` for anything missing.
    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'src> core::ops::Index<usize> for Value<'src> {
    type Output = Value<'src>;

    /// Like [`Value::get_index`], returning `Null` for anything missing.
    fn index(&self, index: usize) -> &Self::Output {
        self.get_index(index).unwrap_or(&NULL)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(members) => {
                f.write_str("{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "\"{key}\":{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

struct Decoder<'a, 't, 'src> {
    stream: &'a TokenStream<'t, 'src>,
    pos: usize,
    depth: usize,
}

impl<'src> Decoder<'_, '_, 'src> {
    fn next(&mut self) -> Result<(usize, Token), DecodeError> {
        let index = self.pos;
        let token = *self.stream.get(index).ok_or(DecodeError::UnexpectedEnd)?;
        self.pos += 1;
        Ok((index, token))
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.stream.get(self.pos).map(|t| t.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), DecodeError> {
        let (index, token) = self.next()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedToken {
                kind: token.kind,
                index,
            })
        }
    }

    fn value(&mut self) -> Result<Value<'src>, DecodeError> {
        let (index, token) = self.next()?;
        let unexpected = DecodeError::UnexpectedToken {
            kind: token.kind,
            index,
        };
        match token.kind {
            TokenKind::Null => Ok(Value::Null),
            TokenKind::True => Ok(Value::Bool(true)),
            TokenKind::False => Ok(Value::Bool(false)),
            TokenKind::NumberValue => self
                .stream
                .raw_number(&token)
                .map(Value::Number)
                .ok_or(unexpected),
            TokenKind::StringValue => self
                .stream
                .raw_str(&token)
                .map(Value::String)
                .ok_or(unexpected),
            TokenKind::ArrayOpen => self.nested(index, Self::array).map(Value::Array),
            TokenKind::ObjectOpen => self.nested(index, Self::object).map(Value::Object),
            _ => Err(unexpected),
        }
    }

    fn nested<T>(
        &mut self,
        index: usize,
        body: fn(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if self.depth >= Value::MAX_DEPTH {
            return Err(DecodeError::DepthLimitExceeded { index });
        }
        self.depth += 1;
        let out = body(self);
        self.depth -= 1;
        out
    }

    fn array(&mut self) -> Result<Vec<Value<'src>>, DecodeError> {
        let mut items = Vec::new();
        if self.peek_kind() == Some(TokenKind::ArrayClose) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.value()?);
            let (index, token) = self.next()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::ArrayClose => return Ok(items),
                kind => return Err(DecodeError::UnexpectedToken { kind, index }),
            }
        }
    }

    fn object(&mut self) -> Result<Vec<(RawStr<'src>, Value<'src>)>, DecodeError> {
        let mut members = Vec::new();
        if self.peek_kind() == Some(TokenKind::ObjectClose) {
            self.pos += 1;
            return Ok(members);
        }
        loop {
            let (index, token) = self.next()?;
            let key = match token.kind {
                TokenKind::Key => self.stream.raw_str(&token),
                _ => None,
            }
            .ok_or(DecodeError::UnexpectedToken {
                kind: token.kind,
                index,
            })?;
            self.expect(TokenKind::Colon)?;
            members.push((key, self.value()?));
            let (index, token) = self.next()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::ObjectClose => return Ok(members),
                kind => return Err(DecodeError::UnexpectedToken { kind, index }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use rstest::rstest;

    use super::*;
    use crate::{Error, TokenizerOptions};

    #[test]
    fn decodes_nested_structures() {
        let value = parse_value(br#"{"a":{"b":[null,true,false]},"c":"d"}"#).unwrap();
        assert!(value["a"]["b"][0].is_null());
        assert_eq!(value["a"]["b"][1].as_bool(), Some(true));
        assert_eq!(value["c"].as_str().unwrap().as_bytes(), b"d");
        assert!(value["missing"][3].is_null());
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_keys_keep_order_and_first_wins() {
        let value = parse_value(br#"{"k":1,"k":2}"#).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 2);
        assert_eq!(value["k"].as_number().unwrap().as_i64(), Some(1));
    }

    #[rstest]
    #[case(br#"{"a":[1,2.50,-0.0,1E+400],"b":{},"c":[],"s":"x\u00e9\n"}"#)]
    #[case(b"[]")]
    #[case(b"\"only\"")]
    #[case(b"12345678901234567890123")]
    fn display_reproduces_compact_input(#[case] input: &[u8]) {
        let value = parse_value(input).unwrap();
        assert_eq!(value.to_string().as_bytes(), input);
    }

    #[test]
    fn display_compacts_whitespace() {
        let value = parse_value(b" { \"a\" : [ 1 , true ] } ").unwrap();
        assert_eq!(value.to_string(), r#"{"a":[1,true]}"#);
    }

    #[test]
    fn syntax_errors_surface_as_lex_errors() {
        let err = parse_value(br#"{"a":}"#).unwrap_err();
        let Error::Lex(lex) = err else {
            panic!("expected a lex error, got {err:?}");
        };
        assert_eq!(lex.offset, 5);
    }

    #[test]
    fn from_tokens_rejects_partial_and_multiple_values() {
        let mut tokenizer = Tokenizer::default();
        let err = tokenizer.parse(b"[1,2,").unwrap_err();
        assert_eq!(
            Value::from_tokens(&err.partial),
            Err(DecodeError::UnexpectedEnd)
        );

        let mut lenient = Tokenizer::new(TokenizerOptions {
            allow_multiple_values: true,
            ..Default::default()
        });
        let stream = lenient.parse(b"1 2").unwrap();
        assert_eq!(
            Value::from_tokens(&stream),
            Err(DecodeError::TrailingTokens(1))
        );
    }

    #[test]
    fn from_tokens_on_element_windows() {
        let mut tokenizer = Tokenizer::default();
        let stream = tokenizer.parse(br#"[{"id":1},{"id":2}]"#).unwrap();
        let values: Vec<_> = stream
            .elements()
            .map(|e| Value::from_tokens(&e).unwrap().to_string())
            .collect();
        assert_eq!(values, [r#"{"id":1}"#, r#"{"id":2}"#]);
    }

    #[test]
    fn nesting_past_the_decoder_limit_is_an_error() {
        let depth = Value::MAX_DEPTH + 1;
        let mut input = "[".repeat(depth);
        input.push_str(&"]".repeat(depth));
        let mut tokenizer = Tokenizer::new(TokenizerOptions {
            max_depth: depth,
            ..Default::default()
        });
        let stream = tokenizer.parse(input.as_bytes()).unwrap();
        assert_eq!(
            Value::from_tokens(&stream),
            Err(DecodeError::DepthLimitExceeded {
                index: Value::MAX_DEPTH
            })
        );

        let stream = tokenizer.parse(&input.as_bytes()[1..depth * 2 - 1]).unwrap();
        assert!(Value::from_tokens(&stream).is_ok());
    }

    #[test]
    fn empty_stream_is_an_error() {
        let mut tokenizer = Tokenizer::default();
        let err = tokenizer.parse(b"").unwrap_err();
        assert_eq!(Value::from_tokens(&err.partial), Err(DecodeError::Empty));
    }
}
