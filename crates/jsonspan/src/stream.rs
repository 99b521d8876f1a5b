//! Read access to a tokenizer's output.

use core::{fmt, iter::FusedIterator, ops::Range, slice};

use bstr::BStr;

use crate::{
    raw::{RawNumber, RawStr},
    shape::ArrayShapeInfo,
    token::{Token, TokenKind},
};

/// The tokens of one parse, together with the input they point into.
///
/// A stream borrows the tokenizer's buffer for `'t` and the input for
/// `'src`. Lexemes resolved through it ([`lexeme`](Self::lexeme),
/// [`raw_str`](Self::raw_str), [`raw_number`](Self::raw_number)) carry only
/// `'src`, so they stay usable after the tokenizer is reused.
///
/// Sub-streams returned by [`elements`](Self::elements) and
/// [`field`](Self::field) are windows onto the same buffer; they keep the
/// shape of the parse that produced them.
#[derive(Clone, Copy)]
pub struct TokenStream<'t, 'src> {
    tokens: &'t [Token],
    input: &'src [u8],
    shape: ArrayShapeInfo,
}

impl<'t, 'src> TokenStream<'t, 'src> {
    pub(crate) fn new(tokens: &'t [Token], input: &'src [u8], shape: ArrayShapeInfo) -> Self {
        Self {
            tokens,
            input,
            shape,
        }
    }

    fn window(&self, range: Range<usize>) -> Self {
        Self::new(&self.tokens[range], self.input, self.shape)
    }

    /// The tokens, in input order.
    #[must_use]
    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    /// The whole input the tokens refer to.
    #[must_use]
    pub fn input(&self) -> &'src [u8] {
        self.input
    }

    /// The shape detected before tokenizing.
    #[must_use]
    pub fn shape(&self) -> ArrayShapeInfo {
        self.shape
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterates over the tokens.
    pub fn iter(&self) -> slice::Iter<'t, Token> {
        self.tokens.iter()
    }

    /// The token at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'t Token> {
        self.tokens.get(index)
    }

    /// The input bytes covered by `token`. Tokens from another input resolve
    /// to an empty slice when out of range.
    #[must_use]
    pub fn lexeme(&self, token: &Token) -> &'src [u8] {
        self.input.get(token.span()).unwrap_or_default()
    }

    /// The raw content of a `Key` or `StringValue` token.
    #[must_use]
    pub fn raw_str(&self, token: &Token) -> Option<RawStr<'src>> {
        matches!(token.kind, TokenKind::Key | TokenKind::StringValue)
            .then(|| RawStr::new(self.lexeme(token)))
    }

    /// The source text of a `NumberValue` token.
    #[must_use]
    pub fn raw_number(&self, token: &Token) -> Option<RawNumber<'src>> {
        if token.kind != TokenKind::NumberValue {
            return None;
        }
        // The number grammar only admits ASCII.
        core::str::from_utf8(self.lexeme(token))
            .ok()
            .map(RawNumber::new)
    }

    /// The first token as a number, if it is one.
    #[must_use]
    pub fn first_number(&self) -> Option<RawNumber<'src>> {
        self.tokens.first().and_then(|t| self.raw_number(t))
    }

    /// The first token as a string, if it is one.
    #[must_use]
    pub fn first_str(&self) -> Option<RawStr<'src>> {
        self.tokens.first().and_then(|t| self.raw_str(t))
    }

    /// Index one past the last token of the value starting at `index`.
    ///
    /// Returns `None` if no value starts there or the value is not closed
    /// within this stream.
    #[must_use]
    pub fn value_end(&self, index: usize) -> Option<usize> {
        let start = self.tokens.get(index)?;
        if start.kind.is_scalar() {
            return Some(index + 1);
        }
        if !start.kind.is_open() {
            return None;
        }
        self.tokens[index + 1..]
            .iter()
            .position(|t| t.depth == start.depth && t.kind.is_close())
            .map(|offset| index + 1 + offset + 1)
    }

    /// Iterates over the elements of the array this stream starts with, each
    /// as its own sub-stream. Empty when the stream does not start with `[`.
    ///
    /// ```rust
    /// use jsonspan::Tokenizer;
    ///
    /// let mut tokenizer = Tokenizer::default();
    /// let stream = tokenizer.parse(br#"[1,{"a":[2]},"x"]"#).unwrap();
    /// let sizes: Vec<_> = stream.elements().map(|e| e.len()).collect();
    /// assert_eq!(sizes, [1, 7, 1]);
    /// ```
    #[must_use]
    pub fn elements(&self) -> Elements<'t, 'src> {
        let next = match self.tokens.first() {
            Some(t) if t.kind == TokenKind::ArrayOpen => 1,
            _ => self.tokens.len(),
        };
        Elements { stream: *self, next }
    }

    /// The value of member `key` of the object this stream starts with.
    ///
    /// Keys are compared after unescaping. With duplicate keys the first one
    /// wins.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<TokenStream<'t, 'src>> {
        let open = self.tokens.first()?;
        if open.kind != TokenKind::ObjectOpen {
            return None;
        }
        let mut index = 1;
        loop {
            let name = self.tokens.get(index)?;
            if name.kind != TokenKind::Key {
                return None;
            }
            // Skip the colon.
            let value = index + 2;
            let end = self.value_end(value)?;
            if self.raw_str(name).is_some_and(|raw| raw.eq_str(key)) {
                return Some(self.window(value..end));
            }
            match self.tokens.get(end) {
                Some(t) if t.kind == TokenKind::Comma => index = end + 1,
                _ => return None,
            }
        }
    }
}

impl fmt::Debug for TokenStream<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("shape", &self.shape)
            .field("tokens", &Lexemes(self))
            .finish()
    }
}

/// Debug view listing each token as `Kind@depth "lexeme"`.
struct Lexemes<'a, 't, 'src>(&'a TokenStream<'t, 'src>);

impl fmt::Debug for Lexemes<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entry<'a>(&'a Token, &'a [u8]);

        impl fmt::Debug for Entry<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}@{} {:?}", self.0.kind, self.0.depth, BStr::new(self.1))
            }
        }

        f.debug_list()
            .entries(self.0.iter().map(|t| Entry(t, self.0.lexeme(t))))
            .finish()
    }
}

impl<'t> IntoIterator for &TokenStream<'t, '_> {
    type Item = &'t Token;
    type IntoIter = slice::Iter<'t, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a top-level array.
///
/// Created by [`TokenStream::elements`].
#[derive(Debug, Clone)]
pub struct Elements<'t, 'src> {
    stream: TokenStream<'t, 'src>,
    next: usize,
}

impl<'t, 'src> Iterator for Elements<'t, 'src> {
    type Item = TokenStream<'t, 'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next;
        let end = self.stream.value_end(start);
        let Some(end) = end else {
            self.next = self.stream.len();
            return None;
        };
        self.next = match self.stream.get(end) {
            Some(t) if t.kind == TokenKind::Comma => end + 1,
            _ => self.stream.len(),
        };
        Some(self.stream.window(start..end))
    }
}

impl FusedIterator for Elements<'_, '_> {}
