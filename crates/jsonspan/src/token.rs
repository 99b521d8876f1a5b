use core::ops::Range;

/// The lexical category of a [`Token`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    /// `{`
    ObjectOpen,
    /// `}`
    ObjectClose,
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// An object member name. The span excludes the quotes.
    Key,
    /// A string in value position. The span excludes the quotes.
    StringValue,
    /// A number, kept as its source text.
    NumberValue,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `,`
    Comma,
    /// `:`
    Colon,
}

impl TokenKind {
    /// Returns `true` for tokens that start a value (scalars and openers).
    #[must_use]
    pub fn starts_value(self) -> bool {
        matches!(
            self,
            Self::ObjectOpen
                | Self::ArrayOpen
                | Self::StringValue
                | Self::NumberValue
                | Self::True
                | Self::False
                | Self::Null
        )
    }

    /// Returns `true` for complete scalar values.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::StringValue | Self::NumberValue | Self::True | Self::False | Self::Null
        )
    }

    /// Returns `true` for `{` and `[`.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::ObjectOpen | Self::ArrayOpen)
    }

    /// Returns `true` for `}` and `]`.
    #[must_use]
    pub fn is_close(self) -> bool {
        matches!(self, Self::ObjectClose | Self::ArrayClose)
    }
}

/// One lexical unit: a kind plus a span of the input it was read from.
///
/// Tokens hold offsets, not bytes. Resolve the lexeme through the
/// [`TokenStream`](crate::TokenStream) the token belongs to, which keeps the
/// input borrowed for as long as tokens are read from it.
///
/// `depth` is the number of containers enclosing the token. An opening
/// bracket reports the depth outside its own container, and so does its
/// matching close: in `[{"a":1}]` the array brackets are at depth 0, the
/// object braces at 1 and `"a"`, `:`, `1` at 2.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// Nesting depth at emission.
    pub depth: u32,
    /// Byte offset of the span in the input.
    pub offset: usize,
    /// Length of the span in bytes.
    pub len: usize,
}

impl Token {
    #[inline]
    pub(crate) fn new(kind: TokenKind, depth: u32, offset: usize, len: usize) -> Self {
        Self {
            kind,
            depth,
            offset,
            len,
        }
    }

    /// The byte range of this token's span.
    #[inline]
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Byte offset one past the end of the span.
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}
