use crate::token::TokenKind;

/// The three keyword literals, chosen by their first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Literal {
    Null,
    True,
    False,
}

impl Literal {
    /// One byte of lookahead is enough to know which literal must follow.
    pub fn from_first(byte: u8) -> Option<Self> {
        match byte {
            b'n' => Some(Self::Null),
            b't' => Some(Self::True),
            b'f' => Some(Self::False),
            _ => None,
        }
    }

    pub fn bytes(self) -> &'static [u8] {
        match self {
            Self::Null => b"null",
            Self::True => b"true",
            Self::False => b"false",
        }
    }

    pub fn kind(self) -> TokenKind {
        match self {
            Self::Null => TokenKind::Null,
            Self::True => TokenKind::True,
            Self::False => TokenKind::False,
        }
    }

    pub fn expected(self) -> &'static str {
        match self {
            Self::Null => "`null`",
            Self::True => "`true`",
            Self::False => "`false`",
        }
    }

    /// Matches the literal at the start of `rest`.
    ///
    /// `Ok(len)` on a full match; `Err(n)` with the number of bytes that did
    /// match otherwise.
    pub fn match_prefix(self, rest: &[u8]) -> Result<usize, usize> {
        let word = self.bytes();
        let matched = rest
            .iter()
            .zip(word)
            .take_while(|(have, want)| have == want)
            .count();
        if matched == word.len() {
            Ok(matched)
        } else {
            Err(matched)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Literal;

    #[test]
    fn first_byte_selects_literal() {
        assert_eq!(Literal::from_first(b't'), Some(Literal::True));
        assert_eq!(Literal::from_first(b'f'), Some(Literal::False));
        assert_eq!(Literal::from_first(b'n'), Some(Literal::Null));
        assert_eq!(Literal::from_first(b'x'), None);
    }

    #[test]
    fn match_prefix_reports_partial_matches() {
        assert_eq!(Literal::True.match_prefix(b"true,"), Ok(4));
        assert_eq!(Literal::True.match_prefix(b"trUe"), Err(2));
        assert_eq!(Literal::False.match_prefix(b"fal"), Err(3));
        assert_eq!(Literal::Null.match_prefix(b"nul"), Err(3));
    }
}
