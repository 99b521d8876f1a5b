//! Borrowed views of string and number lexemes.
//!
//! Both types point into the caller's input and carry its lifetime, so they
//! can outlive the tokenizer and its token buffer but never the input.
//! Materializing an owned value is explicit: [`RawStr::decode`] only copies
//! when the literal contains escapes.

use alloc::{borrow::Cow, string::String, vec::Vec};
use core::{fmt, str::FromStr};

use bstr::{BStr, ByteSlice};

use crate::{
    error::StringError,
    escape_buffer::{UnicodeEscapeBuffer, hex4},
};

/// The raw content of a string literal, escapes still in place.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawStr<'src> {
    bytes: &'src [u8],
}

impl<'src> RawStr<'src> {
    pub(crate) fn new(bytes: &'src [u8]) -> Self {
        Self { bytes }
    }

    /// The bytes between the quotes, exactly as they appear in the input.
    #[must_use]
    pub fn as_bytes(&self) -> &'src [u8] {
        self.bytes
    }

    /// Returns `true` if the literal contains at least one escape sequence.
    #[must_use]
    pub fn has_escapes(&self) -> bool {
        self.bytes.find_byte(b'\\').is_some()
    }

    /// Returns the string value, borrowing from the input when there is
    /// nothing to unescape.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not UTF-8, an escape is malformed, or a `\u`
    /// escape leaves a surrogate unpaired.
    pub fn decode(&self) -> Result<Cow<'src, str>, StringError> {
        let text = core::str::from_utf8(self.bytes)
            .map_err(|e| StringError::InvalidUtf8(e.valid_up_to()))?;
        if self.has_escapes() {
            unescape(self.bytes).map(Cow::Owned)
        } else {
            Ok(Cow::Borrowed(text))
        }
    }

    /// Compares the decoded value with `other` without allocating when the
    /// literal has no escapes. Undecodable literals compare unequal.
    #[must_use]
    pub fn eq_str(&self, other: &str) -> bool {
        if self.has_escapes() {
            self.decode().is_ok_and(|s| s == other)
        } else {
            self.bytes == other.as_bytes()
        }
    }
}

impl fmt::Debug for RawStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawStr({:?})", BStr::new(self.bytes))
    }
}

impl fmt::Display for RawStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(BStr::new(self.bytes), f)
    }
}

fn lone_surrogate(code: u32, offset: usize) -> StringError {
    StringError::LoneSurrogate { code, offset }
}

fn unescape(bytes: &[u8]) -> Result<String, StringError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut surrogates = UnicodeEscapeBuffer::new();
    // Offset of the escape holding a pending high surrogate.
    let mut pending_at = 0;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        let literal = rest.find_byte(b'\\').unwrap_or(rest.len());
        if literal > 0 {
            surrogates
                .finish()
                .map_err(|code| lone_surrogate(code, pending_at))?;
            out.extend_from_slice(&rest[..literal]);
            i += literal;
            continue;
        }

        let escape = *rest.get(1).ok_or(StringError::InvalidEscape(i))?;
        if escape == b'u' {
            let unit = rest
                .get(2..6)
                .and_then(hex4)
                .ok_or(StringError::InvalidEscape(i))?;
            match surrogates.feed(unit) {
                Ok(Some(ch)) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                Ok(None) => pending_at = i,
                Err(code) if code == u32::from(unit) => return Err(lone_surrogate(code, i)),
                Err(code) => return Err(lone_surrogate(code, pending_at)),
            }
            i += 6;
            continue;
        }

        surrogates
            .finish()
            .map_err(|code| lone_surrogate(code, pending_at))?;
        out.push(match escape {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            _ => return Err(StringError::InvalidEscape(i)),
        });
        i += 2;
    }
    surrogates
        .finish()
        .map_err(|code| lone_surrogate(code, pending_at))?;

    String::from_utf8(out).map_err(|e| StringError::InvalidUtf8(e.utf8_error().valid_up_to()))
}

/// The source text of a number literal, parsed only on request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawNumber<'src> {
    text: &'src str,
}

impl<'src> RawNumber<'src> {
    pub(crate) fn new(text: &'src str) -> Self {
        Self { text }
    }

    /// The literal exactly as written.
    #[must_use]
    pub fn as_str(&self) -> &'src str {
        self.text
    }

    /// Returns `true` if the literal has neither a fraction nor an exponent.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        !self.text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
    }

    /// Parses the literal as `i64`; `None` for fractions or out-of-range
    /// values.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.text.parse().ok()
    }

    /// Parses the literal as `u64`; `None` for negatives, fractions, or
    /// out-of-range values.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.text.parse().ok()
    }

    /// Parses the literal as the nearest `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.text.parse().ok()
    }

    /// Parses the literal into any [`FromStr`] type, e.g. an arbitrary
    /// precision decimal.
    ///
    /// # Errors
    ///
    /// Returns whatever `T::from_str` returns.
    pub fn parse<T: FromStr>(&self) -> Result<T, T::Err> {
        self.text.parse()
    }
}

impl fmt::Debug for RawNumber<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawNumber({})", self.text)
    }
}

impl fmt::Display for RawNumber<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;

    use rstest::rstest;

    use super::*;

    #[test]
    fn decode_borrows_without_escapes() {
        let raw = RawStr::new(b"plain text");
        assert!(matches!(raw.decode(), Ok(Cow::Borrowed("plain text"))));
    }

    #[rstest]
    #[case(br#"a\"b"#, "a\"b")]
    #[case(br"back\\slash", "back\\slash")]
    #[case(br"\/\b\f\n\r\t", "/\u{8}\u{c}\n\r\t")]
    #[case(br"caf\u00e9", "caf\u{e9}")]
    #[case(br"\uD83D\uDE00!", "\u{1F600}!")]
    #[case("h\u{e9}\\n".as_bytes(), "h\u{e9}\n")]
    fn decode_unescapes(#[case] input: &[u8], #[case] expected: &str) {
        let decoded = RawStr::new(input).decode().unwrap();
        assert!(matches!(decoded, Cow::Owned(_)));
        assert_eq!(decoded, expected);
    }

    #[rstest]
    #[case(br"\x", StringError::InvalidEscape(0))]
    #[case(br"ab\u12", StringError::InvalidEscape(2))]
    #[case(br"\uDC00", StringError::LoneSurrogate { code: 0xDC00, offset: 0 })]
    #[case(br"x\uD800y", StringError::LoneSurrogate { code: 0xD800, offset: 1 })]
    #[case(br"\uD800A", StringError::LoneSurrogate { code: 0xD800, offset: 0 })]
    #[case(br"\uD800", StringError::LoneSurrogate { code: 0xD800, offset: 0 })]
    #[case(b"ok\xFF", StringError::InvalidUtf8(2))]
    fn decode_rejects(#[case] input: &[u8], #[case] expected: StringError) {
        assert_eq!(RawStr::new(input).decode().unwrap_err(), expected);
    }

    #[test]
    fn eq_str_matches_decoded_value() {
        assert!(RawStr::new(b"id").eq_str("id"));
        assert!(RawStr::new(br"\u0069d").eq_str("id"));
        assert!(!RawStr::new(b"id").eq_str("ids"));
    }

    #[test]
    fn number_accessors() {
        let n = RawNumber::new("-12");
        assert!(n.is_integer());
        assert_eq!(n.as_i64(), Some(-12));
        assert_eq!(n.as_u64(), None);
        assert_eq!(n.as_f64(), Some(-12.0));

        let f = RawNumber::new("2.5e3");
        assert!(!f.is_integer());
        assert_eq!(f.as_i64(), None);
        assert_eq!(f.as_f64(), Some(2500.0));
        assert_eq!(f.parse::<f32>(), Ok(2500.0));
    }

    #[test]
    fn big_integers_keep_their_text() {
        let n = RawNumber::new("123456789012345678901234567890");
        assert_eq!(n.as_u64(), None);
        assert_eq!(n.as_str(), "123456789012345678901234567890");
    }
}
