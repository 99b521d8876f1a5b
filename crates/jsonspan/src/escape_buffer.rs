//! Decoding of `\uXXXX` escapes, including UTF-16 surrogate pairs.
//!
//! JSON spells characters outside the basic multilingual plane as two
//! consecutive escapes (`\uD83D\uDE00`). [`UnicodeEscapeBuffer`] holds the
//! high half until the low half arrives and reports unpaired halves as
//! errors carrying the offending code unit.

/// Parses exactly four ASCII hex digits into a UTF-16 code unit.
pub(crate) fn hex4(digits: &[u8]) -> Option<u16> {
    let digits: &[u8; 4] = digits.get(..4)?.try_into().ok()?;
    let mut code = 0u16;
    for &d in digits {
        let nibble = match d {
            b'0'..=b'9' => d - b'0',
            b'a'..=b'f' => d - b'a' + 10,
            b'A'..=b'F' => d - b'A' + 10,
            _ => return None,
        };
        code = (code << 4) | u16::from(nibble);
    }
    Some(code)
}

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    high: Option<u16>,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded code unit.
    ///
    /// - `Ok(None)`: a high surrogate was stored.
    /// - `Ok(Some(ch))`: a complete scalar value.
    /// - `Err(code)`: `code` is a surrogate half without a partner.
    pub fn feed(&mut self, unit: u16) -> Result<Option<char>, u32> {
        match (self.high.take(), unit) {
            (None, 0xD800..=0xDBFF) => {
                self.high = Some(unit);
                Ok(None)
            }
            (None, 0xDC00..=0xDFFF) => Err(u32::from(unit)),
            (None, _) => Ok(char::from_u32(u32::from(unit))),
            (Some(high), 0xDC00..=0xDFFF) => {
                let code =
                    0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                char::from_u32(code).map(Some).ok_or(code)
            }
            (Some(high), _) => Err(u32::from(high)),
        }
    }

    /// Ends the sequence; a stored high surrogate is an error.
    pub fn finish(&mut self) -> Result<(), u32> {
        match self.high.take() {
            Some(high) => Err(u32::from(high)),
            None => Ok(()),
        }
    }
}
