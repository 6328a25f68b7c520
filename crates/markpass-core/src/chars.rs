//! Byte classifiers shared by every grammar production.
//!
//! All classifiers work on single bytes. `is_alnum` is deliberately ASCII-only:
//! multi-byte UTF-8 letters are neither alphanumeric nor punctuation, which
//! affects word-boundary decisions such as intra-word emphasis.

/// ASCII punctuation recognized at word boundaries.
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Space, tab, newline, carriage return, form feed or vertical tab.
#[inline(always)]
pub fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0c | 0x0b)
}

/// Horizontal whitespace only (space or tab).
#[inline(always)]
pub fn is_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Either of the two line terminator bytes.
#[inline(always)]
pub fn is_line_end(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// ASCII punctuation byte.
#[inline]
pub fn is_punct(c: u8) -> bool {
    PUNCTUATION.contains(&c)
}

/// ASCII letter or digit.
// TODO: word-boundary checks should decode UTF-8 and ask about alphanumeric chars
#[inline(always)]
pub fn is_alnum(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}
