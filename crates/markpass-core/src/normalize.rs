//! First pass: reference extraction and text normalization.
//!
//! The input is scanned line by line. Lines starting a reference definition
//! are diverted into the [`ReferenceTable`]; every other line is copied with
//! its tabs expanded, and each line terminator (`\n`, `\r`, or `\r\n`) is
//! rewritten as a single `\n`.
//!
//! Line terminators are located with `memchr2`, so long lines cost a SIMD
//! scan rather than a byte loop.

use memchr::memchr2;

use crate::reference::{parse_reference, ReferenceTable};

/// Width of a tab stop in columns.
pub const TAB_SIZE: usize = 4;

/// Output of the first pass.
#[derive(Debug, Clone, Default)]
pub struct Normalized<'a> {
    /// Canonical text: tabs expanded, `\n` line endings, ends with `\n` unless empty.
    pub text: Vec<u8>,
    /// References found in the input.
    pub references: ReferenceTable<'a>,
}

/// Run the first pass over raw input.
pub fn normalize(input: &[u8]) -> Normalized<'_> {
    let mut references = ReferenceTable::new();
    let mut text = Vec::with_capacity(input.len() + input.len() / 8);

    let mut beg = 0;
    while beg < input.len() {
        let consumed = parse_reference(&input[beg..], Some(&mut references));
        if consumed > 0 {
            beg += consumed;
            continue;
        }

        // skip to the next line
        let end = match memchr2(b'\n', b'\r', &input[beg..]) {
            Some(pos) => beg + pos,
            None => input.len(),
        };
        if end > beg {
            expand_tabs(&mut text, &input[beg..end]);
        }

        // one '\n' per line break, where "\r\n" is a single break
        let mut end = end;
        while end < input.len() && (input[end] == b'\n' || input[end] == b'\r') {
            if input[end] == b'\n' || end + 1 >= input.len() || input[end + 1] != b'\n' {
                text.push(b'\n');
            }
            end += 1;
        }

        beg = end;
    }

    if text.last().is_some_and(|&c| c != b'\n') {
        text.push(b'\n');
    }

    tracing::debug!(
        input_len = input.len(),
        text_len = text.len(),
        references = references.len(),
        "normalized input"
    );

    Normalized { text, references }
}

/// Append `line` to `out`, replacing each tab with spaces up to the next tab stop.
///
/// Columns are counted in bytes from the start of `line`.
pub fn expand_tabs(out: &mut Vec<u8>, line: &[u8]) {
    let mut column = 0;

    for (index, chunk) in line.split(|&c| c == b'\t').enumerate() {
        if index > 0 {
            // a tab always advances at least one column
            loop {
                out.push(b' ');
                column += 1;
                if column % TAB_SIZE == 0 {
                    break;
                }
            }
        }
        out.extend_from_slice(chunk);
        column += chunk.len();
    }
}
