//! Link reference definitions.
//!
//! References usually appear as footnotes in a document and can be used by
//! any link or image:
//!
//! ```text
//! [1]: http://www.example.com/ "Example"
//! [docs]: <http://docs.example.com/>
//!   'Documentation'
//! ```
//!
//! Anywhere in the document the reference is used through its label, e.g.
//! `see [the docs][docs]` or the shortcut form `see [docs]`. Labels match
//! case-insensitively.

use std::collections::HashMap;

use crate::chars::{is_blank, is_line_end};

/// A resolved reference: target plus optional title, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub link: &'a [u8],
    /// Empty when the definition has no title.
    pub title: &'a [u8],
}

/// Mapping from case-folded label to its reference.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable<'a> {
    refs: HashMap<String, Reference<'a>>,
}

impl<'a> ReferenceTable<'a> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            refs: HashMap::new(),
        }
    }

    /// Register a reference, replacing any earlier one with the same label.
    pub fn insert(&mut self, id: &[u8], reference: Reference<'a>) {
        let key = fold_label(id);
        if self.refs.insert(key, reference).is_some() {
            tracing::trace!(
                id = %String::from_utf8_lossy(id),
                "reference redefined, keeping the latest definition"
            );
        }
    }

    /// Look up a label using the same case folding as [`insert`](Self::insert).
    pub fn get(&self, id: &[u8]) -> Option<&Reference<'a>> {
        self.refs.get(&fold_label(id))
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// True when no definition was registered.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterate over `(folded label, reference)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reference<'a>)> {
        self.refs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Case-fold a label. Invalid UTF-8 is replaced before lowering.
fn fold_label(id: &[u8]) -> String {
    String::from_utf8_lossy(id).to_lowercase()
}

/// Check whether `data` starts with a reference definition.
///
/// Returns the number of bytes the definition occupies, or `0` when the first
/// line is not a reference. The returned extent stops at the definition's
/// final line terminator, not past it. With `refs` set, the parsed reference
/// is registered; `None` only checks the syntax.
pub fn parse_reference<'a>(data: &'a [u8], refs: Option<&mut ReferenceTable<'a>>) -> usize {
    // up to 3 optional leading spaces
    if data.len() < 4 {
        return 0;
    }
    let mut i = 0;
    while i < 3 && data[i] == b' ' {
        i += 1;
    }
    if data[i] == b' ' {
        return 0;
    }

    // id part: anything but a newline between brackets
    if data[i] != b'[' {
        return 0;
    }
    i += 1;
    let id_start = i;
    while i < data.len() && !is_line_end(data[i]) && data[i] != b']' {
        i += 1;
    }
    if i >= data.len() || data[i] != b']' {
        return 0;
    }
    let id_end = i;

    // spacer: colon (space | tab)* newline? (space | tab)*
    i += 1;
    if i >= data.len() || data[i] != b':' {
        return 0;
    }
    i += 1;
    i = skip_blanks(data, i);
    if i < data.len() && is_line_end(data[i]) {
        i += 1;
        if i < data.len() && data[i] == b'\n' && data[i - 1] == b'\r' {
            i += 1;
        }
    }
    i = skip_blanks(data, i);
    if i >= data.len() {
        return 0;
    }

    // link: whitespace-free sequence, optionally between angle brackets
    let mut link_start = i;
    while i < data.len() && !is_blank(data[i]) && !is_line_end(data[i]) {
        i += 1;
    }
    let mut link_end = i;
    if link_end - link_start >= 2 && data[link_start] == b'<' && data[link_end - 1] == b'>' {
        link_start += 1;
        link_end -= 1;
    }

    // optional spacer: (space | tab)* (newline | '\'' | '"' | '(' )
    i = skip_blanks(data, i);
    if i < data.len() && !is_line_end(data[i]) && !matches!(data[i], b'\'' | b'"' | b'(') {
        return 0;
    }

    // end of the definition line, if the link ends it
    let mut line_end = None;
    if i >= data.len() || is_line_end(data[i]) {
        let mut end = i;
        if i + 1 < data.len() && data[i] == b'\r' && data[i + 1] == b'\n' {
            end += 1;
        }
        line_end = Some(end);
        // a title may sit alone on the following line
        i = skip_blanks(data, end + 1);
    }

    // optional title: any non-newline sequence enclosed in '"() alone on its line
    let (mut title_start, mut title_end) = (0, 0);
    if i + 1 < data.len() && matches!(data[i], b'\'' | b'"' | b'(') {
        i += 1;
        title_start = i;

        while i < data.len() && !is_line_end(data[i]) {
            i += 1;
        }
        title_end = if i + 1 < data.len() && data[i] == b'\r' && data[i + 1] == b'\n' {
            i + 1
        } else {
            i
        };

        // step back over trailing blanks to find the closer
        let mut j = i - 1;
        while j > title_start && is_blank(data[j]) {
            j -= 1;
        }
        if j > title_start && matches!(data[j], b'\'' | b'"' | b')') {
            line_end = Some(title_end);
            title_end = j;
        } else if line_end.is_some() {
            // opener on the next line without a closer: the body still counts
            // as the title, but the definition ends on the link line
            title_end = i;
        }
    }

    // garbage after the link
    let Some(line_end) = line_end else {
        return 0;
    };

    if let Some(refs) = refs {
        refs.insert(
            &data[id_start..id_end],
            Reference {
                link: &data[link_start..link_end],
                title: &data[title_start..title_end],
            },
        );
    }

    line_end
}

#[inline]
fn skip_blanks(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && is_blank(data[i]) {
        i += 1;
    }
    i
}
