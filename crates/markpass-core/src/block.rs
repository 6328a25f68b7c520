//! Block grammar: the second pass over normalized text.
//!
//! Each line is classified in a fixed order: ATX header, raw HTML block,
//! blank line, horizontal rule, fenced code, table, block quote, indented
//! code, unordered list, ordered list, and finally paragraph (which also
//! recognizes setext headers). Containers (quotes and list items) collect
//! their stripped content into a work buffer and recurse into
//! [`parse_block`].

use memchr::memchr;

use crate::chars::{is_alnum, is_blank, is_space};
use crate::context::Context;
use crate::inline::parse_inline;
use crate::renderer::{Alignment, ListFlags, Output};
use crate::Extensions;

/// Tags that may open a raw HTML block.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "dl",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ol",
    "ul",
    "del",
    "div",
    "ins",
    "pre",
    "form",
    "math",
    "table",
    "iframe",
    "script",
    "fieldset",
    "noscript",
    "blockquote",
];

/// Render the blocks of `data` into `out`.
///
/// At the nesting ceiling the text is written literally instead.
pub fn parse_block<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) {
    if ctx.nesting_exhausted() {
        ctx.renderer.text(out, data);
        return;
    }
    let mut guard = ctx.enter();
    let ctx: &mut Context<'_, T> = &mut guard;

    let mut data = data;
    while !data.is_empty() {
        let consumed = block(out, ctx, data);
        data = &data[consumed.min(data.len())..];
    }
}

/// Parse one block at the start of `data`; always consumes at least one byte.
fn block<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    if is_prefix_header(ctx, data) {
        return prefix_header(out, ctx, data);
    }

    if data[0] == b'<' {
        let n = html_block(out, ctx, data, true);
        if n > 0 {
            return n;
        }
    }

    let n = is_empty_line(data);
    if n > 0 {
        return n;
    }

    if is_hrule(data) {
        let renderer = ctx.renderer;
        if let Some(hrule) = renderer.hrule {
            hrule(out, &renderer.opaque);
        }
        return line_len(data);
    }

    if ctx.has(Extensions::FENCED_CODE) {
        let n = fenced_code(out, ctx, data);
        if n > 0 {
            return n;
        }
    }

    if ctx.has(Extensions::TABLES) {
        let n = table(out, ctx, data);
        if n > 0 {
            return n;
        }
    }

    if quote_prefix(data) > 0 {
        return block_quote(out, ctx, data);
    }

    if code_prefix(data) > 0 {
        return indented_code(out, ctx, data);
    }

    if ul_prefix(data) > 0 {
        return list(out, ctx, data, ListFlags::empty());
    }

    if ol_prefix(data) > 0 {
        return list(out, ctx, data, ListFlags::ORDERED);
    }

    paragraph(out, ctx, data)
}

/// Length of the first line including its `\n`, or the whole slice.
#[inline]
fn line_len(data: &[u8]) -> usize {
    match memchr(b'\n', data) {
        Some(pos) => pos + 1,
        None => data.len(),
    }
}

/// Length of a blank first line including its `\n`, or `0` if it has content.
pub(crate) fn is_empty_line(data: &[u8]) -> usize {
    let mut i = 0;
    while i < data.len() && data[i] != b'\n' {
        if !is_blank(data[i]) {
            return 0;
        }
        i += 1;
    }
    (i + 1).min(data.len())
}

// ============================================================================
// Headers and rules
// ============================================================================

fn is_prefix_header<T>(ctx: &Context<'_, T>, data: &[u8]) -> bool {
    if data.first() != Some(&b'#') {
        return false;
    }

    if ctx.has(Extensions::SPACE_HEADERS) {
        let level = data.iter().take(6).take_while(|&&c| c == b'#').count();
        if level < data.len() && !is_space(data[level]) {
            return false;
        }
    }
    true
}

/// `# Title #`: level from the run of `#`, closing hashes are dropped.
fn prefix_header<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    let level = data.iter().take(6).take_while(|&&c| c == b'#').count();

    let mut start = level;
    while start < data.len() && is_blank(data[start]) {
        start += 1;
    }
    let skip = match memchr(b'\n', &data[start..]) {
        Some(pos) => start + pos,
        None => data.len(),
    };

    let mut end = skip;
    while end > start && data[end - 1] == b'#' {
        end -= 1;
    }
    while end > start && is_blank(data[end - 1]) {
        end -= 1;
    }

    if end > start {
        let mut work = Vec::with_capacity(end - start);
        parse_inline(&mut work, ctx, &data[start..end]);

        let renderer = ctx.renderer;
        if let Some(header) = renderer.header {
            header(out, &work, level as u8, &renderer.opaque);
        }
    }

    skip.max(1)
}

/// Setext underline: `1` for a `=` line, `2` for a `-` line, `0` otherwise.
fn setext_level(data: &[u8]) -> u8 {
    let level = match data.first() {
        Some(b'=') => 1,
        Some(b'-') => 2,
        _ => return 0,
    };
    let c = data[0];

    let mut i = data.iter().take_while(|&&b| b == c).count();
    while i < data.len() && is_blank(data[i]) {
        i += 1;
    }
    if i >= data.len() || data[i] == b'\n' {
        level
    } else {
        0
    }
}

/// Three or more `*`, `-` or `_`, optionally separated by spaces.
fn is_hrule(data: &[u8]) -> bool {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    let Some(&c) = data.get(i) else {
        return false;
    };
    if !matches!(c, b'*' | b'-' | b'_') {
        return false;
    }

    let mut n = 0;
    while i < data.len() && data[i] != b'\n' {
        if data[i] == c {
            n += 1;
        } else if data[i] != b' ' {
            return false;
        }
        i += 1;
    }
    n >= 3
}

// ============================================================================
// Raw HTML blocks
// ============================================================================

/// Raw HTML block: a known block tag closed by its unindented end tag on a
/// line of its own, an HTML comment, or an `<hr>`, each followed by a blank
/// line. With `render` unset the block is only measured.
fn html_block<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], render: bool) -> usize {
    if data.len() < 2 || data[0] != b'<' {
        return 0;
    }

    let size = match find_block_tag(&data[1..]) {
        Some(tag) => html_block_end(ctx, data, tag),
        None => html_comment(data).or_else(|| html_hrule(data)).unwrap_or(0),
    };

    if size > 0 && render {
        let renderer = ctx.renderer;
        if let Some(block_html) = renderer.block_html {
            block_html(out, &data[..size], &renderer.opaque);
        }
    }
    size
}

fn find_block_tag(data: &[u8]) -> Option<&'static str> {
    let len = data.iter().take_while(|&&c| is_alnum(c)).count();
    if len >= data.len() {
        return None;
    }
    let name = &data[..len];
    BLOCK_TAGS
        .iter()
        .find(|tag| tag.as_bytes().eq_ignore_ascii_case(name))
        .copied()
}

/// `<!-- ... -->` followed by a blank line.
fn html_comment(data: &[u8]) -> Option<usize> {
    if data.len() <= 5 || !data.starts_with(b"<!--") {
        return None;
    }
    let mut i = 5;
    while i < data.len() && !(data[i - 2] == b'-' && data[i - 1] == b'-' && data[i] == b'>') {
        i += 1;
    }
    i += 1;
    if i >= data.len() {
        return None;
    }
    match is_empty_line(&data[i..]) {
        0 => None,
        n => Some(i + n),
    }
}

/// `<hr ...>` followed by a blank line, the only self-closing block tag.
fn html_hrule(data: &[u8]) -> Option<usize> {
    if data.len() <= 4 || !data[1..3].eq_ignore_ascii_case(b"hr") {
        return None;
    }
    let end = memchr(b'>', &data[3..])? + 3;
    if end + 1 >= data.len() {
        return None;
    }
    match is_empty_line(&data[end + 1..]) {
        0 => None,
        n => Some(end + 1 + n),
    }
}

/// Find the closing `</tag>` that ends the block and return the block length.
fn html_block_end<T>(ctx: &Context<'_, T>, data: &[u8], tag: &str) -> usize {
    // inline-level tags never form blocks
    if tag == "ins" || tag == "del" {
        return 0;
    }

    let mut i = 1;
    while i < data.len() {
        i += 1;
        while i < data.len() && !(data[i - 1] == b'<' && data[i] == b'/') {
            i += 1;
        }
        if i + 2 + tag.len() >= data.len() {
            return 0;
        }
        let n = closing_tag_len(ctx, &data[i - 1..], tag);
        if n > 0 {
            return i - 1 + n;
        }
    }
    0
}

/// Length of `</tag>` plus the blank line(s) that must follow it.
fn closing_tag_len<T>(ctx: &Context<'_, T>, data: &[u8], tag: &str) -> usize {
    let name_end = tag.len() + 2;
    if data.len() < tag.len() + 3
        || data[name_end] != b'>'
        || !data[2..name_end].eq_ignore_ascii_case(tag.as_bytes())
    {
        return 0;
    }

    // rest of the tag line must be blank
    let mut i = tag.len() + 3;
    if i < data.len() {
        match is_empty_line(&data[i..]) {
            0 => return 0,
            n => i += n,
        }
    }

    // then a blank line, unless blocks may be adjacent
    if i < data.len() {
        let n = is_empty_line(&data[i..]);
        if n == 0 && !ctx.has(Extensions::LAX_HTML_BLOCKS) {
            return 0;
        }
        i += n;
    }
    i
}

// ============================================================================
// Code blocks
// ============================================================================

/// A code fence line: three or more backticks or tildes.
struct Fence<'d> {
    /// Bytes up to and including the line's `\n`.
    len: usize,
    marker: &'d [u8],
    lang: &'d [u8],
}

/// Recognize a fence line. When `opening` is set, only a fence with the same
/// marker matches and no info string is read.
fn fence<'d>(data: &'d [u8], opening: Option<&[u8]>) -> Option<Fence<'d>> {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    let c = *data.get(i)?;
    if c != b'~' && c != b'`' {
        return None;
    }

    let start = i;
    while i < data.len() && data[i] == c {
        i += 1;
    }
    if i - start < 3 {
        return None;
    }
    let marker = &data[start..i];
    if opening.is_some_and(|open| open != marker) {
        return None;
    }

    let mut lang: &[u8] = &[];
    if opening.is_none() {
        while i < data.len() && data[i] == b' ' {
            i += 1;
        }
        if i < data.len() && data[i] == b'{' {
            // `{ lang }` form, whitespace inside the braces is dropped
            i += 1;
            let body = i;
            while i < data.len() && data[i] != b'}' && data[i] != b'\n' {
                i += 1;
            }
            if i >= data.len() || data[i] != b'}' {
                return None;
            }
            lang = trim_space(&data[body..i]);
            i += 1;
        } else {
            let word = i;
            while i < data.len() && !is_space(data[i]) {
                i += 1;
            }
            lang = &data[word..i];
        }
    }

    while i < data.len() && data[i] != b'\n' {
        if !is_space(data[i]) {
            return None;
        }
        i += 1;
    }

    Some(Fence {
        len: (i + 1).min(data.len()),
        marker,
        lang,
    })
}

fn trim_space(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|&c| !is_space(c)).unwrap_or(data.len());
    let end = data.iter().rposition(|&c| !is_space(c)).map_or(start, |p| p + 1);
    &data[start..end.max(start)]
}

/// Fenced code block; an unclosed fence is not a code block.
fn fenced_code<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    let Some(open) = fence(data, None) else {
        return 0;
    };

    let mut work = Vec::new();
    let mut beg = open.len;
    loop {
        if beg >= data.len() {
            return 0;
        }
        if let Some(close) = fence(&data[beg..], Some(open.marker)) {
            beg += close.len;
            break;
        }

        // copy the current line verbatim
        let end = beg + line_len(&data[beg..]);
        if end >= data.len() {
            return 0;
        }
        work.extend_from_slice(&data[beg..end]);
        beg = end;
    }

    let renderer = ctx.renderer;
    if let Some(block_code) = renderer.block_code {
        block_code(out, &work, open.lang, &renderer.opaque);
    }
    beg
}

/// Four leading spaces.
fn code_prefix(data: &[u8]) -> usize {
    if data.len() >= 4 && data[..4] == *b"    " {
        4
    } else {
        0
    }
}

/// Indented code: prefixed lines and the blank lines between them.
fn indented_code<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    let mut work = Vec::new();

    let mut i = 0;
    while i < data.len() {
        let mut beg = i;
        i += line_len(&data[i..]);

        let blank = is_empty_line(&data[beg..i]) > 0;
        let prefix = code_prefix(&data[beg..i]);
        if prefix > 0 {
            beg += prefix;
        } else if !blank {
            // non-empty, non-prefixed line breaks the block
            i = beg;
            break;
        }

        if blank {
            work.push(b'\n');
        } else {
            work.extend_from_slice(&data[beg..i]);
        }
    }

    // exactly one trailing newline
    while work.last() == Some(&b'\n') {
        work.pop();
    }
    work.push(b'\n');

    let renderer = ctx.renderer;
    if let Some(block_code) = renderer.block_code {
        block_code(out, &work, &[], &renderer.opaque);
    }
    i
}

// ============================================================================
// Block quotes
// ============================================================================

/// `>` after up to three spaces, plus one optional blank.
fn quote_prefix(data: &[u8]) -> usize {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    if i < data.len() && data[i] == b'>' {
        if i + 1 < data.len() && is_blank(data[i + 1]) {
            return i + 2;
        }
        return i + 1;
    }
    0
}

/// Block quote; lazy continuation lines without `>` are included until a
/// blank line followed by a non-quote line.
fn block_quote<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    let mut work = Vec::with_capacity(data.len());

    let (mut beg, mut end) = (0, 0);
    while beg < data.len() {
        end = beg + line_len(&data[beg..]);

        let prefix = quote_prefix(&data[beg..]);
        if prefix > 0 {
            beg += prefix;
        } else if is_empty_line(&data[beg..]) > 0
            && (end >= data.len()
                || (quote_prefix(&data[end..]) == 0 && is_empty_line(&data[end..]) == 0))
        {
            // empty line followed by non-quote line
            break;
        }

        if beg < end {
            work.extend_from_slice(&data[beg..end]);
        }
        beg = end;
    }

    let mut block = Vec::with_capacity(work.len());
    parse_block(&mut block, ctx, &work);

    let renderer = ctx.renderer;
    if let Some(block_quote) = renderer.block_quote {
        block_quote(out, &block, &renderer.opaque);
    }
    end
}

// ============================================================================
// Lists
// ============================================================================

/// `*`, `+` or `-` followed by a blank.
fn ul_prefix(data: &[u8]) -> usize {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    if i + 1 >= data.len() || !matches!(data[i], b'*' | b'+' | b'-') || !is_blank(data[i + 1]) {
        return 0;
    }
    i + 2
}

/// Digits, `.`, then a blank.
fn ol_prefix(data: &[u8]) -> usize {
    let mut i = 0;
    while i < 3 && i < data.len() && data[i] == b' ' {
        i += 1;
    }
    let start = i;
    while i < data.len() && data[i].is_ascii_digit() {
        i += 1;
    }
    if start == i || i + 1 >= data.len() || data[i] != b'.' || !is_blank(data[i + 1]) {
        return 0;
    }
    i + 2
}

fn list<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], mut flags: ListFlags) -> usize {
    let mut work = Vec::new();

    let mut i = 0;
    while i < data.len() {
        let n = list_item(&mut work, ctx, &data[i..], &mut flags);
        i += n;
        if n == 0 || flags.contains(ListFlags::END_OF_LIST) {
            break;
        }
    }

    let renderer = ctx.renderer;
    if let Some(render) = renderer.list {
        render(out, &work, flags, &renderer.opaque);
    }
    i.max(1)
}

/// One list item, marker included. Flags carry over between items so a list
/// turns loose once any item contains blocks.
fn list_item<T>(
    out: &mut Output,
    ctx: &mut Context<'_, T>,
    data: &[u8],
    flags: &mut ListFlags,
) -> usize {
    // indentation of the marker line
    let indent = data.iter().take(3).take_while(|&&c| c == b' ').count();

    let mut beg = match ul_prefix(data) {
        0 => ol_prefix(data),
        n => n,
    };
    if beg == 0 {
        return 0;
    }

    // skip leading whitespace on the first line
    while beg < data.len() && data[beg] == b' ' {
        beg += 1;
    }
    let mut end = beg + line_len(&data[beg..]);

    let mut work = Vec::with_capacity(data.len().min(256));
    work.extend_from_slice(&data[beg..end]);
    beg = end;

    // offset in `work` where a nested list starts
    let mut sublist = 0;
    let mut has_blank_line = false;
    let mut contains_block = false;

    while beg < data.len() {
        end = beg + line_len(&data[beg..]);

        if is_empty_line(&data[beg..end]) > 0 {
            has_blank_line = true;
            beg = end;
            continue;
        }

        let pre = data[beg..end].iter().take(4).take_while(|&&c| c == b' ').count();
        let chunk = &data[beg + pre..end];

        if (ul_prefix(chunk) > 0 && !is_hrule(chunk)) || ol_prefix(chunk) > 0 {
            // a new item: a sibling at the same indentation, else a nested list
            if has_blank_line {
                contains_block = true;
            }
            if pre == indent {
                break;
            }
            if sublist == 0 {
                sublist = work.len();
            }
        } else if is_prefix_header(ctx, chunk) {
            // only indented headers stay in the item
            if has_blank_line && pre < 4 && data[beg] != b' ' {
                flags.insert(ListFlags::END_OF_LIST);
                break;
            }
            contains_block = true;
        } else if has_blank_line {
            // only indented text joins the item after a blank line
            if pre < 4 {
                flags.insert(ListFlags::END_OF_LIST);
                break;
            }
            work.push(b'\n');
            contains_block = true;
        }

        has_blank_line = false;
        work.extend_from_slice(chunk);
        beg = end;
    }

    if contains_block {
        flags.insert(ListFlags::CONTAINS_BLOCK);
    }

    let mut inner = Vec::with_capacity(work.len());
    let split = sublist > 0 && sublist < work.len();
    if flags.contains(ListFlags::CONTAINS_BLOCK) {
        if split {
            parse_block(&mut inner, ctx, &work[..sublist]);
            parse_block(&mut inner, ctx, &work[sublist..]);
        } else {
            parse_block(&mut inner, ctx, &work);
        }
    } else if split {
        parse_inline(&mut inner, ctx, &work[..sublist]);
        parse_block(&mut inner, ctx, &work[sublist..]);
    } else {
        parse_inline(&mut inner, ctx, &work);
    }

    let renderer = ctx.renderer;
    if let Some(list_item) = renderer.list_item {
        list_item(out, &inner, *flags, &renderer.opaque);
    }
    beg
}

// ============================================================================
// Tables
// ============================================================================

/// Pipe table: header row, alignment underline, then rows containing `|`.
fn table<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    let mut header = Vec::new();
    let Some((mut i, columns)) = table_header(&mut header, ctx, data) else {
        return 0;
    };

    let mut body = Vec::new();
    while i < data.len() {
        let row_end = i + line_len(&data[i..]);
        if memchr(b'|', &data[i..row_end]).is_none() {
            break;
        }
        table_row(&mut body, ctx, &data[i..row_end], &columns);
        i = row_end;
    }

    let renderer = ctx.renderer;
    if let Some(render) = renderer.table {
        render(out, &header, &body, &renderer.opaque);
    }
    i
}

/// Render the header row and return the bytes consumed by the header and its
/// underline, plus each column's alignment.
fn table_header<T>(
    out: &mut Output,
    ctx: &mut Context<'_, T>,
    data: &[u8],
) -> Option<(usize, Vec<Alignment>)> {
    let header_len = line_len(data);
    let header = &data[..header_len];
    let line = header.strip_suffix(b"\n").unwrap_or(header);

    let pipes = line.iter().filter(|&&c| c == b'|').count();
    if pipes == 0 {
        return None;
    }

    // pipes at the start or end of the line don't separate columns
    let mut count = pipes + 1;
    if line.first() == Some(&b'|') {
        count -= 1;
    }
    if line.len() > 2 && line.last() == Some(&b'|') {
        count -= 1;
    }
    let mut columns = vec![Alignment::None; count];

    // each underline column is / *:?-+:? *|/ with at least three dashes and colons;
    // the trailing pipe is optional on the last column
    let under = &data[header_len..];
    let under = &under[..line_len(under)];
    let at = |i: usize| under.get(i).copied().unwrap_or(b'\n');

    let mut i = 0;
    if at(i) == b'|' {
        i += 1;
    }
    while at(i) == b' ' {
        i += 1;
    }

    let mut col = 0;
    while at(i) != b'\n' {
        if col >= count {
            return None;
        }
        let mut dashes = 0;
        if at(i) == b':' {
            i += 1;
            columns[col] = columns[col].with_left();
            dashes += 1;
        }
        while at(i) == b'-' {
            i += 1;
            dashes += 1;
        }
        if at(i) == b':' {
            i += 1;
            columns[col] = columns[col].with_right();
            dashes += 1;
        }
        while at(i) == b' ' {
            i += 1;
        }

        if dashes < 3 {
            return None;
        }
        if at(i) == b'|' && under[i - 1] != b'\\' {
            col += 1;
            i += 1;
            while at(i) == b' ' {
                i += 1;
            }
            // trailing junk after the last column
            if col >= count && at(i) != b'\n' {
                return None;
            }
        } else if at(i) == b'\n' && col + 1 == count {
            // the pipe is optional for the last column
            col += 1;
        } else {
            return None;
        }
    }
    if col != count {
        return None;
    }

    table_row(out, ctx, header, &columns);
    Some((header_len + under.len(), columns))
}

/// One row; missing cells are padded, extra cells are dropped.
fn table_row<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], columns: &[Alignment]) {
    let renderer = ctx.renderer;
    let line = data.strip_suffix(b"\n").unwrap_or(data);
    let mut row = Vec::new();

    let mut i = 0;
    if line.first() == Some(&b'|') {
        i += 1;
    }

    let mut col = 0;
    while col < columns.len() && i < line.len() {
        while i < line.len() && line[i] == b' ' {
            i += 1;
        }
        let cell_start = i;
        while i < line.len() && (line[i] != b'|' || line[i - 1] == b'\\') {
            i += 1;
        }
        let mut cell_end = i;
        while cell_end > cell_start && line[cell_end - 1] == b' ' {
            cell_end -= 1;
        }

        let mut cell = Vec::with_capacity(cell_end - cell_start);
        parse_inline(&mut cell, ctx, &line[cell_start..cell_end]);
        if let Some(table_cell) = renderer.table_cell {
            table_cell(&mut row, &cell, columns[col], &renderer.opaque);
        }
        i += 1;
        col += 1;
    }

    if let Some(table_cell) = renderer.table_cell {
        for &align in &columns[col..] {
            table_cell(&mut row, &[], align, &renderer.opaque);
        }
    }

    if let Some(table_row) = renderer.table_row {
        table_row(out, &row, &renderer.opaque);
    }
}

// ============================================================================
// Paragraphs
// ============================================================================

/// Paragraph up to a blank line, a setext underline, an ATX header, a rule,
/// or (with lax HTML blocks) the start of an HTML block.
fn paragraph<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) -> usize {
    // `prev` starts the previous line, `line` the current one
    let mut prev;
    let (mut line, mut i) = (0, 0);

    while i < data.len() {
        prev = line;
        let current = &data[i..];
        line = i;

        let n = is_empty_line(current);
        if n > 0 {
            render_paragraph(out, ctx, &data[..i]);
            return i + n;
        }

        // an underline ends the paragraph on the previous line
        if i > 0 {
            let level = setext_level(current);
            if level > 0 {
                render_paragraph(out, ctx, &data[..prev]);

                let mut start = prev;
                let mut eol = i - 1;
                while start < eol && is_blank(data[start]) {
                    start += 1;
                }
                while eol > start && is_blank(data[eol - 1]) {
                    eol -= 1;
                }

                let mut work = Vec::with_capacity(eol - start);
                parse_inline(&mut work, ctx, &data[start..eol]);

                let renderer = ctx.renderer;
                if let Some(header) = renderer.header {
                    header(out, &work, level, &renderer.opaque);
                }
                return i + line_len(current);
            }
        }

        if ctx.has(Extensions::LAX_HTML_BLOCKS)
            && current[0] == b'<'
            && html_block(out, ctx, current, false) > 0
        {
            render_paragraph(out, ctx, &data[..i]);
            return i;
        }

        if i > 0 && (is_prefix_header(ctx, current) || is_hrule(current)) {
            render_paragraph(out, ctx, &data[..i]);
            return i;
        }

        i += line_len(current);
    }

    render_paragraph(out, ctx, &data[..i]);
    i
}

/// Inline content is parsed even without a paragraph callback, so span
/// callbacks still see it.
fn render_paragraph<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) {
    let start = data.iter().position(|&c| !is_space(c)).unwrap_or(data.len());
    let end = data.iter().rposition(|&c| !is_space(c)).map_or(start, |p| p + 1);
    if end <= start {
        return;
    }

    let mut work = Vec::with_capacity(end - start);
    parse_inline(&mut work, ctx, &data[start..end]);

    let renderer = ctx.renderer;
    if let Some(paragraph) = renderer.paragraph {
        paragraph(out, &work, &renderer.opaque);
    }
}
