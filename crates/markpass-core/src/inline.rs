//! Inline grammar productions.
//!
//! [`parse_inline`] copies runs of inactive bytes through the renderer's
//! `normal_text` callback and hands every byte with a dispatch table entry to
//! its production. Each production returns how many bytes it consumed; `0`
//! declines, and the trigger byte is then written out as plain text.

use std::borrow::Cow;

use memchr::memchr;

use crate::chars::{is_alnum, is_blank, is_punct, is_space};
use crate::context::Context;
use crate::dispatch::InlineKind;
use crate::renderer::{LinkKind, Output};

/// Bytes that lose their meaning after a backslash.
const ESCAPE_CHARS: &[u8] = b"\\`*_{}[]()#+-.!:|&<>~";

/// Schemes accepted for bare autolinks and by safe-link filtering.
const SAFE_PREFIXES: &[&[u8]] = &[b"http://", b"https://", b"ftp://", b"mailto:"];

/// Render inline content of `data` into `out`.
///
/// At the nesting ceiling the text is written literally instead.
pub fn parse_inline<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8]) {
    if ctx.nesting_exhausted() {
        ctx.renderer.text(out, data);
        return;
    }
    let mut guard = ctx.enter();
    let ctx: &mut Context<'_, T> = &mut guard;
    let renderer = ctx.renderer;

    let (mut i, mut end) = (0, 0);
    while i < data.len() {
        // copy inactive chars into the output
        while end < data.len() && !ctx.inline.is_active(data[end]) {
            end += 1;
        }
        renderer.text(out, &data[i..end]);
        if end >= data.len() {
            break;
        }
        i = end;

        let consumed = match ctx.inline.get(data[i]) {
            Some(kind) => run(kind, out, ctx, data, i),
            None => 0,
        };
        if consumed == 0 {
            // no action from the callback: the trigger byte becomes text
            end = i + 1;
        } else {
            i += consumed;
            end = i;
        }
    }
}

fn run<T>(
    kind: InlineKind,
    out: &mut Output,
    ctx: &mut Context<'_, T>,
    data: &[u8],
    offset: usize,
) -> usize {
    match kind {
        InlineKind::Emphasis => emphasis(out, ctx, data, offset),
        InlineKind::CodeSpan => code_span(out, ctx, data, offset),
        InlineKind::LineBreak => line_break(out, ctx, data, offset),
        InlineKind::Link => link(out, ctx, data, offset),
        InlineKind::LeftAngle => left_angle(out, ctx, data, offset),
        InlineKind::Escape => escape(out, ctx, data, offset),
        InlineKind::Entity => entity(out, ctx, data, offset),
        InlineKind::Autolink => autolink(out, ctx, data, offset),
    }
}

// ============================================================================
// Emphasis: single, double, triple, and strikethrough
// ============================================================================

/// `*`, `_` or `~` run.
fn emphasis<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    if ctx.has(crate::Extensions::NO_INTRA_EMPHASIS) && offset > 0 && is_alnum(data[offset - 1]) {
        return 0;
    }
    let data = &data[offset..];
    let c = data[0];

    if data.len() > 2 && data[1] != c {
        // whitespace cannot follow an opening emphasis;
        // strikethrough only takes two characters '~~'
        if c == b'~' || is_space(data[1]) {
            return 0;
        }
        return match emphasis_single(out, ctx, &data[1..], c) {
            0 => 0,
            n => n + 1,
        };
    }

    if data.len() > 3 && data[1] == c && data[2] != c {
        if is_space(data[2]) {
            return 0;
        }
        return match emphasis_double(out, ctx, &data[2..], c) {
            0 => 0,
            n => n + 2,
        };
    }

    if data.len() > 4 && data[1] == c && data[2] == c && data[3] != c {
        if c == b'~' || is_space(data[3]) {
            return 0;
        }
        return match emphasis_triple(out, ctx, data, 3, c) {
            0 => 0,
            n => n + 3,
        };
    }

    0
}

/// Find the next closing `c`, skipping code spans and link bodies.
///
/// Returns `0` when there is none.
fn find_emph_char(data: &[u8], c: u8) -> usize {
    let mut i = 1;

    while i < data.len() {
        while i < data.len() && data[i] != c && data[i] != b'`' && data[i] != b'[' {
            i += 1;
        }
        if i >= data.len() {
            return 0;
        }
        if data[i] == c {
            return i;
        }

        // do not count escaped chars
        if data[i - 1] == b'\\' {
            i += 1;
            continue;
        }

        // a `c` found inside a skipped span is used only if nothing closes the span
        let mut fallback = 0;
        if data[i] == b'`' {
            i += 1;
            while i < data.len() && data[i] != b'`' {
                if fallback == 0 && data[i] == c {
                    fallback = i;
                }
                i += 1;
            }
            if i >= data.len() {
                return fallback;
            }
            i += 1;
        } else {
            // link text
            i += 1;
            while i < data.len() && data[i] != b']' {
                if fallback == 0 && data[i] == c {
                    fallback = i;
                }
                i += 1;
            }
            i += 1;
            while i < data.len() && matches!(data[i], b' ' | b'\t' | b'\n') {
                i += 1;
            }
            if i >= data.len() {
                return fallback;
            }
            let close = match data[i] {
                b'[' => b']',
                b'(' => b')',
                _ => {
                    if fallback > 0 {
                        return fallback;
                    }
                    continue;
                }
            };

            // link target or reference id
            i += 1;
            while i < data.len() && data[i] != close {
                if fallback == 0 && data[i] == c {
                    fallback = i;
                }
                i += 1;
            }
            if i >= data.len() {
                return fallback;
            }
            i += 1;
        }
    }

    0
}

fn emphasis_single<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], c: u8) -> usize {
    let renderer = ctx.renderer;
    let Some(render) = renderer.emphasis else {
        return 0;
    };

    // skip one symbol if coming from a triple run
    let mut i = if data.len() > 1 && data[0] == c && data[1] == c { 1 } else { 0 };

    while i < data.len() {
        let len = find_emph_char(&data[i..], c);
        if len == 0 {
            return 0;
        }
        i += len;
        if i >= data.len() {
            return 0;
        }

        if i + 1 < data.len() && data[i + 1] == c {
            i += 1;
            continue;
        }

        if data[i] == c && !is_space(data[i - 1]) {
            if ctx.has(crate::Extensions::NO_INTRA_EMPHASIS)
                && !(i + 1 == data.len() || is_space(data[i + 1]) || is_punct(data[i + 1]))
            {
                continue;
            }

            let mut work = Vec::with_capacity(i);
            parse_inline(&mut work, ctx, &data[..i]);
            return if render(out, &work, &renderer.opaque) { i + 1 } else { 0 };
        }
    }

    0
}

fn emphasis_double<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], c: u8) -> usize {
    let renderer = ctx.renderer;
    let callback = if c == b'~' {
        renderer.strikethrough
    } else {
        renderer.double_emphasis
    };
    let Some(render) = callback else {
        return 0;
    };

    let mut i = 0;
    while i < data.len() {
        let len = find_emph_char(&data[i..], c);
        if len == 0 {
            return 0;
        }
        i += len;

        if i + 1 < data.len() && data[i] == c && data[i + 1] == c && !is_space(data[i - 1]) {
            let mut work = Vec::with_capacity(i);
            parse_inline(&mut work, ctx, &data[..i]);
            return if render(out, &work, &renderer.opaque) { i + 2 } else { 0 };
        }
        i += 1;
    }

    0
}

/// `original` starts at the opening run; the content starts at `offset`.
fn emphasis_triple<T>(
    out: &mut Output,
    ctx: &mut Context<'_, T>,
    original: &[u8],
    offset: usize,
    c: u8,
) -> usize {
    let renderer = ctx.renderer;
    let data = &original[offset..];

    let mut i = 0;
    while i < data.len() {
        let len = find_emph_char(&data[i..], c);
        if len == 0 {
            return 0;
        }
        i += len;

        // skip whitespace preceded symbols
        if data[i] != c || is_space(data[i - 1]) {
            continue;
        }

        let triple = i + 2 < data.len() && data[i + 1] == c && data[i + 2] == c;
        if let (true, Some(render)) = (triple, renderer.triple_emphasis) {
            let mut work = Vec::with_capacity(i);
            parse_inline(&mut work, ctx, &data[..i]);
            return if render(out, &work, &renderer.opaque) { i + 3 } else { 0 };
        }

        if i + 1 < data.len() && data[i + 1] == c {
            // double symbol found, the outer span is a single emphasis
            return match emphasis_single(out, ctx, &original[offset - 2..], c) {
                0 => 0,
                n => n - 2,
            };
        }

        // single symbol found, the outer span is a double emphasis
        return match emphasis_double(out, ctx, &original[offset - 1..], c) {
            0 => 0,
            n => n - 1,
        };
    }

    0
}

// ============================================================================
// Code spans and line breaks
// ============================================================================

/// `` ` `` run: a code span closed by a run of the same length.
fn code_span<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let renderer = ctx.renderer;
    let Some(render) = renderer.code_span else {
        return 0;
    };
    let data = &data[offset..];

    let nb = data.iter().take_while(|&&c| c == b'`').count();

    // find the next delimiter
    let (mut run, mut end) = (0, nb);
    while end < data.len() && run < nb {
        if data[end] == b'`' {
            run += 1;
        } else {
            run = 0;
        }
        end += 1;
    }
    if run < nb {
        // no matching delimiter
        return 0;
    }

    // trim outside whitespace
    let mut text_start = nb;
    while text_start < end && is_blank(data[text_start]) {
        text_start += 1;
    }
    let mut text_end = end - nb;
    while text_end > nb && is_blank(data[text_end - 1]) {
        text_end -= 1;
    }

    let text = if text_start < text_end {
        &data[text_start..text_end]
    } else {
        &[][..]
    };
    if render(out, text, &renderer.opaque) {
        end
    } else {
        0
    }
}

/// `\n` preceded by two spaces.
fn line_break<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    if offset < 2 || data[offset - 1] != b' ' || data[offset - 2] != b' ' {
        return 0;
    }
    let renderer = ctx.renderer;
    let Some(render) = renderer.line_break else {
        return 0;
    };

    // remove trailing spaces from out and render
    let len = out.len();
    while out.last() == Some(&b' ') {
        out.pop();
    }
    if render(out, &renderer.opaque) {
        1
    } else {
        out.resize(len, b' ');
        0
    }
}

// ============================================================================
// Links and images
// ============================================================================

/// `[`: inline link `[text](url "title")`, reference link `[text][id]`,
/// shortcut reference `[id]`, or an image when preceded by `!`.
fn link<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let is_image = offset > 0 && data[offset - 1] == b'!';
    let renderer = ctx.renderer;
    let callback = if is_image {
        renderer.image
    } else {
        renderer.link
    };
    let Some(render) = callback else {
        return 0;
    };
    let data = &data[offset..];

    // look for the matching closing bracket
    let mut i = 1;
    let mut text_has_nl = false;
    let mut level = 1;
    while level > 0 && i < data.len() {
        match data[i] {
            b'\n' => text_has_nl = true,
            _ if data[i - 1] == b'\\' => {}
            b'[' => level += 1,
            b']' => {
                level -= 1;
                if level == 0 {
                    // don't count it
                    i -= 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if i >= data.len() {
        return 0;
    }
    let text_end = i;
    i += 1;

    // skip any amount of whitespace or newline
    while i < data.len() && is_space(data[i]) {
        i += 1;
    }

    let raw_link: &[u8];
    let title: &[u8];

    if i < data.len() && data[i] == b'(' {
        // inline style link
        i += 1;
        while i < data.len() && is_space(data[i]) {
            i += 1;
        }
        let mut link_start = i;

        // look for link end: ' " )
        while i < data.len() {
            match data[i] {
                b'\\' => i += 2,
                b')' | b'\'' | b'"' => break,
                _ => i += 1,
            }
        }
        if i >= data.len() {
            return 0;
        }
        let mut link_end = i;

        // look for title end if present
        let (mut title_start, mut title_end) = (0, 0);
        if data[i] == b'\'' || data[i] == b'"' {
            i += 1;
            title_start = i;
            while i < data.len() {
                match data[i] {
                    b'\\' => i += 2,
                    b')' => break,
                    _ => i += 1,
                }
            }
            if i >= data.len() {
                return 0;
            }

            // skip whitespace after title
            title_end = i - 1;
            while title_end > title_start && is_space(data[title_end]) {
                title_end -= 1;
            }

            // no closing quote: everything up to ')' is the link
            if data[title_end] != b'\'' && data[title_end] != b'"' {
                title_start = 0;
                title_end = 0;
                link_end = i;
            }
        }

        // remove whitespace at the end of the link
        while link_end > link_start && is_space(data[link_end - 1]) {
            link_end -= 1;
        }

        // remove optional angle brackets around the link
        if link_start < link_end && data[link_start] == b'<' {
            link_start += 1;
        }
        if link_start < link_end && data[link_end - 1] == b'>' {
            link_end -= 1;
        }

        raw_link = &data[link_start..link_end];
        title = if title_end > title_start {
            &data[title_start..title_end]
        } else {
            &[]
        };
        i += 1;
    } else if i < data.len() && data[i] == b'[' {
        // reference style link
        i += 1;
        let id_start = i;
        match memchr(b']', &data[i..]) {
            Some(pos) => i += pos,
            None => return 0,
        }

        let id: Cow<'_, [u8]> = if id_start == i {
            link_label(&data[1..text_end], text_has_nl)
        } else {
            Cow::Borrowed(&data[id_start..i])
        };
        let Some(reference) = ctx.refs.get(&id).copied() else {
            return 0;
        };
        raw_link = reference.link;
        title = reference.title;
        i += 1;
    } else {
        // shortcut reference style link
        let id = link_label(&data[1..text_end], text_has_nl);
        let Some(reference) = ctx.refs.get(&id).copied() else {
            return 0;
        };
        raw_link = reference.link;
        title = reference.title;

        // rewind the whitespace
        i = text_end + 1;
    }

    // build content: image alt text is copied, link content is parsed
    let mut content = Vec::new();
    if text_end > 1 {
        if is_image {
            content.extend_from_slice(&data[1..text_end]);
        } else {
            parse_inline(&mut content, ctx, &data[1..text_end]);
        }
    }

    let mut link = Vec::with_capacity(raw_link.len());
    unescape_text(&mut link, raw_link);

    // the '!' of an image was already written out as text
    let bang = is_image && out.last() == Some(&b'!');
    if bang {
        out.pop();
    }

    if render(out, &link, title, &content, &renderer.opaque) {
        i
    } else {
        if bang {
            out.push(b'!');
        }
        0
    }
}

/// Link label used as a reference id; newlines inside it collapse to one space.
fn link_label(label: &[u8], has_newline: bool) -> Cow<'_, [u8]> {
    if !has_newline {
        return Cow::Borrowed(label);
    }

    let mut id = Vec::with_capacity(label.len());
    let mut prev = b'[';
    for &c in label {
        if c != b'\n' {
            id.push(c);
        } else if prev != b' ' {
            id.push(b' ');
        }
        prev = c;
    }
    Cow::Owned(id)
}

// ============================================================================
// Angle brackets, escapes, entities
// ============================================================================

/// `<`: autolink (`<http://...>`, `<me@example.com>`) or raw inline HTML tag.
fn left_angle<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let data = &data[offset..];
    let renderer = ctx.renderer;

    let (end, kind) = tag_length(data);
    if end <= 2 {
        return 0;
    }

    let rendered = match (kind, renderer.autolink, renderer.raw_html_tag) {
        (LinkKind::Normal | LinkKind::Email, Some(render), _) => {
            let mut link = Vec::with_capacity(end);
            unescape_text(&mut link, &data[1..end - 1]);
            render(out, &link, kind, &renderer.opaque)
        }
        (_, _, Some(render)) => render(out, &data[..end], &renderer.opaque),
        _ => false,
    };

    if rendered {
        end
    } else {
        0
    }
}

/// Length of the tag at the start of `data`, or `0` if it is not one,
/// together with the kind of autolink it forms.
fn tag_length(data: &[u8]) -> (usize, LinkKind) {
    // a valid tag can't be shorter than 3 chars
    if data.len() < 3 || data[0] != b'<' {
        return (0, LinkKind::NotAutolink);
    }

    // begins with a '<' optionally followed by '/', followed by letter or number
    let mut i = if data[1] == b'/' { 2 } else { 1 };
    if !is_alnum(data[i]) {
        return (0, LinkKind::NotAutolink);
    }

    // try to find the beginning of an URI
    let mut kind = LinkKind::NotAutolink;
    while i < data.len() && (is_alnum(data[i]) || matches!(data[i], b'.' | b'+' | b'-')) {
        i += 1;
    }

    if i > 1 && i < data.len() && data[i] == b'@' {
        let j = mailto_length(&data[i..]);
        if j != 0 {
            return (i + j, LinkKind::Email);
        }
    }

    if i > 2 && i < data.len() && data[i] == b':' {
        kind = LinkKind::Normal;
        i += 1;
    }

    // complete autolink test: no whitespace or ' or "
    if i >= data.len() {
        kind = LinkKind::NotAutolink;
    } else if kind != LinkKind::NotAutolink {
        let start = i;
        while i < data.len() {
            match data[i] {
                b'\\' => i += 2,
                b'>' | b'\'' | b'"' => break,
                c if is_space(c) => break,
                _ => i += 1,
            }
        }
        if i >= data.len() {
            return (0, LinkKind::NotAutolink);
        }
        if i > start && data[i] == b'>' {
            return (i + 1, kind);
        }
        // one of the forbidden chars has been found
        kind = LinkKind::NotAutolink;
    }

    // look for something looking like a tag end
    match memchr(b'>', &data[i.min(data.len())..]) {
        Some(pos) => (i + pos + 1, kind),
        None => (0, LinkKind::NotAutolink),
    }
}

/// Address part of an e-mail autolink and its closing `>`.
///
/// Less strict than real address syntax: `[-@._a-zA-Z0-9]+` with exactly one `@`.
fn mailto_length(data: &[u8]) -> usize {
    let mut at_signs = 0;
    for (i, &c) in data.iter().enumerate() {
        if is_alnum(c) {
            continue;
        }
        match c {
            b'@' => at_signs += 1,
            b'-' | b'.' | b'_' => {}
            b'>' => return if at_signs == 1 { i + 1 } else { 0 },
            _ => return 0,
        }
    }
    0
}

/// `\`: a backslash escape of a markup byte.
fn escape<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let data = &data[offset..];
    if data.len() < 2 || !ESCAPE_CHARS.contains(&data[1]) {
        return 0;
    }
    ctx.renderer.text(out, &data[1..2]);
    2
}

/// `&`: an entity of the form `&#?[A-Za-z0-9]+;`. A lone `&` is declined.
fn entity<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let data = &data[offset..];

    let mut end = 1;
    if end < data.len() && data[end] == b'#' {
        end += 1;
    }
    let name_start = end;
    while end < data.len() && is_alnum(data[end]) {
        end += 1;
    }
    if end == name_start || end >= data.len() || data[end] != b';' {
        return 0;
    }
    end += 1;

    let renderer = ctx.renderer;
    match renderer.entity {
        Some(render) => render(out, &data[..end], &renderer.opaque),
        None => out.extend_from_slice(&data[..end]),
    }
    end
}

// ============================================================================
// Bare URL autolinks
// ============================================================================

/// `h`, `f`, `m`: a bare `http://`, `https://`, `ftp://` or `mailto:` URL.
fn autolink<T>(out: &mut Output, ctx: &mut Context<'_, T>, data: &[u8], offset: usize) -> usize {
    let renderer = ctx.renderer;
    let Some(render) = renderer.autolink else {
        return 0;
    };
    let original = data;
    let data = &data[offset..];

    if offset > 0 && !is_space(original[offset - 1]) && !is_punct(original[offset - 1]) {
        return 0;
    }
    if !is_safe_link(data) {
        return 0;
    }

    let mut link_end = data.iter().position(|&c| is_space(c)).unwrap_or(data.len());

    // skip punctuation at the end of the link
    if matches!(data[link_end - 1], b'.' | b',' | b';') && data[link_end - 2] != b'\\' {
        link_end -= 1;
    }

    // a closing sign belongs to the link only if it is opened inside the link
    let close = data[link_end - 1];
    let open = match close {
        b'"' => Some(b'"'),
        b'\'' => Some(b'\''),
        b')' => Some(b'('),
        b']' => Some(b'['),
        b'}' => Some(b'{'),
        _ => None,
    };
    if let Some(open) = open {
        let mut open_delim = 1;
        for &b in original[..offset + link_end - 1].iter().rev() {
            if b == b'\n' || open_delim == 0 {
                break;
            }
            if b == open {
                open_delim -= 1;
            } else if b == close {
                open_delim += 1;
            }
        }
        if open_delim == 0 {
            link_end -= 1;
        }
    }

    let mut link = Vec::with_capacity(link_end);
    unescape_text(&mut link, &data[..link_end]);
    if render(out, &link, LinkKind::Normal, &renderer.opaque) {
        link_end
    } else {
        0
    }
}

/// Whether `link` starts with a scheme considered safe, followed by an
/// alphanumeric byte.
pub(crate) fn is_safe_link(link: &[u8]) -> bool {
    SAFE_PREFIXES.iter().any(|prefix| {
        link.len() > prefix.len()
            && link[..prefix.len()].eq_ignore_ascii_case(prefix)
            && is_alnum(link[prefix.len()])
    })
}

/// Copy `src` into `out`, dropping the backslash of each escape pair.
pub(crate) fn unescape_text(out: &mut Vec<u8>, src: &[u8]) {
    let mut i = 0;
    while i < src.len() {
        let start = i;
        while i < src.len() && src[i] != b'\\' {
            i += 1;
        }
        out.extend_from_slice(&src[start..i]);
        if i + 1 >= src.len() {
            break;
        }
        out.push(src[i + 1]);
        i += 2;
    }
}
