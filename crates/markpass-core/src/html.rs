//! HTML renderer.
//!
//! [`html_renderer`] returns a [`Renderer`] whose callbacks write HTML
//! fragments. Text and attribute values are escaped; raw HTML from the input
//! passes through unless one of the `SKIP_*` flags filters it.
//!
//! ```rust
//! use markpass_core::{html, render, Extensions};
//!
//! let renderer = html::html_renderer(html::HtmlFlags::USE_XHTML);
//! let out = render(b"Hello *world*", Some(&renderer), Extensions::empty()).unwrap();
//! assert_eq!(out, b"<p>Hello <em>world</em></p>\n");
//! ```

use std::ops::{BitOr, BitOrAssign};

use crate::chars::is_space;
use crate::error::RenderError;
use crate::inline::is_safe_link;
use crate::renderer::{Alignment, LinkKind, ListFlags, Output, Renderer};
use crate::{render, Extensions};

/// Options of the HTML renderer, combined with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HtmlFlags(u32);

impl HtmlFlags {
    /// Drop raw HTML blocks and inline tags from the input.
    pub const SKIP_HTML: Self = Self(1 << 0);
    /// Drop inline `<style>` tags.
    pub const SKIP_STYLE: Self = Self(1 << 1);
    /// Leave images as plain text and drop inline `<img>` tags.
    pub const SKIP_IMAGES: Self = Self(1 << 2);
    /// Leave links as plain text and drop inline `<a>` tags.
    pub const SKIP_LINKS: Self = Self(1 << 3);
    /// Only turn links with a known safe scheme into anchors.
    pub const SAFELINK: Self = Self(1 << 4);
    /// `<pre lang="..">` code blocks instead of a `class` attribute.
    pub const GITHUB_BLOCKCODE: Self = Self(1 << 5);
    /// Close void elements with ` />`.
    pub const USE_XHTML: Self = Self(1 << 6);

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for HtmlFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for HtmlFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// State handed to every HTML callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    pub flags: HtmlFlags,
    /// How void elements end: `">"` or `" />"`.
    close_tag: &'static str,
}

impl HtmlOptions {
    /// Options for `flags`, picking the void-element closer from `USE_XHTML`.
    pub fn new(flags: HtmlFlags) -> Self {
        let close_tag = if flags.contains(HtmlFlags::USE_XHTML) {
            " />"
        } else {
            ">"
        };
        Self { flags, close_tag }
    }

    #[inline]
    fn has(&self, flag: HtmlFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Build a renderer that writes HTML.
pub fn html_renderer(flags: HtmlFlags) -> Renderer<HtmlOptions> {
    let mut r = Renderer::new(HtmlOptions::new(flags));

    r.block_code = Some(block_code);
    r.block_quote = Some(block_quote);
    if !flags.contains(HtmlFlags::SKIP_HTML) {
        r.block_html = Some(raw_block);
    }
    r.header = Some(header);
    r.hrule = Some(hrule);
    r.list = Some(list);
    r.list_item = Some(list_item);
    r.paragraph = Some(paragraph);
    r.table = Some(table);
    r.table_row = Some(table_row);
    r.table_cell = Some(table_cell);

    r.autolink = Some(autolink);
    r.code_span = Some(code_span);
    r.double_emphasis = Some(double_emphasis);
    r.emphasis = Some(emphasis);
    if !flags.contains(HtmlFlags::SKIP_IMAGES) {
        r.image = Some(image);
    }
    r.line_break = Some(line_break);
    if !flags.contains(HtmlFlags::SKIP_LINKS) {
        r.link = Some(link);
    }
    r.raw_html_tag = Some(raw_tag);
    r.triple_emphasis = Some(triple_emphasis);
    r.strikethrough = Some(strikethrough);

    r.normal_text = Some(normal_text);
    r
}

/// Render with the HTML renderer and no extensions.
pub fn markdown_basic(input: &[u8]) -> Result<Vec<u8>, RenderError> {
    let renderer = html_renderer(HtmlFlags::empty());
    render(input, Some(&renderer), Extensions::empty())
}

/// Render XHTML-style output with the common extension set.
pub fn markdown_common(input: &[u8]) -> Result<Vec<u8>, RenderError> {
    let renderer = html_renderer(HtmlFlags::USE_XHTML);
    render(input, Some(&renderer), Extensions::COMMON)
}

/// Escape `<`, `>`, `&` and `"`.
pub fn escape_html(out: &mut Output, src: &[u8]) {
    let mut start = 0;
    for (i, &c) in src.iter().enumerate() {
        let entity: &[u8] = match c {
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'&' => b"&amp;",
            b'"' => b"&quot;",
            _ => continue,
        };
        out.extend_from_slice(&src[start..i]);
        out.extend_from_slice(entity);
        start = i + 1;
    }
    out.extend_from_slice(&src[start..]);
}

/// Blocks after the first start on a new line.
#[inline]
fn separate(out: &mut Output) {
    if !out.is_empty() {
        out.push(b'\n');
    }
}

// ============================================================================
// Block callbacks
// ============================================================================

fn block_code(out: &mut Output, text: &[u8], lang: &[u8], opts: &HtmlOptions) {
    separate(out);

    if lang.is_empty() {
        out.extend_from_slice(b"<pre><code>");
    } else if opts.has(HtmlFlags::GITHUB_BLOCKCODE) {
        // only the first word names the language
        let word = lang.split(|&c| is_space(c)).next().unwrap_or_default();
        out.extend_from_slice(b"<pre lang=\"");
        escape_html(out, word.strip_prefix(b".").unwrap_or(word));
        out.extend_from_slice(b"\"><code>");
    } else {
        out.extend_from_slice(b"<pre><code class=\"");
        let classes = lang.split(|&c| is_space(c)).filter(|w| !w.is_empty());
        for (n, class) in classes.enumerate() {
            if n > 0 {
                out.push(b' ');
            }
            escape_html(out, class.strip_prefix(b".").unwrap_or(class));
        }
        out.extend_from_slice(b"\">");
    }

    escape_html(out, text);
    out.extend_from_slice(b"</code></pre>\n");
}

fn block_quote(out: &mut Output, text: &[u8], _opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(b"<blockquote>\n");
    out.extend_from_slice(text);
    out.extend_from_slice(b"</blockquote>\n");
}

fn raw_block(out: &mut Output, text: &[u8], _opts: &HtmlOptions) {
    let start = text.iter().position(|&c| c != b'\n').unwrap_or(text.len());
    let end = text.iter().rposition(|&c| c != b'\n').map_or(start, |p| p + 1);
    if start >= end {
        return;
    }
    separate(out);
    out.extend_from_slice(&text[start..end]);
    out.push(b'\n');
}

fn header(out: &mut Output, text: &[u8], level: u8, _opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(format!("<h{level}>").as_bytes());
    out.extend_from_slice(text);
    out.extend_from_slice(format!("</h{level}>\n").as_bytes());
}

fn hrule(out: &mut Output, opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(b"<hr");
    out.extend_from_slice(opts.close_tag.as_bytes());
    out.push(b'\n');
}

fn list(out: &mut Output, text: &[u8], flags: ListFlags, _opts: &HtmlOptions) {
    separate(out);
    let tag: &[u8] = if flags.contains(ListFlags::ORDERED) {
        b"ol"
    } else {
        b"ul"
    };
    out.push(b'<');
    out.extend_from_slice(tag);
    out.extend_from_slice(b">\n");
    out.extend_from_slice(text);
    out.extend_from_slice(b"</");
    out.extend_from_slice(tag);
    out.extend_from_slice(b">\n");
}

fn list_item(out: &mut Output, text: &[u8], _flags: ListFlags, _opts: &HtmlOptions) {
    let end = text.iter().rposition(|&c| c != b'\n').map_or(0, |p| p + 1);
    out.extend_from_slice(b"<li>");
    out.extend_from_slice(&text[..end]);
    out.extend_from_slice(b"</li>\n");
}

fn paragraph(out: &mut Output, text: &[u8], _opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(b"<p>");
    out.extend_from_slice(text);
    out.extend_from_slice(b"</p>\n");
}

fn table(out: &mut Output, header: &[u8], body: &[u8], _opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(b"<table>\n<thead>\n");
    out.extend_from_slice(header);
    out.extend_from_slice(b"\n</thead>\n\n<tbody>\n");
    out.extend_from_slice(body);
    out.extend_from_slice(b"\n</tbody>\n</table>\n");
}

fn table_row(out: &mut Output, text: &[u8], _opts: &HtmlOptions) {
    separate(out);
    out.extend_from_slice(b"<tr>\n");
    out.extend_from_slice(text);
    out.extend_from_slice(b"\n</tr>");
}

fn table_cell(out: &mut Output, text: &[u8], align: Alignment, _opts: &HtmlOptions) {
    separate(out);
    let open: &[u8] = match align {
        Alignment::None => b"<td>",
        Alignment::Left => b"<td align=\"left\">",
        Alignment::Right => b"<td align=\"right\">",
        Alignment::Center => b"<td align=\"center\">",
    };
    out.extend_from_slice(open);
    out.extend_from_slice(text);
    out.extend_from_slice(b"</td>");
}

// ============================================================================
// Span callbacks
// ============================================================================

fn autolink(out: &mut Output, link: &[u8], kind: LinkKind, opts: &HtmlOptions) -> bool {
    if link.is_empty() {
        return false;
    }
    if opts.has(HtmlFlags::SAFELINK) && kind != LinkKind::Email && !is_safe_link(link) {
        return false;
    }

    out.extend_from_slice(b"<a href=\"");
    if kind == LinkKind::Email {
        out.extend_from_slice(b"mailto:");
    }
    escape_html(out, link);
    out.extend_from_slice(b"\">");

    // show addresses given as mailto URIs without the scheme
    let shown = link
        .strip_prefix(b"mailto://")
        .or_else(|| link.strip_prefix(b"mailto:"))
        .unwrap_or(link);
    escape_html(out, shown);
    out.extend_from_slice(b"</a>");
    true
}

fn code_span(out: &mut Output, text: &[u8], _opts: &HtmlOptions) -> bool {
    out.extend_from_slice(b"<code>");
    escape_html(out, text);
    out.extend_from_slice(b"</code>");
    true
}

/// Wrap non-empty `text` between `open` and `close`.
fn wrap(out: &mut Output, text: &[u8], open: &[u8], close: &[u8]) -> bool {
    if text.is_empty() {
        return false;
    }
    out.extend_from_slice(open);
    out.extend_from_slice(text);
    out.extend_from_slice(close);
    true
}

fn emphasis(out: &mut Output, text: &[u8], _opts: &HtmlOptions) -> bool {
    wrap(out, text, b"<em>", b"</em>")
}

fn double_emphasis(out: &mut Output, text: &[u8], _opts: &HtmlOptions) -> bool {
    wrap(out, text, b"<strong>", b"</strong>")
}

fn triple_emphasis(out: &mut Output, text: &[u8], _opts: &HtmlOptions) -> bool {
    wrap(out, text, b"<strong><em>", b"</em></strong>")
}

fn strikethrough(out: &mut Output, text: &[u8], _opts: &HtmlOptions) -> bool {
    wrap(out, text, b"<del>", b"</del>")
}

fn image(out: &mut Output, link: &[u8], title: &[u8], alt: &[u8], opts: &HtmlOptions) -> bool {
    if link.is_empty() {
        return false;
    }
    out.extend_from_slice(b"<img src=\"");
    escape_html(out, link);
    out.extend_from_slice(b"\" alt=\"");
    escape_html(out, alt);
    if !title.is_empty() {
        out.extend_from_slice(b"\" title=\"");
        escape_html(out, title);
    }
    out.push(b'"');
    out.extend_from_slice(opts.close_tag.as_bytes());
    true
}

fn line_break(out: &mut Output, opts: &HtmlOptions) -> bool {
    out.extend_from_slice(b"<br");
    out.extend_from_slice(opts.close_tag.as_bytes());
    out.push(b'\n');
    true
}

fn link(out: &mut Output, link: &[u8], title: &[u8], content: &[u8], opts: &HtmlOptions) -> bool {
    if opts.has(HtmlFlags::SAFELINK) && !is_safe_link(link) {
        return false;
    }
    out.extend_from_slice(b"<a href=\"");
    escape_html(out, link);
    if !title.is_empty() {
        out.extend_from_slice(b"\" title=\"");
        escape_html(out, title);
    }
    out.extend_from_slice(b"\">");
    out.extend_from_slice(content);
    out.extend_from_slice(b"</a>");
    true
}

fn raw_tag(out: &mut Output, tag: &[u8], opts: &HtmlOptions) -> bool {
    let skipped = opts.has(HtmlFlags::SKIP_HTML)
        || (opts.has(HtmlFlags::SKIP_STYLE) && is_html_tag(tag, b"style"))
        || (opts.has(HtmlFlags::SKIP_LINKS) && is_html_tag(tag, b"a"))
        || (opts.has(HtmlFlags::SKIP_IMAGES) && is_html_tag(tag, b"img"));
    if !skipped {
        out.extend_from_slice(tag);
    }
    true
}

fn normal_text(out: &mut Output, text: &[u8], _opts: &HtmlOptions) {
    escape_html(out, text);
}

/// Whether `tag` is an opening or closing tag named `name`.
fn is_html_tag(tag: &[u8], name: &[u8]) -> bool {
    let Some(rest) = tag.strip_prefix(b"<") else {
        return false;
    };
    let rest = trim_start(rest);
    let rest = trim_start(rest.strip_prefix(b"/").unwrap_or(rest));

    if rest.len() <= name.len() || !rest[..name.len()].eq_ignore_ascii_case(name) {
        return false;
    }
    let next = rest[name.len()];
    is_space(next) || next == b'>'
}

fn trim_start(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|&c| !is_space(c)).unwrap_or(data.len());
    &data[start..]
}
