//! Renderer configuration: the callback table driven by the parser.
//!
//! A [`Renderer`] holds one optional callback per markup construct plus a
//! caller-owned value of type `T` that is handed to every callback. Leaving a
//! callback unset has a defined meaning per construct family:
//!
//! - **Block callbacks**: the block is parsed but produces no output.
//! - **Span callbacks**: the span is not recognized; its source bytes are
//!   written to the output as plain text. A span callback returning `false`
//!   has the same effect.
//! - **Leaf callbacks** (`entity`, `normal_text`): input bytes are copied
//!   unchanged.
//!
//! The renderer is borrowed immutably for the whole run, so one value can be
//! shared by concurrent calls when `T: Sync`.

use std::ops::{BitOr, BitOrAssign};

/// Output sink shared by every callback.
pub type Output = Vec<u8>;

/// Block that wraps already-rendered content (quote, raw HTML, paragraph, table row).
pub type BlockFn<T> = fn(out: &mut Output, text: &[u8], opaque: &T);
/// Code block with its (possibly empty) info string.
pub type BlockCodeFn<T> = fn(out: &mut Output, text: &[u8], lang: &[u8], opaque: &T);
pub type HeaderFn<T> = fn(out: &mut Output, text: &[u8], level: u8, opaque: &T);
/// Content-free hook (horizontal rule, document header/footer).
pub type HookFn<T> = fn(out: &mut Output, opaque: &T);
pub type ListFn<T> = fn(out: &mut Output, text: &[u8], flags: ListFlags, opaque: &T);
pub type TableFn<T> = fn(out: &mut Output, header: &[u8], body: &[u8], opaque: &T);
pub type TableCellFn<T> = fn(out: &mut Output, text: &[u8], align: Alignment, opaque: &T);

/// Span wrapping rendered inline content; returns `false` to decline.
pub type SpanFn<T> = fn(out: &mut Output, text: &[u8], opaque: &T) -> bool;
pub type AutolinkFn<T> = fn(out: &mut Output, link: &[u8], kind: LinkKind, opaque: &T) -> bool;
/// Link or image: `(link, title, content)` where content is the alt text for images.
pub type LinkFn<T> =
    fn(out: &mut Output, link: &[u8], title: &[u8], content: &[u8], opaque: &T) -> bool;
pub type LineBreakFn<T> = fn(out: &mut Output, opaque: &T) -> bool;

/// Leaf text (entities, plain runs).
pub type LeafFn<T> = fn(out: &mut Output, text: &[u8], opaque: &T);

/// Table of rendering callbacks plus the caller's value.
#[derive(Clone)]
pub struct Renderer<T> {
    // block-level: unset skips the block
    pub block_code: Option<BlockCodeFn<T>>,
    pub block_quote: Option<BlockFn<T>>,
    pub block_html: Option<BlockFn<T>>,
    pub header: Option<HeaderFn<T>>,
    pub hrule: Option<HookFn<T>>,
    pub list: Option<ListFn<T>>,
    pub list_item: Option<ListFn<T>>,
    pub paragraph: Option<BlockFn<T>>,
    pub table: Option<TableFn<T>>,
    pub table_row: Option<BlockFn<T>>,
    pub table_cell: Option<TableCellFn<T>>,

    // span-level: unset or `false` prints the span verbatim
    pub autolink: Option<AutolinkFn<T>>,
    pub code_span: Option<SpanFn<T>>,
    pub double_emphasis: Option<SpanFn<T>>,
    pub emphasis: Option<SpanFn<T>>,
    pub image: Option<LinkFn<T>>,
    pub line_break: Option<LineBreakFn<T>>,
    pub link: Option<LinkFn<T>>,
    pub raw_html_tag: Option<SpanFn<T>>,
    pub triple_emphasis: Option<SpanFn<T>>,
    pub strikethrough: Option<SpanFn<T>>,

    // leaf-level: unset copies input directly into the output
    pub entity: Option<LeafFn<T>>,
    pub normal_text: Option<LeafFn<T>>,

    pub document_header: Option<HookFn<T>>,
    pub document_footer: Option<HookFn<T>>,

    /// Passed back to every callback.
    pub opaque: T,
}

impl<T> Renderer<T> {
    /// Create a renderer with no callbacks installed.
    pub fn new(opaque: T) -> Self {
        Self {
            block_code: None,
            block_quote: None,
            block_html: None,
            header: None,
            hrule: None,
            list: None,
            list_item: None,
            paragraph: None,
            table: None,
            table_row: None,
            table_cell: None,
            autolink: None,
            code_span: None,
            double_emphasis: None,
            emphasis: None,
            image: None,
            line_break: None,
            link: None,
            raw_html_tag: None,
            triple_emphasis: None,
            strikethrough: None,
            entity: None,
            normal_text: None,
            document_header: None,
            document_footer: None,
            opaque,
        }
    }

    /// Whether any callback of the emphasis family is installed.
    #[inline]
    pub fn has_emphasis(&self) -> bool {
        self.emphasis.is_some() || self.double_emphasis.is_some() || self.triple_emphasis.is_some()
    }

    /// Write plain text through `normal_text`, or copy it when unset.
    #[inline]
    pub(crate) fn text(&self, out: &mut Output, text: &[u8]) {
        if text.is_empty() {
            return;
        }
        match self.normal_text {
            Some(cb) => cb(out, text, &self.opaque),
            None => out.extend_from_slice(text),
        }
    }
}

impl<T: Default> Default for Renderer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Optional grammar extensions, combined with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extensions(u32);

impl Extensions {
    /// Ignore emphasis markers inside words.
    pub const NO_INTRA_EMPHASIS: Self = Self(1 << 0);
    /// Pipe tables.
    pub const TABLES: Self = Self(1 << 1);
    /// Fenced code blocks with ``` or ~~~.
    pub const FENCED_CODE: Self = Self(1 << 2);
    /// Bare `http://`, `https://`, `ftp://` and `mailto:` links.
    pub const AUTOLINK: Self = Self(1 << 3);
    /// `~~strikethrough~~`.
    pub const STRIKETHROUGH: Self = Self(1 << 4);
    /// Raw HTML blocks need not be surrounded by blank lines.
    pub const LAX_HTML_BLOCKS: Self = Self(1 << 5);
    /// ATX headers require a space after the `#` run.
    pub const SPACE_HEADERS: Self = Self(1 << 6);

    /// The extension set used by [`markdown_common`](crate::markdown_common).
    pub const COMMON: Self = Self(
        Self::NO_INTRA_EMPHASIS.0
            | Self::TABLES.0
            | Self::FENCED_CODE.0
            | Self::AUTOLINK.0
            | Self::STRIKETHROUGH.0
            | Self::SPACE_HEADERS.0,
    );

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

impl BitOr for Extensions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Extensions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// How an autolink was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    NotAutolink,
    /// URL with a scheme, e.g. `<http://example.com>`.
    Normal,
    /// Bare e-mail address, e.g. `<me@example.com>`.
    Email,
}

/// Flags passed to the list and list item callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListFlags(u8);

impl ListFlags {
    pub const ORDERED: Self = Self(1 << 0);
    /// The item contains block-level content (it was separated by blank lines).
    pub const CONTAINS_BLOCK: Self = Self(1 << 1);
    pub const END_OF_LIST: Self = Self(1 << 2);

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for ListFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Table column alignment taken from the header underline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Right,
    Center,
}

impl Alignment {
    pub(crate) fn with_left(self) -> Self {
        match self {
            Alignment::None | Alignment::Left => Alignment::Left,
            Alignment::Right | Alignment::Center => Alignment::Center,
        }
    }

    pub(crate) fn with_right(self) -> Self {
        match self {
            Alignment::None | Alignment::Right => Alignment::Right,
            Alignment::Left | Alignment::Center => Alignment::Center,
        }
    }
}
