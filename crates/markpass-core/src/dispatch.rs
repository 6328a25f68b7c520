//! Byte-indexed table of active inline productions.

use crate::renderer::{Extensions, Renderer};

/// Inline grammar production triggered by a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    /// `*`, `_`, and `~` runs.
    Emphasis,
    CodeSpan,
    /// Newline preceded by two spaces.
    LineBreak,
    /// Links and images, `[`.
    Link,
    /// `<...>`: autolinks and raw inline HTML.
    LeftAngle,
    Escape,
    Entity,
    /// Bare URLs starting with `h`, `f` or `m`.
    Autolink,
}

/// One optional production per byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    slots: [Option<InlineKind>; 256],
}

impl DispatchTable {
    /// Install only the productions the renderer can actually render.
    pub fn build<T>(renderer: &Renderer<T>, extensions: Extensions) -> Self {
        let mut table = Self {
            slots: [None; 256],
        };

        if renderer.has_emphasis() {
            table.set(b'*', InlineKind::Emphasis);
            table.set(b'_', InlineKind::Emphasis);
            if renderer.strikethrough.is_some() && extensions.contains(Extensions::STRIKETHROUGH) {
                table.set(b'~', InlineKind::Emphasis);
            }
        }
        if renderer.code_span.is_some() {
            table.set(b'`', InlineKind::CodeSpan);
        }
        if renderer.line_break.is_some() {
            table.set(b'\n', InlineKind::LineBreak);
        }
        if renderer.image.is_some() || renderer.link.is_some() {
            table.set(b'[', InlineKind::Link);
        }
        table.set(b'<', InlineKind::LeftAngle);
        table.set(b'\\', InlineKind::Escape);
        table.set(b'&', InlineKind::Entity);

        if extensions.contains(Extensions::AUTOLINK) {
            for &c in b"hHfFmM" {
                table.set(c, InlineKind::Autolink);
            }
        }

        table
    }

    #[inline(always)]
    pub fn get(&self, c: u8) -> Option<InlineKind> {
        self.slots[c as usize]
    }

    /// Whether `c` triggers any production.
    #[inline(always)]
    pub fn is_active(&self, c: u8) -> bool {
        self.slots[c as usize].is_some()
    }

    #[inline]
    fn set(&mut self, c: u8, kind: InlineKind) {
        self.slots[c as usize] = Some(kind);
    }
}
