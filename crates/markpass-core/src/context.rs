//! Per-invocation parsing state shared by every grammar production.

use std::ops::{Deref, DerefMut};

use crate::dispatch::DispatchTable;
use crate::error::RenderError;
use crate::reference::ReferenceTable;
use crate::renderer::{Extensions, Renderer};

/// Maximum depth of nested block and inline contexts.
pub const MAX_NESTING: usize = 16;

/// Mutable state for one call to [`render`](crate::render).
///
/// Owned by the pipeline and lent to grammar functions as `&mut Context`.
pub struct Context<'a, T> {
    pub renderer: &'a Renderer<T>,
    pub extensions: Extensions,
    pub refs: ReferenceTable<'a>,
    pub inline: DispatchTable,
    nesting: usize,
    max_nesting: usize,
}

impl<'a, T> Context<'a, T> {
    /// Context at nesting level zero, with the dispatch table built for `renderer`.
    pub fn new(renderer: &'a Renderer<T>, extensions: Extensions, refs: ReferenceTable<'a>) -> Self {
        Self {
            renderer,
            extensions,
            refs,
            inline: DispatchTable::build(renderer, extensions),
            nesting: 0,
            max_nesting: MAX_NESTING,
        }
    }

    /// Whether `extension` is enabled for this render.
    #[inline]
    pub fn has(&self, extension: Extensions) -> bool {
        self.extensions.contains(extension)
    }

    /// Current nesting depth.
    #[inline]
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Whether entering one more level would exceed the ceiling.
    #[inline]
    pub(crate) fn nesting_exhausted(&self) -> bool {
        self.nesting >= self.max_nesting
    }

    /// Enter one nesting level. The level is left when the guard drops.
    ///
    /// Callers check [`nesting_exhausted`](Self::nesting_exhausted) first.
    #[inline]
    pub(crate) fn enter(&mut self) -> Nested<'_, 'a, T> {
        debug_assert!(self.nesting < self.max_nesting);
        self.nesting += 1;
        Nested { ctx: self }
    }

    /// Post-condition of a complete run: every level entered was left.
    pub(crate) fn finish(&self) -> Result<(), RenderError> {
        if self.nesting != 0 {
            tracing::error!(depth = self.nesting, "nesting level did not end at zero");
            return Err(RenderError::NestingImbalance {
                depth: self.nesting,
            });
        }
        Ok(())
    }
}

/// Scope guard for one nesting level; derefs to the context.
pub(crate) struct Nested<'c, 'a, T> {
    ctx: &'c mut Context<'a, T>,
}

impl<'a, T> Deref for Nested<'_, 'a, T> {
    type Target = Context<'a, T>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl<T> DerefMut for Nested<'_, '_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl<T> Drop for Nested<'_, '_, T> {
    fn drop(&mut self) {
        self.ctx.nesting -= 1;
    }
}
