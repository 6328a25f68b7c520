//! Errors surfaced by the rendering pipeline.
//!
//! Grammar rejections never show up here: a construct that fails to match
//! falls back to plain text. The only error is an internal-consistency fault
//! detected after the second pass.

/// Fatal fault raised by [`render`](crate::render).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// The nesting counter did not return to zero: some production entered a
    /// nested context without leaving it.
    #[error("nesting level did not end at zero (left at {depth})")]
    NestingImbalance {
        /// Counter value after the top-level call returned.
        depth: usize,
    },
}
