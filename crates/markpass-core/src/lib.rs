//! # markpass core
//!
//! A two-pass Markdown processor driven by caller-supplied rendering callbacks.
//!
//! The first pass normalizes the input (tabs expanded, line endings unified)
//! and collects link reference definitions. The second pass runs the block
//! grammar over the normalized text; inline markup is recognized through a
//! byte-indexed dispatch table built from the callbacks the renderer provides.
//!
//! ## Quick Start
//!
//! ```rust
//! use markpass_core::{html, render, Extensions};
//!
//! let renderer = html::html_renderer(html::HtmlFlags::empty());
//! let input = b"# Hello\n\nSee [the docs][docs].\n\n[docs]: http://example.com/\n";
//! let out = render(input, Some(&renderer), Extensions::COMMON).unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "<h1>Hello</h1>\n\n<p>See <a href=\"http://example.com/\">the docs</a>.</p>\n"
//! );
//! ```
//!
//! ## Custom renderers
//!
//! A [`Renderer`] is a table of optional callbacks plus a value of your choice
//! handed back to each of them. Constructs without a callback are either
//! dropped (blocks) or left as plain text (spans):
//!
//! ```rust
//! use markpass_core::{render, Extensions, Output, Renderer};
//!
//! fn emphasis(out: &mut Output, text: &[u8], _: &()) -> bool {
//!     out.extend_from_slice(b"_");
//!     out.extend_from_slice(text);
//!     out.extend_from_slice(b"_");
//!     true
//! }
//!
//! fn paragraph(out: &mut Output, text: &[u8], _: &()) {
//!     out.extend_from_slice(text);
//!     out.push(b'\n');
//! }
//!
//! let mut renderer = Renderer::new(());
//! renderer.emphasis = Some(emphasis);
//! renderer.paragraph = Some(paragraph);
//!
//! let out = render(b"*a* **b**", Some(&renderer), Extensions::empty()).unwrap();
//! assert_eq!(out, b"_a_ **b**\n");
//! ```

pub mod block;
pub mod chars;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod html;
pub mod inline;
pub mod normalize;
pub mod reference;
pub mod renderer;

pub use context::{Context, MAX_NESTING};
pub use dispatch::{DispatchTable, InlineKind};
pub use error::RenderError;
pub use html::{html_renderer, markdown_basic, markdown_common, HtmlFlags, HtmlOptions};
pub use normalize::{expand_tabs, normalize, Normalized, TAB_SIZE};
pub use reference::{parse_reference, Reference, ReferenceTable};
pub use renderer::{Alignment, Extensions, LinkKind, ListFlags, Output, Renderer};

use block::parse_block;

/// Render `input` with the given callbacks and extensions.
///
/// Without a renderer there is nothing to call, and the result is empty.
/// An error means a grammar production left the nesting counter unbalanced,
/// which is a bug in this crate rather than a property of the input.
pub fn render<T>(
    input: &[u8],
    renderer: Option<&Renderer<T>>,
    extensions: Extensions,
) -> Result<Vec<u8>, RenderError> {
    let Some(renderer) = renderer else {
        tracing::debug!(input_len = input.len(), "no renderer configured, output is empty");
        return Ok(Vec::new());
    };

    let Normalized { text, references } = normalize(input);
    let mut ctx = Context::new(renderer, extensions, references);

    let mut out = Vec::with_capacity(text.len() + text.len() / 2);

    if let Some(document_header) = renderer.document_header {
        document_header(&mut out, &renderer.opaque);
    }

    if !text.is_empty() {
        parse_block(&mut out, &mut ctx, &text);
    }

    if let Some(document_footer) = renderer.document_footer {
        document_footer(&mut out, &renderer.opaque);
    }

    ctx.finish()?;

    tracing::debug!(
        extensions = extensions.bits(),
        output_len = out.len(),
        "rendered document"
    );
    Ok(out)
}

/// [`render`] for string input, returning a string.
///
/// Output is valid UTF-8 whenever the callbacks only write valid UTF-8;
/// anything else is replaced lossily.
pub fn render_str<T>(
    input: &str,
    renderer: Option<&Renderer<T>>,
    extensions: Extensions,
) -> Result<String, RenderError> {
    let out = render(input.as_bytes(), renderer, extensions)?;
    Ok(match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
