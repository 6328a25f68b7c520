//! Python bindings for the markpass Markdown renderer.

use markpass_core::{
    html_renderer, normalize, render_str, Extensions, HtmlFlags, HtmlOptions,
    Renderer as CoreRenderer,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

// ============================================================================
// Flags
// ============================================================================

const EXTENSION_BITS: &[(&str, Extensions)] = &[
    ("EXT_NO_INTRA_EMPHASIS", Extensions::NO_INTRA_EMPHASIS),
    ("EXT_TABLES", Extensions::TABLES),
    ("EXT_FENCED_CODE", Extensions::FENCED_CODE),
    ("EXT_AUTOLINK", Extensions::AUTOLINK),
    ("EXT_STRIKETHROUGH", Extensions::STRIKETHROUGH),
    ("EXT_LAX_HTML_BLOCKS", Extensions::LAX_HTML_BLOCKS),
    ("EXT_SPACE_HEADERS", Extensions::SPACE_HEADERS),
];

const HTML_FLAG_BITS: &[(&str, HtmlFlags)] = &[
    ("HTML_SKIP_HTML", HtmlFlags::SKIP_HTML),
    ("HTML_SKIP_STYLE", HtmlFlags::SKIP_STYLE),
    ("HTML_SKIP_IMAGES", HtmlFlags::SKIP_IMAGES),
    ("HTML_SKIP_LINKS", HtmlFlags::SKIP_LINKS),
    ("HTML_SAFELINK", HtmlFlags::SAFELINK),
    ("HTML_GITHUB_BLOCKCODE", HtmlFlags::GITHUB_BLOCKCODE),
    ("HTML_USE_XHTML", HtmlFlags::USE_XHTML),
];

fn extensions_from_bits(bits: u32) -> PyResult<Extensions> {
    let known = EXTENSION_BITS.iter().fold(0, |acc, (_, e)| acc | e.bits());
    if bits & !known != 0 {
        return Err(PyValueError::new_err(format!(
            "unknown extension bits: {:#x}",
            bits & !known
        )));
    }
    Ok(Extensions::from_bits(bits))
}

fn html_flags_from_bits(bits: u32) -> PyResult<HtmlFlags> {
    let known = HTML_FLAG_BITS.iter().fold(0, |acc, (_, f)| acc | f.bits());
    if bits & !known != 0 {
        return Err(PyValueError::new_err(format!(
            "unknown HTML flag bits: {:#x}",
            bits & !known
        )));
    }
    Ok(HtmlFlags::from_bits(bits))
}

// ============================================================================
// Renderer
// ============================================================================

/// Reusable HTML renderer.
///
/// Args:
///     extensions: EXT_* bits (default: EXT_COMMON)
///     flags: HTML_* bits (default: 0)
#[pyclass(frozen, name = "HtmlRenderer")]
pub struct PyHtmlRenderer {
    renderer: CoreRenderer<HtmlOptions>,
    extensions: Extensions,
}

#[pymethods]
impl PyHtmlRenderer {
    #[new]
    #[pyo3(signature = (extensions=None, flags=0), text_signature = "(extensions=None, flags=0)")]
    fn new(extensions: Option<u32>, flags: u32) -> PyResult<Self> {
        let extensions = match extensions {
            Some(bits) => extensions_from_bits(bits)?,
            None => Extensions::COMMON,
        };
        Ok(PyHtmlRenderer {
            renderer: html_renderer(html_flags_from_bits(flags)?),
            extensions,
        })
    }

    /// Render a Markdown string to HTML. Raises RuntimeError on an internal fault.
    #[pyo3(text_signature = "(self, text)")]
    fn render(&self, py: Python<'_>, text: &str) -> PyResult<String> {
        py.allow_threads(|| render_str(text, Some(&self.renderer), self.extensions))
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    #[getter]
    fn extensions(&self) -> u32 {
        self.extensions.bits()
    }

    #[getter]
    fn flags(&self) -> u32 {
        self.renderer.opaque.flags.bits()
    }

    fn __repr__(&self) -> String {
        format!(
            "HtmlRenderer(extensions={:#x}, flags={:#x})",
            self.extensions.bits(),
            self.renderer.opaque.flags.bits()
        )
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Render Markdown to HTML.
///
/// Args:
///     text: Markdown source
///     extensions: EXT_* bits (default: EXT_COMMON)
///     flags: HTML_* bits (default: 0)
///
/// Returns:
///     str: Rendered HTML
///
/// Raises:
///     ValueError: On unknown extension or flag bits
///     RuntimeError: On an internal rendering fault
#[pyfunction]
#[pyo3(signature = (text, extensions=None, flags=0), text_signature = "(text, extensions=None, flags=0)")]
fn render_html(py: Python<'_>, text: &str, extensions: Option<u32>, flags: u32) -> PyResult<String> {
    PyHtmlRenderer::new(extensions, flags)?.render(py, text)
}

/// Render Markdown to HTML without extensions.
#[pyfunction]
#[pyo3(text_signature = "(text)")]
fn markdown_basic(py: Python<'_>, text: &str) -> PyResult<String> {
    render_html(py, text, Some(0), 0)
}

/// Render Markdown to XHTML-style HTML with the common extensions.
#[pyfunction]
#[pyo3(text_signature = "(text)")]
fn markdown_common(py: Python<'_>, text: &str) -> PyResult<String> {
    render_html(
        py,
        text,
        Some(Extensions::COMMON.bits()),
        HtmlFlags::USE_XHTML.bits(),
    )
}

/// Link reference definitions found in a document.
///
/// Returns:
///     list[tuple[str, str, str]]: (id, link, title), ids lowercased and sorted
#[pyfunction]
#[pyo3(text_signature = "(text)")]
fn references(text: &str) -> Vec<(String, String, String)> {
    let normalized = normalize(text.as_bytes());
    let mut refs: Vec<_> = normalized
        .references
        .iter()
        .map(|(id, r)| {
            (
                id.to_string(),
                String::from_utf8_lossy(r.link).into_owned(),
                String::from_utf8_lossy(r.title).into_owned(),
            )
        })
        .collect();
    refs.sort();
    refs
}

// ============================================================================
// Module
// ============================================================================

/// markpass - Two-pass Markdown renderer.
#[pymodule]
fn pymp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyHtmlRenderer>()?;
    m.add_function(wrap_pyfunction!(render_html, m)?)?;
    m.add_function(wrap_pyfunction!(markdown_basic, m)?)?;
    m.add_function(wrap_pyfunction!(markdown_common, m)?)?;
    m.add_function(wrap_pyfunction!(references, m)?)?;

    for (name, ext) in EXTENSION_BITS {
        m.add(*name, ext.bits())?;
    }
    m.add("EXT_COMMON", Extensions::COMMON.bits())?;
    for (name, flag) in HTML_FLAG_BITS {
        m.add(*name, flag.bits())?;
    }
    Ok(())
}
