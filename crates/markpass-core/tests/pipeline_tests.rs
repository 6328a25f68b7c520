//! Integration tests for the pipeline: dispatch table, renderer callbacks,
//! and the nesting ceiling

use std::cell::RefCell;

use markpass_core::{
    html_renderer, render, render_str, DispatchTable, Extensions, HtmlFlags, InlineKind, Output,
    Renderer, MAX_NESTING,
};
use pretty_assertions::assert_eq;

/// Callback arguments recorded by the test renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Text(String),
    Link {
        link: String,
        title: String,
        content: String,
    },
    Paragraph(String),
    Header,
    Footer,
}

type Log = RefCell<Vec<Call>>;

fn s(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn record_text(out: &mut Output, text: &[u8], log: &Log) {
    log.borrow_mut().push(Call::Text(s(text)));
    out.extend_from_slice(text);
}

fn record_link(out: &mut Output, link: &[u8], title: &[u8], content: &[u8], log: &Log) -> bool {
    log.borrow_mut().push(Call::Link {
        link: s(link),
        title: s(title),
        content: s(content),
    });
    out.extend_from_slice(b"<link>");
    true
}

fn record_paragraph(out: &mut Output, text: &[u8], log: &Log) {
    log.borrow_mut().push(Call::Paragraph(s(text)));
    out.extend_from_slice(text);
}

fn record_header(out: &mut Output, log: &Log) {
    log.borrow_mut().push(Call::Header);
    out.extend_from_slice(b"[");
}

fn record_footer(out: &mut Output, log: &Log) {
    log.borrow_mut().push(Call::Footer);
    out.extend_from_slice(b"]");
}

fn open_doc(out: &mut Output, _: &()) {
    out.extend_from_slice(b"<doc>");
}

fn close_doc(out: &mut Output, _: &()) {
    out.extend_from_slice(b"</doc>");
}

fn noop_break(_: &mut Output, _: &()) -> bool {
    true
}

fn noop_span(_: &mut Output, _: &[u8], _: &()) -> bool {
    true
}

fn noop_link(_: &mut Output, _: &[u8], _: &[u8], _: &[u8], _: &()) -> bool {
    true
}

// ============================================================================
// Dispatch Table
// ============================================================================

#[test]
fn test_dispatch_without_callbacks() {
    let renderer = Renderer::new(());
    let all = Extensions::COMMON | Extensions::LAX_HTML_BLOCKS;
    let table = DispatchTable::build(&renderer, all);

    for c in [b'*', b'_', b'~', b'`', b'\n', b'['] {
        assert_eq!(table.get(c), None, "slot {:?}", c as char);
    }
    assert_eq!(table.get(b'<'), Some(InlineKind::LeftAngle));
    assert_eq!(table.get(b'\\'), Some(InlineKind::Escape));
    assert_eq!(table.get(b'&'), Some(InlineKind::Entity));
    for c in *b"hHfFmM" {
        assert_eq!(table.get(c), Some(InlineKind::Autolink));
    }
}

#[test]
fn test_dispatch_autolink_needs_extension() {
    let renderer = Renderer::new(());
    let table = DispatchTable::build(&renderer, Extensions::empty());
    assert!(!table.is_active(b'h'));
    assert!(!table.is_active(b'M'));
    assert!(!table.is_active(b'a'));
}

#[test]
fn test_dispatch_emphasis_family() {
    let mut renderer = Renderer::new(());
    renderer.triple_emphasis = Some(noop_span);
    let table = DispatchTable::build(&renderer, Extensions::STRIKETHROUGH);
    assert_eq!(table.get(b'*'), Some(InlineKind::Emphasis));
    assert_eq!(table.get(b'_'), Some(InlineKind::Emphasis));
    // no strikethrough callback
    assert_eq!(table.get(b'~'), None);

    renderer.strikethrough = Some(noop_span);
    let table = DispatchTable::build(&renderer, Extensions::empty());
    assert_eq!(table.get(b'~'), None);

    let table = DispatchTable::build(&renderer, Extensions::STRIKETHROUGH);
    assert_eq!(table.get(b'~'), Some(InlineKind::Emphasis));
}

#[test]
fn test_dispatch_strikethrough_alone_is_not_emphasis() {
    let mut renderer = Renderer::new(());
    renderer.strikethrough = Some(noop_span);
    let table = DispatchTable::build(&renderer, Extensions::STRIKETHROUGH);
    assert_eq!(table.get(b'~'), None);
    assert_eq!(table.get(b'*'), None);
}

#[test]
fn test_dispatch_span_callbacks() {
    let mut renderer = Renderer::new(());
    renderer.code_span = Some(noop_span);
    renderer.image = Some(noop_link);
    renderer.line_break = Some(noop_break);
    let table = DispatchTable::build(&renderer, Extensions::empty());
    assert_eq!(table.get(b'`'), Some(InlineKind::CodeSpan));
    assert_eq!(table.get(b'['), Some(InlineKind::Link));
    assert_eq!(table.get(b'\n'), Some(InlineKind::LineBreak));
}

#[test]
fn test_dispatch_html_renderer() {
    let renderer = html_renderer(HtmlFlags::SKIP_LINKS | HtmlFlags::SKIP_IMAGES);
    let table = DispatchTable::build(&renderer, Extensions::COMMON);
    assert_eq!(table.get(b'['), None);
    assert_eq!(table.get(b'~'), Some(InlineKind::Emphasis));
    assert_eq!(table.get(b'`'), Some(InlineKind::CodeSpan));
}

// ============================================================================
// End-to-End
// ============================================================================

#[test]
fn test_reference_link_end_to_end() {
    let mut renderer = Renderer::new(Log::default());
    renderer.link = Some(record_link);
    renderer.normal_text = Some(record_text);

    let input = b"[1]: http://example.com \"Example\"\nSee [link][1].\n";
    render(input, Some(&renderer), Extensions::empty()).unwrap();

    let calls = renderer.opaque.into_inner();
    let links: Vec<&Call> = calls
        .iter()
        .filter(|c| matches!(c, Call::Link { .. }))
        .collect();
    assert_eq!(
        links,
        vec![&Call::Link {
            link: "http://example.com".into(),
            title: "Example".into(),
            content: "link".into(),
        }]
    );

    for call in &calls {
        if let Call::Text(text) = call {
            assert!(!text.contains("[1]:"), "definition leaked: {text:?}");
            assert!(!text.contains("example.com"), "definition leaked: {text:?}");
        }
    }
}

#[test]
fn test_paragraph_receives_rendered_inline() {
    let mut renderer = Renderer::new(Log::default());
    renderer.link = Some(record_link);
    renderer.paragraph = Some(record_paragraph);

    let input = b"[r]: /r\n\nA [r] here.\n";
    let out = render(input, Some(&renderer), Extensions::empty()).unwrap();
    assert_eq!(out, b"A <link> here.");

    let calls = renderer.opaque.into_inner();
    assert_eq!(calls.last(), Some(&Call::Paragraph("A <link> here.".into())));
}

#[test]
fn test_absent_renderer_yields_empty_output() {
    for input in [&b""[..], b"# Title\n\ntext", b"[1]: /x\n", b"\t\r\n"] {
        let out = render::<()>(input, None, Extensions::COMMON).unwrap();
        assert!(out.is_empty());
    }
}

#[test]
fn test_empty_renderer_drops_blocks() {
    let renderer = Renderer::new(());
    let out = render(b"# Title\n\n* item\n\ntext\n", Some(&renderer), Extensions::COMMON);
    assert_eq!(out, Ok(Vec::new()));
}

#[test]
fn test_document_hooks_wrap_output() {
    let mut renderer = Renderer::new(Log::default());
    renderer.document_header = Some(record_header);
    renderer.document_footer = Some(record_footer);
    renderer.paragraph = Some(record_paragraph);

    let out = render(b"body", Some(&renderer), Extensions::empty()).unwrap();
    assert_eq!(out, b"[body]");
    assert_eq!(
        renderer.opaque.into_inner(),
        vec![Call::Header, Call::Paragraph("body".into()), Call::Footer]
    );
}

#[test]
fn test_document_hooks_run_on_empty_input() {
    let mut renderer = Renderer::new(());
    renderer.document_header = Some(open_doc);
    renderer.document_footer = Some(close_doc);
    let out = render(b"", Some(&renderer), Extensions::empty()).unwrap();
    assert_eq!(out, b"<doc></doc>");
}

#[test]
fn test_reference_lookup_is_case_insensitive() {
    let renderer = html_renderer(HtmlFlags::empty());
    let out = render_str(
        "[Foo]: /a\n\n[x][FOO] [foo]\n",
        Some(&renderer),
        Extensions::empty(),
    )
    .unwrap();
    assert_eq!(out, "<p><a href=\"/a\">x</a> <a href=\"/a\">foo</a></p>\n");
}

#[test]
fn test_last_definition_wins_end_to_end() {
    let renderer = html_renderer(HtmlFlags::empty());
    let out = render_str(
        "[a]: /first\n[a]: /second\n\n[a]\n",
        Some(&renderer),
        Extensions::empty(),
    )
    .unwrap();
    assert_eq!(out, "<p><a href=\"/second\">a</a></p>\n");
}

#[test]
fn test_renderer_is_reusable() {
    let renderer = html_renderer(HtmlFlags::empty());
    let first = render(b"*a*", Some(&renderer), Extensions::empty()).unwrap();
    let second = render(b"*a*", Some(&renderer), Extensions::empty()).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Nesting Ceiling
// ============================================================================

#[test]
fn test_deep_emphasis_terminates() {
    let renderer = html_renderer(HtmlFlags::empty());
    let input = format!("{}x{}", "*_".repeat(50), "_*".repeat(50));
    let out = render_str(&input, Some(&renderer), Extensions::empty()).unwrap();
    assert!(out.contains('x'));
}

#[test]
fn test_hundred_emphasis_markers_terminate() {
    let renderer = html_renderer(HtmlFlags::empty());
    let input = format!("{}deep{}", "*".repeat(100), "*".repeat(100));
    let out = render_str(&input, Some(&renderer), Extensions::empty()).unwrap();
    assert!(out.contains("deep"));
}

#[test]
fn test_deep_block_quotes_stop_at_ceiling() {
    let renderer = html_renderer(HtmlFlags::empty());
    let input = format!("{} text\n", ">".repeat(100));
    let out = render_str(&input, Some(&renderer), Extensions::empty()).unwrap();

    let depth = out.matches("<blockquote>").count();
    assert!(depth > 0);
    assert!(depth <= MAX_NESTING);
    // the rest is written as escaped text
    assert!(out.contains("&gt;"));
    assert!(out.contains("text"));
}

#[test]
fn test_deep_lists_terminate() {
    let renderer = html_renderer(HtmlFlags::empty());
    let mut input = String::new();
    for depth in 0..64 {
        input.push_str(&"    ".repeat(depth));
        input.push_str("* item\n");
    }
    let out = render_str(&input, Some(&renderer), Extensions::empty()).unwrap();
    assert!(out.contains("<ul>"));
    assert!(out.matches("<ul>").count() <= MAX_NESTING);
}
