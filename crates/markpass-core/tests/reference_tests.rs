//! Integration tests for the reference definition grammar

use markpass_core::{parse_reference, Reference, ReferenceTable};
use pretty_assertions::assert_eq;

fn parse(input: &[u8]) -> (usize, ReferenceTable<'_>) {
    let mut refs = ReferenceTable::new();
    let n = parse_reference(input, Some(&mut refs));
    (n, refs)
}

// ============================================================================
// Accepted Definitions
// ============================================================================

#[test]
fn test_reference_with_quoted_title() {
    let input = b"[1]: http://example.com \"Example\"\n";
    let (n, refs) = parse(input);

    // the extent stops at the terminating newline
    assert_eq!(n, input.len() - 1);
    assert_eq!(
        refs.get(b"1"),
        Some(&Reference {
            link: b"http://example.com",
            title: b"Example",
        })
    );
}

#[test]
fn test_reference_without_title() {
    let (n, refs) = parse(b"[docs]: /guide/index.html\nrest");
    assert_eq!(n, 25);
    let r = refs.get(b"docs").unwrap();
    assert_eq!(r.link, b"/guide/index.html");
    assert!(r.title.is_empty());
}

#[test]
fn test_reference_at_end_of_input() {
    let input = b"[a]: /x";
    let (n, refs) = parse(input);
    assert_eq!(n, input.len());
    assert_eq!(refs.get(b"a").unwrap().link, b"/x");
}

#[test]
fn test_reference_angle_brackets_stripped() {
    let (_, refs) = parse(b"[a]: <http://x.org/>\n");
    assert_eq!(refs.get(b"a").unwrap().link, b"http://x.org/");
}

#[test]
fn test_reference_single_angle_bracket_kept() {
    let (_, refs) = parse(b"[a]: <http://x.org/\n");
    assert_eq!(refs.get(b"a").unwrap().link, b"<http://x.org/");
}

#[test]
fn test_reference_title_quote_styles() {
    for (input, title) in [
        (&b"[a]: /u 'single'\n"[..], &b"single"[..]),
        (&b"[a]: /u \"double\"\n"[..], &b"double"[..]),
        (&b"[a]: /u (paren)\n"[..], &b"paren"[..]),
    ] {
        let (n, refs) = parse(input);
        assert_eq!(n, input.len() - 1);
        assert_eq!(refs.get(b"a").unwrap().title, title);
    }
}

#[test]
fn test_reference_title_trailing_blanks() {
    let (_, refs) = parse(b"[a]: /u \"T\"   \n");
    assert_eq!(refs.get(b"a").unwrap().title, b"T");
}

#[test]
fn test_reference_title_on_next_line() {
    let input = b"[a]: http://x.org/\n   'Title'\n";
    let (n, refs) = parse(input);
    assert_eq!(n, input.len() - 1);
    let r = refs.get(b"a").unwrap();
    assert_eq!(r.link, b"http://x.org/");
    assert_eq!(r.title, b"Title");
}

#[test]
fn test_reference_link_on_next_line() {
    let (n, refs) = parse(b"[a]:\n  /next\n");
    assert_eq!(n, 12);
    assert_eq!(refs.get(b"a").unwrap().link, b"/next");
}

#[test]
fn test_reference_leading_spaces() {
    let (n, refs) = parse(b"   [a]: /u\n");
    assert_eq!(n, 10);
    assert!(refs.get(b"a").is_some());
}

#[test]
fn test_reference_crlf_line_end() {
    let input = b"[a]: /u\r\nnext";
    let (n, refs) = parse(input);
    // "\r\n" is one break; the extent stops on its last byte
    assert_eq!(n, 8);
    assert_eq!(refs.get(b"a").unwrap().link, b"/u");
}

#[test]
fn test_reference_crlf_title() {
    let input = b"[a]: /u \"T\"\r\n";
    let (n, refs) = parse(input);
    assert_eq!(n, input.len() - 1);
    assert_eq!(refs.get(b"a").unwrap().title, b"T");
}

#[test]
fn test_reference_unclosed_title_on_next_line() {
    // the definition still ends on the link line
    let (n, refs) = parse(b"[a]: /x\n'oops\n");
    assert_eq!(n, 7);
    assert_eq!(refs.get(b"a").unwrap().link, b"/x");
}

#[test]
fn test_reference_syntax_check_only() {
    let input = b"[a]: /u \"T\"\n";
    assert_eq!(parse_reference(input, None), input.len() - 1);
}

// ============================================================================
// Rejected Definitions
// ============================================================================

#[test]
fn test_reference_rejections() {
    let cases: &[&[u8]] = &[
        b"",
        b"[a]",
        b"    [a]: /u\n",
        b"[a] /u\n",
        b"[a]: /u garbage\n",
        b"[a\n]: /u\n",
        b"[a: /u\n",
        b"[a]:",
        b"[a]:   ",
        b"a]: /u\n",
        b"[a]: /u \"T\n",
        b"[a]: /u (T\n",
        b"[x]: http://e.com \"T",
    ];
    for input in cases {
        assert_eq!(
            parse_reference(input, None),
            0,
            "accepted {:?}",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn test_rejected_reference_registers_nothing() {
    let (n, refs) = parse(b"[a]: /u trailing\n");
    assert_eq!(n, 0);
    assert!(refs.is_empty());

    // a title opened on the link line must close there
    let unclosed: [&[u8]; 2] = [b"[a]: /u \"T\n", b"[a]: /u (T\n"];
    for input in unclosed {
        let (n, refs) = parse(input);
        assert_eq!(n, 0, "accepted {:?}", String::from_utf8_lossy(input));
        assert!(refs.is_empty());
    }
}

// ============================================================================
// Reference Table
// ============================================================================

#[test]
fn test_table_lookup_is_case_insensitive() {
    let mut refs = ReferenceTable::new();
    refs.insert(
        b"Foo",
        Reference {
            link: b"/foo",
            title: b"",
        },
    );
    assert_eq!(refs.get(b"foo").unwrap().link, b"/foo");
    assert_eq!(refs.get(b"FOO").unwrap().link, b"/foo");
    assert!(refs.get(b"bar").is_none());
}

#[test]
fn test_table_last_definition_wins() {
    let mut refs = ReferenceTable::new();
    refs.insert(
        b"x",
        Reference {
            link: b"/first",
            title: b"one",
        },
    );
    refs.insert(
        b"X",
        Reference {
            link: b"/second",
            title: b"two",
        },
    );
    assert_eq!(refs.len(), 1);
    assert_eq!(
        refs.get(b"x"),
        Some(&Reference {
            link: b"/second",
            title: b"two",
        })
    );
}

#[test]
fn test_table_iter_uses_folded_labels() {
    let (_, refs) = parse(b"[MiXeD]: /m\n");
    let labels: Vec<&str> = refs.iter().map(|(id, _)| id).collect();
    assert_eq!(labels, vec!["mixed"]);
}
