//! Robustness tests: block counts against pulldown-cmark on a clean document,
//! and mutated variants that must render without error.

use std::cell::Cell;

use markpass_core::{
    html_renderer, render, render_str, Extensions, HtmlFlags, ListFlags, Output, Renderer,
};
use pretty_assertions::assert_eq;
use pulldown_cmark::{Event, Options, Parser as MdParser, Tag, TagEnd};

const SAMPLE: &str = r#"# Title

Intro paragraph with *emphasis* and `code`.

## Lists

- one
- two
- three

## Steps

1. first
2. second

```rust
fn main() {}
```

| a | b |
|---|---|
| 1 | 2 |

> quoted text
"#;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Counts {
    headings: u32,
    paragraphs: u32,
    lists: u32,
    list_items: u32,
    tables: u32,
    code_blocks: u32,
}

#[derive(Default)]
struct Counter {
    headings: Cell<u32>,
    paragraphs: Cell<u32>,
    lists: Cell<u32>,
    list_items: Cell<u32>,
    tables: Cell<u32>,
    code_blocks: Cell<u32>,
}

fn bump(cell: &Cell<u32>) {
    cell.set(cell.get() + 1);
}

fn count_header(_: &mut Output, _: &[u8], _: u8, c: &Counter) {
    bump(&c.headings);
}

fn count_paragraph(_: &mut Output, _: &[u8], c: &Counter) {
    bump(&c.paragraphs);
}

fn count_list(_: &mut Output, _: &[u8], _: ListFlags, c: &Counter) {
    bump(&c.lists);
}

fn count_list_item(_: &mut Output, _: &[u8], _: ListFlags, c: &Counter) {
    bump(&c.list_items);
}

fn count_table(_: &mut Output, _: &[u8], _: &[u8], c: &Counter) {
    bump(&c.tables);
}

fn count_code(_: &mut Output, _: &[u8], _: &[u8], c: &Counter) {
    bump(&c.code_blocks);
}

fn count_markpass(input: &str) -> Counts {
    let mut renderer = Renderer::new(Counter::default());
    renderer.header = Some(count_header);
    renderer.paragraph = Some(count_paragraph);
    renderer.list = Some(count_list);
    renderer.list_item = Some(count_list_item);
    renderer.table = Some(count_table);
    renderer.block_code = Some(count_code);

    render(input.as_bytes(), Some(&renderer), Extensions::COMMON).unwrap();

    let c = &renderer.opaque;
    Counts {
        headings: c.headings.get(),
        paragraphs: c.paragraphs.get(),
        lists: c.lists.get(),
        list_items: c.list_items.get(),
        tables: c.tables.get(),
        code_blocks: c.code_blocks.get(),
    }
}

fn count_pulldown(input: &str) -> Counts {
    let mut counts = Counts::default();
    let mut list_depth = 0u32;
    for event in MdParser::new_ext(input, Options::all()) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => counts.headings += 1,
                Tag::Paragraph => {
                    if list_depth == 0 {
                        counts.paragraphs += 1;
                    }
                }
                Tag::List(_) => {
                    counts.lists += 1;
                    list_depth += 1;
                }
                Tag::Item => counts.list_items += 1,
                Tag::Table(_) => counts.tables += 1,
                Tag::CodeBlock(_) => counts.code_blocks += 1,
                _ => {}
            },
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    counts
}

// ============================================================================
// Mutations
// ============================================================================

struct Lcg {
    state: u64,
}

const SEED: u64 = 0x5eed;
const VARIANT_COUNT: usize = 32;
const MAX_MUTATION_STEPS: usize = 4;

const MUTATIONS: &[&str] = &[
    "drop_code_fence_end",
    "drop_table_bar",
    "drop_blank_line",
    "truncate_tail",
    "strip_list_dash",
    "tabs_for_spaces",
    "crlf",
    "open_emphasis",
    "deep_quote",
    "dangling_reference",
];

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn choose(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u32() as usize) % max
    }
}

fn apply_mutations(mut input: String, rng: &mut Lcg) -> String {
    for _ in 0..MAX_MUTATION_STEPS {
        match MUTATIONS[rng.choose(MUTATIONS.len())] {
            "drop_code_fence_end" => {
                if let Some(pos) = input.rfind("```\n") {
                    input.replace_range(pos..pos + 4, "");
                }
            }
            "drop_table_bar" => {
                if let Some(pos) = input.find("|---|---|") {
                    input.replace_range(pos..pos + 9, "---");
                }
            }
            "drop_blank_line" => {
                if let Some(pos) = input.find("\n\n") {
                    input.replace_range(pos..pos + 2, "\n");
                }
            }
            "truncate_tail" => {
                let len = input.len();
                if len > 8 {
                    let cut = rng.choose(len / 4).max(1);
                    input.truncate(len - cut);
                }
            }
            "strip_list_dash" => {
                if let Some(pos) = input.find("- ") {
                    input.replace_range(pos..pos + 2, "");
                }
            }
            "tabs_for_spaces" => {
                input = input.replace("    ", "\t");
            }
            "crlf" => {
                input = input.replace('\n', "\r\n");
            }
            "open_emphasis" => {
                let pos = rng.choose(input.len());
                input.insert_str(pos, "**_");
            }
            "deep_quote" => {
                input.insert_str(0, &"> ".repeat(40));
            }
            "dangling_reference" => {
                input.push_str("\n[x]: <http://a.b\n[y]:\n");
            }
            _ => {}
        }
    }
    input
}

fn variants() -> Vec<String> {
    let mut rng = Lcg::new(SEED);
    (0..VARIANT_COUNT)
        .map(|_| apply_mutations(SAMPLE.to_string(), &mut rng))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_block_counts_match_pulldown() {
    let expected = Counts {
        headings: 3,
        paragraphs: 2,
        lists: 2,
        list_items: 5,
        tables: 1,
        code_blocks: 1,
    };
    assert_eq!(count_pulldown(SAMPLE), expected);
    assert_eq!(count_markpass(SAMPLE), expected);
}

#[test]
fn test_mutated_inputs_render() {
    let renderer = html_renderer(HtmlFlags::empty());
    for (n, variant) in variants().iter().enumerate() {
        let out = render(variant.as_bytes(), Some(&renderer), Extensions::COMMON);
        assert!(out.is_ok(), "variant {n} failed: {variant:?}");
    }
}

#[test]
fn test_mutated_inputs_are_deterministic() {
    let renderer = html_renderer(HtmlFlags::empty());
    for variant in variants() {
        let first = render_str(&variant, Some(&renderer), Extensions::COMMON);
        let second = render_str(&variant, Some(&renderer), Extensions::COMMON);
        assert_eq!(first, second);
    }
}

#[test]
fn test_unclosed_fence_loses_code_block() {
    let input = SAMPLE.replacen("```\n\n", "\n", 1);
    let counts = count_markpass(&input);
    assert_eq!(counts.code_blocks, 0);
    assert_eq!(counts.tables, 1);
}

#[test]
fn test_line_endings_do_not_change_output() {
    let renderer = html_renderer(HtmlFlags::empty());
    let unix = render_str(SAMPLE, Some(&renderer), Extensions::COMMON).unwrap();
    let windows = render_str(&SAMPLE.replace('\n', "\r\n"), Some(&renderer), Extensions::COMMON)
        .unwrap();
    let mac = render_str(&SAMPLE.replace('\n', "\r"), Some(&renderer), Extensions::COMMON).unwrap();
    assert_eq!(windows, unix);
    assert_eq!(mac, unix);
}

#[test]
fn test_tabs_match_four_spaces() {
    let renderer = html_renderer(HtmlFlags::empty());
    let spaces = render_str("    code\n\n* a\n    * b\n", Some(&renderer), Extensions::empty());
    let tabs = render_str("\tcode\n\n* a\n\t* b\n", Some(&renderer), Extensions::empty());
    assert_eq!(tabs, spaces);
}
