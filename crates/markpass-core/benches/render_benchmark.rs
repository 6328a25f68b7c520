//! Benchmarks comparing markpass HTML rendering vs pulldown-cmark
//!
//! Run with: cargo bench -p markpass-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use markpass_core::{html_renderer, normalize, render, Extensions, HtmlFlags};
use pulldown_cmark::{html, Options, Parser as MdParser};

/// Sample document using every construct of the common extension set
const SAMPLE: &str = r#"# Introduction

This is a paragraph with *emphasis*, **strong text**, and `inline code`.
It demonstrates the basic capabilities of the renderer, see [the guide][guide]
or visit http://example.com/docs for more.

## Lists

- First item with some content
- Second item with more content
- Third item concluding the list

## Steps

1. Step one of the process
2. Step two continues
3. Step three completes

## Code Example

```rust
fn fibonacci(n: u64) -> u64 {
    match n {
        0 => 0,
        1 => 1,
        _ => fibonacci(n - 1) + fibonacci(n - 2),
    }
}
```

## Table

| Name    | Speed   | Memory |
| :------ | ------: | ------ |
| Fast    | 100ms   | 10MB   |
| Medium  | 500ms   | 50MB   |
| Slow    | 1000ms  | 100MB  |

## Quote

> The best code is no code at all.
> Every line of code you write is a liability.
>
> -- Someone wise

---

End of document with ~~struck~~ text & an entity: &copy;.

[guide]: http://example.com/guide "User Guide"
"#;

fn render_markpass(input: &str) -> usize {
    let renderer = html_renderer(HtmlFlags::empty());
    let out = render(input.as_bytes(), Some(&renderer), Extensions::COMMON).unwrap();
    out.len()
}

fn render_pulldown(input: &str) -> usize {
    let parser = MdParser::new_ext(input, Options::all());
    let mut out = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out.len()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    // Set throughput for bytes/sec reporting
    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));

    group.bench_function("markpass", |b| {
        b.iter(|| black_box(render_markpass(black_box(SAMPLE))))
    });

    group.bench_function("pulldown", |b| {
        b.iter(|| black_box(render_pulldown(black_box(SAMPLE))))
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    // Test with different document sizes
    for size in [1, 5, 10, 20].iter() {
        let content: String = SAMPLE.repeat(*size);

        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("markpass", size), &content, |b, content| {
            b.iter(|| black_box(render_markpass(black_box(content))))
        });

        group.bench_with_input(BenchmarkId::new("pulldown", size), &content, |b, content| {
            b.iter(|| black_box(render_pulldown(black_box(content))))
        });
    }

    group.finish();
}

fn bench_first_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_pass");

    let tabbed = SAMPLE.replace("    ", "\t").replace('\n', "\r\n").repeat(10);
    group.throughput(Throughput::Bytes(tabbed.len() as u64));

    group.bench_function("normalize", |b| {
        b.iter(|| {
            let normalized = normalize(black_box(tabbed.as_bytes()));
            black_box(normalized.text.len())
        })
    });

    group.finish();
}

fn bench_inline(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline");

    let inline =
        "This has *emphasis*, **strong**, `code`, [link](https://example.com), and ~~strike~~.";

    group.bench_function("markpass_inline", |b| {
        b.iter(|| black_box(render_markpass(black_box(inline))))
    });

    group.bench_function("pulldown_inline", |b| {
        b.iter(|| black_box(render_pulldown(black_box(inline))))
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_scaling, bench_first_pass, bench_inline);
criterion_main!(benches);
