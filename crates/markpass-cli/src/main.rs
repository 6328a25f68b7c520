//! markpass CLI - Render Markdown to HTML and inspect documents
//!
//! Usage:
//!   mpass [OPTIONS] [COMMAND] <FILE|->
//!
//! Commands:
//!   render    Render the document to HTML (default)
//!   refs      List link reference definitions
//!   stats     Show document statistics

use std::cell::Cell;
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use markpass_core::{
    html_renderer, normalize, render, Extensions, HtmlFlags, ListFlags, Output, Renderer,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let config = parse_args(args)?;
    init_logging(config.verbose);

    let input = read_input(&config.file)?;
    tracing::debug!(file = %config.file, bytes = input.len(), "read input");

    match config.command {
        Command::Render => cmd_render(&input, &config),
        Command::Refs => cmd_refs(&input, &config),
        Command::Stats => cmd_stats(&input, &config),
    }
}

/// Log to stderr; `RUST_LOG` applies unless `-v` asks for debug output.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: &str) -> Result<Vec<u8>, String> {
    if file == "-" {
        let mut input = Vec::new();
        io::stdin()
            .read_to_end(&mut input)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        return Ok(input);
    }
    fs::read(file).map_err(|e| format!("failed to read '{}': {}", file, e))
}

#[derive(Debug)]
struct Config {
    command: Command,
    file: String,
    output: Option<String>,
    format: OutputFormat,
    extensions: Extensions,
    flags: HtmlFlags,
    verbose: bool,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Render,
    Refs,
    Stats,
}

#[derive(Debug, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut command = Command::Render;
    let mut format = OutputFormat::Text;
    let mut extensions = Extensions::empty();
    let mut flags = HtmlFlags::empty();
    let mut verbose = false;
    let mut output = None;
    let mut file = None;

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("mpass {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "-v" | "--verbose" => verbose = true,
            "-j" | "--json" => format = OutputFormat::Json,
            "-o" | "--output" => {
                i += 1;
                let path = args
                    .get(i)
                    .ok_or_else(|| format!("{} requires a path", arg))?;
                output = Some(path.clone());
            }
            "--common" => extensions |= Extensions::COMMON,
            "--xhtml" => flags |= HtmlFlags::USE_XHTML,
            "--safelink" => flags |= HtmlFlags::SAFELINK,
            "--skip-html" => flags |= HtmlFlags::SKIP_HTML,
            "render" => command = Command::Render,
            "refs" => command = Command::Refs,
            "stats" => command = Command::Stats,
            "-" => {
                if file.is_some() {
                    return Err("multiple files specified".to_string());
                }
                file = Some(arg.clone());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("unknown option: {}", arg));
            }
            _ => {
                if file.is_some() {
                    return Err("multiple files specified".to_string());
                }
                file = Some(arg.clone());
            }
        }
        i += 1;
    }

    let file = file.ok_or_else(|| "no input file specified".to_string())?;

    Ok(Config {
        command,
        file,
        output,
        format,
        extensions,
        flags,
        verbose,
    })
}

fn print_help() {
    eprintln!(
        r#"mpass - Markdown to HTML renderer

USAGE:
    mpass [OPTIONS] [COMMAND] <FILE|->

COMMANDS:
    render      Render the document to HTML (default)
    refs        List link reference definitions
    stats       Show document statistics

OPTIONS:
    --common           Enable tables, fenced code, autolinks, strikethrough,
                       no intra-word emphasis and space-required headers
    --xhtml            Close void elements with " />"
    --safelink         Only link to http, https, ftp and mailto URLs
    --skip-html        Drop raw HTML from the input
    -o, --output PATH  Write output to PATH instead of stdout
    -j, --json         Output refs and stats in JSON format
    -v, --verbose      Log pipeline stages to stderr
    -h, --help         Print help information
    -V, --version      Print version information

EXAMPLES:
    mpass README.md                 Render a file
    mpass --common -o out.html a.md Render with extensions into a file
    cat a.md | mpass -              Render standard input
    mpass -j refs a.md              List references as JSON
    mpass stats a.md                Show document statistics
"#
    );
}

/// Write to the `--output` file, or stdout.
fn emit(config: &Config, bytes: &[u8]) -> Result<(), String> {
    match &config.output {
        Some(path) => {
            fs::write(path, bytes).map_err(|e| format!("failed to write '{}': {}", path, e))
        }
        None => io::stdout()
            .write_all(bytes)
            .map_err(|e| format!("failed to write output: {}", e)),
    }
}

// =============================================================================
// Render Command
// =============================================================================

fn cmd_render(input: &[u8], config: &Config) -> Result<(), String> {
    let renderer = html_renderer(config.flags);
    let out = render(input, Some(&renderer), config.extensions).map_err(|e| e.to_string())?;
    emit(config, &out)
}

// =============================================================================
// Refs Command
// =============================================================================

#[derive(Serialize)]
struct JsonReference {
    id: String,
    link: String,
    title: String,
}

fn cmd_refs(input: &[u8], config: &Config) -> Result<(), String> {
    let normalized = normalize(input);

    let mut refs: Vec<JsonReference> = normalized
        .references
        .iter()
        .map(|(id, r)| JsonReference {
            id: id.to_string(),
            link: String::from_utf8_lossy(r.link).into_owned(),
            title: String::from_utf8_lossy(r.title).into_owned(),
        })
        .collect();
    refs.sort_by(|a, b| a.id.cmp(&b.id));

    let text = match config.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&refs).map_err(|e| e.to_string())? + "\n"
        }
        OutputFormat::Text => {
            let mut text = String::new();
            for r in &refs {
                if r.title.is_empty() {
                    text.push_str(&format!("[{}]: {}\n", r.id, r.link));
                } else {
                    text.push_str(&format!("[{}]: {} \"{}\"\n", r.id, r.link, r.title));
                }
            }
            text
        }
    };
    emit(config, text.as_bytes())
}

// =============================================================================
// Stats Command
// =============================================================================

/// Block counts collected through renderer callbacks.
#[derive(Default)]
struct BlockCounter {
    headings: Cell<usize>,
    paragraphs: Cell<usize>,
    code_blocks: Cell<usize>,
    quotes: Cell<usize>,
    lists: Cell<usize>,
    list_items: Cell<usize>,
    tables: Cell<usize>,
    html_blocks: Cell<usize>,
    rules: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

#[derive(Serialize)]
struct DocumentStats {
    headings: usize,
    paragraphs: usize,
    code_blocks: usize,
    quotes: usize,
    lists: usize,
    list_items: usize,
    tables: usize,
    html_blocks: usize,
    rules: usize,
    references: usize,
    bytes: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn collect(input: &[u8], extensions: Extensions) -> Result<Self, String> {
        let mut renderer = Renderer::new(BlockCounter::default());
        renderer.header = Some(count_header);
        renderer.paragraph = Some(count_paragraph);
        renderer.block_code = Some(count_code);
        renderer.block_quote = Some(count_quote);
        renderer.list = Some(count_list);
        renderer.list_item = Some(count_list_item);
        renderer.table = Some(count_table);
        renderer.block_html = Some(count_html);
        renderer.hrule = Some(count_rule);

        render(input, Some(&renderer), extensions).map_err(|e| e.to_string())?;

        let text = String::from_utf8_lossy(input);
        let c = &renderer.opaque;
        Ok(Self {
            headings: c.headings.get(),
            paragraphs: c.paragraphs.get(),
            code_blocks: c.code_blocks.get(),
            quotes: c.quotes.get(),
            lists: c.lists.get(),
            list_items: c.list_items.get(),
            tables: c.tables.get(),
            html_blocks: c.html_blocks.get(),
            rules: c.rules.get(),
            references: normalize(input).references.len(),
            bytes: input.len(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
        })
    }
}

fn count_header(_: &mut Output, _: &[u8], _: u8, c: &BlockCounter) {
    bump(&c.headings);
}

fn count_paragraph(_: &mut Output, _: &[u8], c: &BlockCounter) {
    bump(&c.paragraphs);
}

fn count_code(_: &mut Output, _: &[u8], _: &[u8], c: &BlockCounter) {
    bump(&c.code_blocks);
}

fn count_quote(_: &mut Output, _: &[u8], c: &BlockCounter) {
    bump(&c.quotes);
}

fn count_list(_: &mut Output, _: &[u8], _: ListFlags, c: &BlockCounter) {
    bump(&c.lists);
}

fn count_list_item(_: &mut Output, _: &[u8], _: ListFlags, c: &BlockCounter) {
    bump(&c.list_items);
}

fn count_table(_: &mut Output, _: &[u8], _: &[u8], c: &BlockCounter) {
    bump(&c.tables);
}

fn count_html(_: &mut Output, _: &[u8], c: &BlockCounter) {
    bump(&c.html_blocks);
}

fn count_rule(_: &mut Output, c: &BlockCounter) {
    bump(&c.rules);
}

fn cmd_stats(input: &[u8], config: &Config) -> Result<(), String> {
    let stats = DocumentStats::collect(input, config.extensions)?;

    let text = match config.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())? + "\n"
        }
        OutputFormat::Text => {
            let mut lines = vec![
                "Document Statistics".to_string(),
                "-------------------".to_string(),
                "Blocks:".to_string(),
            ];
            lines.push(format!("  Headings:       {}", stats.headings));
            lines.push(format!("  Paragraphs:     {}", stats.paragraphs));
            lines.push(format!("  Code blocks:    {}", stats.code_blocks));
            lines.push(format!("  Quotes:         {}", stats.quotes));
            lines.push(format!(
                "  Lists:          {} ({} items)",
                stats.lists, stats.list_items
            ));
            lines.push(format!("  Tables:         {}", stats.tables));
            lines.push(format!("  HTML blocks:    {}", stats.html_blocks));
            lines.push(format!("  Rules:          {}", stats.rules));
            lines.push(String::new());
            lines.push(format!("References:       {}", stats.references));
            lines.push(String::new());
            lines.push("Size:".to_string());
            lines.push(format!("  Bytes:          {}", stats.bytes));
            lines.push(format!("  Words (est.):   {}", stats.words));
            lines.push(format!("  Lines:          {}", stats.lines));
            lines.join("\n") + "\n"
        }
    };
    emit(config, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("mpass")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let config = parse_args(&args(&["doc.md"])).unwrap();
        assert!(matches!(config.command, Command::Render));
        assert!(matches!(config.format, OutputFormat::Text));
        assert_eq!(config.file, "doc.md");
        assert_eq!(config.extensions, Extensions::empty());
        assert_eq!(config.flags, HtmlFlags::empty());
        assert!(config.output.is_none());
    }

    #[test]
    fn test_parse_args_flags() {
        let config = parse_args(&args(&[
            "--common",
            "--xhtml",
            "--safelink",
            "-o",
            "out.html",
            "refs",
            "-",
        ]))
        .unwrap();
        assert!(matches!(config.command, Command::Refs));
        assert_eq!(config.file, "-");
        assert_eq!(config.output.as_deref(), Some("out.html"));
        assert_eq!(config.extensions, Extensions::COMMON);
        assert!(config.flags.contains(HtmlFlags::USE_XHTML | HtmlFlags::SAFELINK));
        assert!(!config.flags.contains(HtmlFlags::SKIP_HTML));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["a.md", "b.md"])).is_err());
        assert!(parse_args(&args(&["--bogus", "a.md"])).is_err());
        assert!(parse_args(&args(&["a.md", "-o"])).is_err());
    }

    #[test]
    fn test_stats_counts_blocks() {
        let input = b"# T\n\npara\n\n* a\n* b\n\n> q\n\n---\n\n[r]: /x\n";
        let stats = DocumentStats::collect(input, Extensions::empty()).unwrap();
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.lists, 1);
        assert_eq!(stats.list_items, 2);
        assert_eq!(stats.quotes, 1);
        assert_eq!(stats.rules, 1);
        assert_eq!(stats.references, 1);
    }
}
