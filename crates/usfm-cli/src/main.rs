//! USFM CLI - Parse, validate, index and render USFM documents
//!
//! Usage:
//!   usfm <COMMAND> [OPTIONS] <FILE>...
//!
//! Commands:
//!   parse     Parse and display the document tree
//!   validate  Check a document for errors
//!   stats     Show document statistics
//!   index     Build a byte-range index over one or more documents
//!   render    Render display items for a document

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use serde_json::json;
use usfm_core::{render, Index, Node, NodeKind, Parser, RenderOptions, Token, Translation};

#[derive(ClapParser)]
#[command(name = "usfm")]
#[command(version, about = "USFM document parser, indexer and renderer", long_about = None)]
#[command(after_help = "EXAMPLES:
    usfm parse 08-RUT.usfm                  Print the document tree
    usfm validate --json 08-RUT.usfm        Report diagnostics as JSON
    usfm index -t web.json 0*.usfm          Index a corpus in order
    usfm render -c theme.toml 19-PSA.usfm   Render display items")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and display the document tree
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output the tree as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Check a document for errors
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,

        /// Stop at the first diagnostic instead of recovering
        #[arg(short, long)]
        strict: bool,
    },
    /// Show document statistics
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Build a byte-range index over documents, in the order given
    Index {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Key allocated before the first entry
        #[arg(short = 'k', long, default_value_t = 0)]
        start_key: u32,

        /// Byte offset of the first document within the corpus
        #[arg(short = 'b', long, default_value_t = 0)]
        start_byte: u64,

        /// JSON sidecar with translation metadata
        #[arg(short, long, value_name = "FILE")]
        translation: Option<PathBuf>,
    },
    /// Render display items for a document
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Key allocated before the first item
        #[arg(short = 'k', long, default_value_t = 0)]
        start_key: u32,

        /// TOML file overriding element wrappers
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse { file, json } => cmd_parse(&file, json),
        Command::Validate { file, json, strict } => cmd_validate(&file, json, strict),
        Command::Stats { file } => cmd_stats(&file),
        Command::Index {
            files,
            start_key,
            start_byte,
            translation,
        } => cmd_index(&files, start_key, start_byte, translation.as_deref()),
        Command::Render {
            file,
            start_key,
            config,
        } => cmd_render(&file, start_key, config.as_deref()),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(path: &Path, json: bool) -> Result<()> {
    let input = read(path)?;
    let result = Parser::new()
        .parse_with_recovery(&input)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    for error in result.errors.iter() {
        eprintln!("warning: {}", error);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result.document.book)?);
    } else {
        print_tree(&result.document.book, 0);
    }

    Ok(())
}

fn print_tree(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.kind {
        NodeKind::Book => println!("{}Book {:?}", indent, node.value),
        NodeKind::Marker => println!("{}{} @{}", indent, node.value, node.position),
        kind => println!("{}{:?} {:?} @{}", indent, kind, node.value, node.position),
    }
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(path: &Path, json: bool, strict: bool) -> Result<()> {
    let input = read(path)?;
    let errors: Vec<_> = match Parser::new()
        .with_recovery(!strict)
        .parse_with_recovery(&input)
    {
        Ok(result) => result.errors.into_iter().collect(),
        Err(fatal) => vec![fatal],
    };

    if json {
        let report: Vec<_> = errors
            .iter()
            .map(|e| {
                json!({
                    "message": e.message,
                    "kind": format!("{:?}", e.kind),
                    "span": e.span.map(|s| json!({"start": s.start, "end": s.end})),
                    "recoverable": e.recoverable
                })
            })
            .collect();
        println!("{}", json!({"valid": errors.is_empty(), "errors": report}));
    } else if errors.is_empty() {
        println!("Valid: no errors found");
    } else {
        eprintln!("Invalid: {} error(s) found", errors.len());
        for error in &errors {
            eprintln!("  - {}", error);
        }
    }

    if !errors.is_empty() {
        bail!("{} error(s) found", errors.len());
    }
    Ok(())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(path: &Path) -> Result<()> {
    let input = read(path)?;
    let result = Parser::new()
        .parse_with_recovery(&input)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    let doc = &result.document;

    let stats = DocumentStats::from_document(&doc.book, &input);

    println!("Document Statistics");
    println!("-------------------");
    println!("Book:         {}", if doc.code().is_empty() { "-" } else { doc.code() });
    println!("Nodes:        {}", doc.book.size());
    println!();
    println!("Structure:");
    println!("  Chapters:       {}", stats.chapters);
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  Verses:         {}", stats.verses);
    println!("  Continuations:  {}", stats.continuations);
    println!("  Poetic lines:   {}", stats.poetic_lines);
    println!("  Footnotes:      {}", stats.footnotes);
    println!("  Cross refs:     {}", stats.cross_references);
    println!();
    println!("Size:");
    println!("  Bytes:          {}", stats.bytes);
    println!("  Words (est.):   {}", stats.words);
    println!("  Lines:          {}", stats.lines);
    println!();
    println!("Errors:         {}", result.errors.len());

    Ok(())
}

#[derive(Default)]
struct DocumentStats {
    chapters: usize,
    paragraphs: usize,
    verses: usize,
    continuations: usize,
    poetic_lines: usize,
    footnotes: usize,
    cross_references: usize,
    bytes: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_document(book: &Node, input: &str) -> Self {
        let mut stats = Self {
            bytes: input.len(),
            words: input.split_whitespace().count(),
            lines: input.lines().count(),
            ..Self::default()
        };

        stats.count_nodes(&book.children);
        stats
    }

    fn count_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node.token() {
                Some(Token::Chapter) => self.chapters += 1,
                Some(Token::Paragraph) => self.paragraphs += 1,
                Some(Token::Verse) if node.is_subverse() => self.continuations += 1,
                Some(Token::Verse) => self.verses += 1,
                Some(Token::Footnote) => self.footnotes += 1,
                Some(Token::CrossReference) => self.cross_references += 1,
                Some(t) if t.is_poetry() => self.poetic_lines += 1,
                _ => {}
            }
            self.count_nodes(&node.children);
        }
    }
}

// =============================================================================
// Index Command
// =============================================================================

fn cmd_index(
    files: &[PathBuf],
    start_key: u32,
    start_byte: u64,
    translation: Option<&Path>,
) -> Result<()> {
    let translation = match translation {
        Some(path) => serde_json::from_str::<Translation>(&read(path)?)
            .with_context(|| format!("invalid translation sidecar '{}'", path.display()))?,
        None => Translation::default(),
    };

    let mut index = Index::new(translation);
    let mut key = start_key;
    let mut byte = start_byte;

    for path in files {
        let input = read(path)?;
        let document = Parser::new()
            .parse(&input)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;

        let appended = index.append(&document, key, byte);
        for warning in appended.warnings.iter() {
            eprintln!("warning: {}: {}", path.display(), warning);
        }
        log::info!(
            "indexed {} as keys {}..={}, bytes {}..{}",
            path.display(),
            key.saturating_add(1),
            appended.end_key,
            byte,
            appended.end_byte
        );

        key = appended.end_key;
        byte = appended.end_byte;
    }

    println!("{}", serde_json::to_string_pretty(&index)?);
    Ok(())
}

// =============================================================================
// Render Command
// =============================================================================

fn cmd_render(path: &Path, start_key: u32, config: Option<&Path>) -> Result<()> {
    let options = match config {
        Some(config) => load_options(config)?,
        None => RenderOptions::default(),
    };

    let input = read(path)?;
    let document = Parser::new()
        .parse(&input)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    let rendered = render(&document, start_key, &options);
    for warning in rendered.warnings.iter() {
        eprintln!("warning: {}", warning);
    }
    log::info!(
        "rendered {} items, last key {}",
        rendered.items.len(),
        rendered.end_key
    );

    println!("{}", serde_json::to_string_pretty(&rendered.items)?);
    Ok(())
}

fn load_options(path: &Path) -> Result<RenderOptions> {
    let text = read(path)?;
    toml::from_str(&text).with_context(|| format!("invalid render config '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_index_arguments() {
        let cli = Cli::try_parse_from(["usfm", "index", "-k", "3", "-b", "19", "a.usfm", "b.usfm"])
            .unwrap();
        match cli.command {
            Command::Index {
                files,
                start_key,
                start_byte,
                translation,
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!((start_key, start_byte), (3, 19));
                assert!(translation.is_none());
            }
            _ => panic!("expected index command"),
        }
    }

    #[test]
    fn test_index_requires_files() {
        assert!(Cli::try_parse_from(["usfm", "index"]).is_err());
    }

    #[test]
    fn test_render_options_from_toml() {
        let options: RenderOptions = toml::from_str(
            r#"
            [verse_number]
            tag = "b"

            [poetry1]
            tag = "div"
            class = "line1"
            "#,
        )
        .unwrap();
        assert_eq!(options.verse_number.open(), "<b>");
        assert_eq!(options.poetry1.open(), r#"<div class="line1">"#);
        assert_eq!(options.chapter, RenderOptions::default().chapter);
    }

    #[test]
    fn test_stats_counts_structure() {
        let input = r"\id PSA \c 1 \p \v 1 a \q1 b \f + \ft n\f* \p c \v 2 \x - \xt d\x*";
        let doc = Parser::new().parse(input).unwrap();
        let stats = DocumentStats::from_document(&doc.book, input);

        assert_eq!(stats.chapters, 1);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.verses, 2);
        assert_eq!(stats.continuations, 1);
        assert_eq!(stats.poetic_lines, 1);
        assert_eq!(stats.footnotes, 1);
        assert_eq!(stats.cross_references, 1);
    }
}
