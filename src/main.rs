//! quire - EPUB inspector

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire::{Book, SearchOptions, read_book, search};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about = "Parse EPUB books into self-contained chapters", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire book.epub                 Show metadata and chapter list
    quire book.epub -c 3            Print the HTML of chapter 3
    quire book.epub -s whale        Search the book
    quire book.epub --json          Dump the whole book as JSON

Set RUST_LOG=quire=debug for parser diagnostics.")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Print the resolved HTML of one chapter (1-based)
    #[arg(short, long, value_name = "N", conflicts_with_all = ["search", "json"])]
    chapter: Option<usize>,

    /// Search the book for a phrase
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let book = read_book(&cli.input).map_err(|e| e.to_string())?;

    if let Some(number) = cli.chapter {
        let chapter = number
            .checked_sub(1)
            .and_then(|i| book.chapter(i))
            .ok_or_else(|| format!("no chapter {number} (book has {})", book.len()))?;
        println!("{}", chapter.content);
        return Ok(());
    }

    if let Some(ref query) = cli.search {
        let hits = search(&book, query, &SearchOptions::default());
        if cli.json {
            let json = serde_json::to_string_pretty(&hits).map_err(|e| e.to_string())?;
            println!("{json}");
        } else {
            println!("{} results for {query:?}", hits.len());
            for hit in &hits {
                println!("[{}] {}: {}", hit.chapter_index + 1, hit.chapter_title, hit.context);
            }
        }
        return Ok(());
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&book).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        show_info(&cli.input, &book);
    }
    Ok(())
}

fn show_info(path: &str, book: &Book) {
    let meta = &book.metadata;
    println!("File: {path}");
    println!("Title: {}", meta.title);
    if meta.authors.len() > 1 {
        println!("Authors: {}", meta.authors.join(", "));
    } else {
        println!("Author: {}", meta.author);
    }
    if let Some(ref language) = meta.language {
        println!("Language: {language}");
    }
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    let desc = meta.description.trim();
    if !desc.is_empty() {
        match desc.char_indices().nth(200) {
            Some((cut, _)) => println!("Description: {}...", &desc[..cut]),
            None => println!("Description: {desc}"),
        }
    }
    if let Some(ref cover) = meta.cover_image {
        println!("Cover: {cover}");
    }

    println!("Chapters: {}", book.len());
    for (i, chapter) in book.chapters.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, chapter.title);
    }

    if !book.warnings.is_empty() {
        println!("Warnings: {}", book.warnings.len());
        for warning in &book.warnings {
            println!("  - {warning}");
        }
    }
}
