//! # quire
//!
//! The core of a browser-based EPUB reader: open an EPUB archive, work out
//! its reading order and metadata, and render every chapter into
//! self-contained HTML with its images inlined.
//!
//! ## Features
//!
//! - EPUB 2 and EPUB 3 packages (OPF, NCX and navigation documents)
//! - Chapter titles from navigation, in-document headings, or numbering
//! - Images resolved leniently and inlined as `data:` URIs
//! - Scripts and inline event handlers stripped
//! - In-book search with highlighting
//!
//! ## Quick Start
//!
//! ```no_run
//! use quire::read_book;
//!
//! let book = read_book("input.epub").unwrap();
//! println!("{} by {}", book.metadata.title, book.metadata.author);
//! for chapter in &book.chapters {
//!     println!("{}: {} bytes", chapter.title, chapter.content.len());
//! }
//! ```
//!
//! ## Custom archives
//!
//! Anything implementing [`Archive`] can be assembled into a [`Book`]:
//!
//! ```
//! use quire::{MemoryArchive, epub::assemble};
//!
//! let archive = MemoryArchive::new()
//!     .with_entry("META-INF/container.xml", br#"<container><rootfiles>
//!         <rootfile full-path="content.opf"/></rootfiles></container>"#.to_vec())
//!     .with_entry("content.opf", br#"<package><metadata/>
//!         <manifest><item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></manifest>
//!         <spine><itemref idref="c1"/></spine></package>"#.to_vec())
//!     .with_entry("c1.xhtml", b"<html><body><h1>Hello</h1></body></html>".to_vec());
//!
//! let book = assemble(&archive).unwrap();
//! assert_eq!(book.chapters[0].title, "Hello");
//! ```

pub mod archive;
pub mod book;
pub mod dom;
pub mod epub;
pub mod error;
pub mod path;
pub mod resolve;
pub mod search;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use archive::{Archive, MemoryArchive, ZipArchiveSource};
pub use book::{Book, Chapter, Metadata};
pub use epub::{read_book, read_book_from_bytes, read_book_from_reader};
pub use error::{Error, Result, Warning};
pub use search::{SearchHit, SearchOptions, highlight, search};
