//! EPUB reading: container, package document, navigation and assembly.

mod assembler;
pub mod container;
pub mod navigation;
pub mod package;
mod xml;

pub use assembler::assemble;
pub use navigation::{NavigationTitles, extract_titles};
pub use package::{Manifest, ManifestItem, PackageDocument};

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::archive::ZipArchiveSource;
use crate::book::Book;
use crate::error::Result;

/// Read an EPUB file from disk into a [`Book`].
///
/// # Example
///
/// ```no_run
/// use quire::read_book;
///
/// let book = read_book("path/to/book.epub")?;
/// println!("Title: {}", book.metadata.title);
/// # Ok::<(), quire::Error>(())
/// ```
pub fn read_book<P: AsRef<Path>>(path: P) -> Result<Book> {
    let file = std::fs::File::open(path)?;
    read_book_from_reader(file)
}

/// Read an EPUB from any [`Read`] + [`Seek`] source.
///
/// # Example
///
/// ```no_run
/// use std::io::Cursor;
/// use quire::read_book_from_reader;
///
/// let epub_data: Vec<u8> = std::fs::read("book.epub")?;
/// let book = read_book_from_reader(Cursor::new(epub_data))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_book_from_reader<R: Read + Seek>(reader: R) -> Result<Book> {
    let archive = ZipArchiveSource::new(reader)?;
    assemble(&archive)
}

/// Read an EPUB held in memory, as handed over by a browser file picker.
pub fn read_book_from_bytes(bytes: &[u8]) -> Result<Book> {
    read_book_from_reader(Cursor::new(bytes))
}
