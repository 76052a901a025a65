//! Error types for quire operations.

use thiserror::Error;

/// Fatal errors that abort loading a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed EPUB archive: {0}")]
    MalformedArchive(String),

    #[error("No chapters found in EPUB")]
    EmptyBook,

    #[error("Archive entry not found: {0}")]
    EntryNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    /// Wrap any lower-level failure as [`Error::MalformedArchive`], keeping
    /// the cause in the message.
    pub(crate) fn malformed(context: &str, cause: impl std::fmt::Display) -> Self {
        Error::MalformedArchive(format!("{context}: {cause}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal problems recorded while resolving a book.
///
/// These never abort a load; each one is logged and the affected piece falls
/// back (empty navigation titles, placeholder image, hidden element, skipped
/// chapter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "cli", feature = "wasm"), derive(serde::Serialize))]
#[cfg_attr(any(feature = "cli", feature = "wasm"), serde(tag = "kind", rename_all = "snake_case"))]
pub enum Warning {
    #[error("could not read navigation document {path}: {reason}")]
    Navigation { path: String, reason: String },

    #[error("image {reference} not found in archive (tried {} paths)", .tried.len())]
    ImageMissing { reference: String, tried: Vec<String> },

    #[error("could not load image {reference} from {path}: {reason}")]
    ImageLoad {
        reference: String,
        path: String,
        reason: String,
    },

    #[error("could not read chapter {path}: {reason}")]
    Chapter { path: String, reason: String },
}
