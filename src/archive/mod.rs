//! Archive access abstractions.
//!
//! Everything above this layer addresses archive content by POSIX-style,
//! forward-slash separated entry paths. Lookups are case-sensitive; the
//! [`Archive::find_entry`] helper adds the percent-decoded and
//! case-insensitive fallbacks that real-world EPUBs need.

mod memory;
mod zip_source;

pub use memory::MemoryArchive;
pub use zip_source::ZipArchiveSource;

use percent_encoding::percent_decode_str;

use crate::error::Result;
use crate::util::{decode_text, extract_xml_encoding};

/// Read-only view over the entries of a loaded EPUB container.
pub trait Archive {
    /// Returns true if an entry exists at exactly `path`.
    fn has_entry(&self, path: &str) -> bool;

    /// Reads the raw bytes of the entry at `path`.
    ///
    /// Fails with [`Error::EntryNotFound`](crate::Error::EntryNotFound) when
    /// the entry is absent.
    fn read_binary(&self, path: &str) -> Result<Vec<u8>>;

    /// All file entry paths, in archive order. Directory entries are omitted.
    fn entry_paths(&self) -> Vec<String>;

    /// Reads the entry at `path` as text.
    ///
    /// Decodes UTF-8 (stripping a BOM), then the encoding declared in an XML
    /// prolog, then Windows-1252.
    fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        Ok(decode_text(&bytes, extract_xml_encoding(&bytes)).into_owned())
    }

    /// Locates the stored path for `path`, tolerating percent-encoding and
    /// inconsistent capitalisation.
    fn find_entry(&self, path: &str) -> Option<String> {
        if self.has_entry(path) {
            return Some(path.to_string());
        }

        let decoded = percent_decode_str(path)
            .decode_utf8()
            .ok()
            .map(|p| p.into_owned())
            .filter(|p| p != path);
        if let Some(ref decoded) = decoded
            && self.has_entry(decoded)
        {
            return Some(decoded.clone());
        }

        let wanted = decoded.as_deref().unwrap_or(path).to_lowercase();
        self.entry_paths()
            .into_iter()
            .find(|entry| entry.to_lowercase() == wanted)
    }
}

impl<A: Archive + ?Sized> Archive for &A {
    fn has_entry(&self, path: &str) -> bool {
        (**self).has_entry(path)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_binary(path)
    }

    fn entry_paths(&self) -> Vec<String> {
        (**self).entry_paths()
    }
}
