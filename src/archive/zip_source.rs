use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{Read, Seek};

use zip::ZipArchive;
use zip::result::ZipError;

use super::Archive;
use crate::error::{Error, Result};

/// [`Archive`] backed by a ZIP container.
///
/// Entries are decompressed on demand. `ZipArchive` needs `&mut self` to
/// read, so it sits behind a `RefCell`; the source is single-threaded.
pub struct ZipArchiveSource<R> {
    archive: RefCell<ZipArchive<R>>,
    /// File entry names in central-directory order.
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl<R: Read + Seek> ZipArchiveSource<R> {
    /// Open a ZIP container. Fails with
    /// [`Error::MalformedArchive`] if `reader` is not a readable ZIP.
    pub fn new(reader: R) -> Result<Self> {
        let archive =
            ZipArchive::new(reader).map_err(|e| Error::malformed("not a valid ZIP container", e))?;

        let names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        let lookup = names.iter().cloned().collect();

        tracing::debug!(entries = names.len(), "opened ZIP container");

        Ok(Self {
            archive: RefCell::new(archive),
            names,
            lookup,
        })
    }
}

impl<R: Read + Seek> Archive for ZipArchiveSource<R> {
    fn has_entry(&self, path: &str) -> bool {
        self.lookup.contains(path)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(Error::EntryNotFound(path.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    fn entry_paths(&self) -> Vec<String> {
        self.names.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.add_directory("OEBPS/", options).unwrap();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_entries_in_order() {
        let bytes = build_zip(&[("mimetype", b"application/epub+zip"), ("OEBPS/a.xhtml", b"<p/>")]);
        let source = ZipArchiveSource::new(Cursor::new(bytes)).unwrap();

        assert_eq!(source.entry_paths(), vec!["mimetype", "OEBPS/a.xhtml"]);
        assert!(source.has_entry("OEBPS/a.xhtml"));
        assert!(!source.has_entry("OEBPS/"));
        assert_eq!(source.read_binary("OEBPS/a.xhtml").unwrap(), b"<p/>");
    }

    #[test]
    fn test_missing_entry_is_entry_not_found() {
        let bytes = build_zip(&[("mimetype", b"application/epub+zip")]);
        let source = ZipArchiveSource::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            source.read_binary("META-INF/container.xml"),
            Err(Error::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_non_zip() {
        let result = ZipArchiveSource::new(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(Error::MalformedArchive(_))));
    }
}
