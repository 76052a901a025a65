//! In-memory EPUB fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Smallest valid JPEG header; enough for MIME detection by extension.
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

/// Builds an EPUB archive in memory, entry by entry.
pub struct EpubBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl EpubBuilder {
    /// Start with `mimetype` and a container pointing at
    /// `OEBPS/content.opf`.
    pub fn new() -> Self {
        Self::bare()
            .file("mimetype", b"application/epub+zip")
            .file("META-INF/container.xml", CONTAINER_XML.as_bytes())
    }

    /// Start with no entries at all.
    pub fn bare() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.entries.push((path.to_string(), data.to_vec()));
        self
    }

    pub fn text(self, path: &str, data: &str) -> Self {
        self.file(path, data.as_bytes())
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (path, data) in &self.entries {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

/// Package document with the given manifest items and spine itemrefs.
pub fn opf(title: &str, manifest: &[(&str, &str, &str)], spine: &[&str]) -> String {
    let items: String = manifest
        .iter()
        .map(|(id, href, media_type)| {
            format!(r#"    <item id="{id}" href="{href}" media-type="{media_type}"/>"#) + "\n"
        })
        .collect();
    let itemrefs: String = spine
        .iter()
        .map(|idref| format!(r#"    <itemref idref="{idref}"/>"#) + "\n")
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{title}</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
{items}  </manifest>
  <spine toc="ncx">
{itemrefs}  </spine>
</package>"#
    )
}

/// XHTML content document.
pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{title}</title></head>
<body>{body}</body>
</html>"#
    )
}

/// NCX with one flat navPoint per `(src, label)`.
pub fn ncx(points: &[(&str, &str)]) -> String {
    let nav_points: String = points
        .iter()
        .enumerate()
        .map(|(i, (src, label))| {
            format!(
                r#"    <navPoint id="np{n}" playOrder="{n}">
      <navLabel><text>{label}</text></navLabel>
      <content src="{src}"/>
    </navPoint>
"#,
                n = i + 1
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="uid"/></head>
  <docTitle><text>Book</text></docTitle>
  <navMap>
{nav_points}  </navMap>
</ncx>"#
    )
}

pub const XHTML: &str = "application/xhtml+xml";
pub const NCX: &str = "application/x-dtbncx+xml";
