//! `META-INF/container.xml` handling.

use quick_xml::Reader;
use quick_xml::events::Event;

use super::xml::{attr_value, local_name};
use crate::archive::Archive;
use crate::error::{Error, Result};

/// Fixed location of the container document.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Find the package document path named by the archive's container document.
pub fn resolve<A: Archive + ?Sized>(archive: &A) -> Result<String> {
    let entry = archive
        .find_entry(CONTAINER_PATH)
        .ok_or_else(|| Error::MalformedArchive(format!("missing {CONTAINER_PATH}")))?;
    let content = archive
        .read_text(&entry)
        .map_err(|e| Error::malformed(CONTAINER_PATH, e))?;

    let package_path = parse_container_xml(&content)?;
    tracing::debug!(%package_path, "resolved package document");
    Ok(package_path)
}

/// Parse container.xml content and return the first rootfile's `full-path`.
pub fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attr_value(&e, b"full-path").filter(|p| !p.is_empty()) {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed(CONTAINER_PATH, e)),
            _ => {}
        }
    }

    Err(Error::MalformedArchive(format!(
        "no rootfile full-path in {CONTAINER_PATH}"
    )))
}

/// Directory containing the package document; `""` for the archive root.
pub fn base_directory(package_path: &str) -> &str {
    crate::path::parent_dir(package_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    #[test]
    fn test_parse_container_xml() {
        assert_eq!(parse_container_xml(CONTAINER).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_resolve_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(CONTAINER.as_bytes());
        let archive = MemoryArchive::new().with_entry(CONTAINER_PATH, bytes);
        assert_eq!(resolve(&archive).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_resolve_case_insensitive_entry() {
        let archive =
            MemoryArchive::new().with_entry("meta-inf/container.xml", CONTAINER.as_bytes().to_vec());
        assert_eq!(resolve(&archive).unwrap(), "OEBPS/content.opf");
    }

    #[test]
    fn test_missing_container_is_malformed() {
        let archive = MemoryArchive::new().with_entry("mimetype", b"application/epub+zip".to_vec());
        assert!(matches!(resolve(&archive), Err(Error::MalformedArchive(_))));
    }

    #[test]
    fn test_missing_full_path_is_malformed() {
        let xml = r#"<container><rootfiles><rootfile media-type="x"/></rootfiles></container>"#;
        assert!(matches!(
            parse_container_xml(xml),
            Err(Error::MalformedArchive(msg)) if msg.contains("full-path")
        ));
    }

    #[test]
    fn test_base_directory() {
        assert_eq!(base_directory("OEBPS/content.opf"), "OEBPS");
        assert_eq!(base_directory("content.opf"), "");
    }
}
