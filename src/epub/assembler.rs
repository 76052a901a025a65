//! Building a [`Book`] from an opened archive.

use super::{container, navigation, package};
use crate::archive::Archive;
use crate::book::{Book, Chapter};
use crate::dom;
use crate::error::{Error, Result, Warning};
use crate::path;
use crate::resolve::resolve_chapter;

/// Headings consulted, in order, when a chapter has no navigation title and
/// no usable `<title>`.
const TITLE_HEADINGS: &[&str] = &["h1", "h2", "h3"];

/// Parse an archive into a [`Book`].
///
/// Runs the whole pipeline: container, package document, navigation titles,
/// then every XHTML spine item in reading order with its images inlined.
/// Fails with [`Error::MalformedArchive`] when the container or package
/// cannot be read, and with [`Error::EmptyBook`] when no chapter survives.
#[tracing::instrument(skip(archive))]
pub fn assemble<A: Archive + ?Sized>(archive: &A) -> Result<Book> {
    let package_path = container::resolve(archive)?;
    let base_dir = container::base_directory(&package_path);
    let package = package::parse(archive, &package_path)?;

    let (titles, mut warnings) =
        navigation::extract_titles(archive, &package.manifest, base_dir);

    let mut chapters: Vec<Chapter> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for idref in &package.spine {
        if seen.contains(&idref.as_str()) {
            tracing::debug!(%idref, "skipping repeated spine entry");
            continue;
        }
        seen.push(idref);

        let Some(item) = package.manifest.get(idref) else {
            tracing::debug!(%idref, "spine entry not in manifest");
            continue;
        };
        if !item.is_chapter() {
            tracing::debug!(%idref, media_type = %item.media_type, "skipping non-XHTML spine entry");
            continue;
        }

        let chapter_path = path::normalize(&path::join(base_dir, &item.href));
        let raw = match read_chapter(archive, &chapter_path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %chapter_path, error = %e, "skipping unreadable chapter");
                warnings.push(Warning::Chapter {
                    path: chapter_path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let document = dom::parse_html(&raw);
        let number = chapters.len() + 1;
        let title = titles
            .get(&item.href)
            .and_then(non_blank)
            .map(str::to_string)
            .or_else(|| document_title(&document))
            .unwrap_or_else(|| format!("Chapter {number}"));

        let body = dom::body(&document)
            .map(|body| dom::serialize_children(&body))
            .unwrap_or(raw);

        let (content, chapter_warnings) = resolve_chapter(&body, &chapter_path, archive, base_dir);
        warnings.extend(chapter_warnings);

        chapters.push(Chapter::new(title, content).with_location(chapter_path, item.href.clone()));
    }

    if chapters.is_empty() {
        return Err(Error::EmptyBook);
    }

    tracing::debug!(
        chapters = chapters.len(),
        warnings = warnings.len(),
        "assembled book"
    );
    Ok(Book {
        metadata: package.metadata,
        chapters,
        warnings,
    })
}

fn read_chapter<A: Archive + ?Sized>(archive: &A, chapter_path: &str) -> Result<String> {
    let entry = archive
        .find_entry(chapter_path)
        .ok_or_else(|| Error::EntryNotFound(chapter_path.to_string()))?;
    archive.read_text(&entry)
}

/// Title from the document itself: `<title>`, then the first `h1`, `h2`,
/// `h3`. Trimmed; blank candidates are skipped.
fn document_title(document: &dom::RcDom) -> Option<String> {
    std::iter::once("title")
        .chain(TITLE_HEADINGS.iter().copied())
        .find_map(|name| {
            let element = dom::find_first_element(&document.document, name)?;
            non_blank(&dom::get_text_content(&element)).map(str::to_string)
        })
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

    fn opf(manifest: &str, spine: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Sample</dc:title></metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
        )
        .into_bytes()
    }

    fn xhtml(head: &str, body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head>{head}</head><body>{body}</body></html>"#
        )
        .into_bytes()
    }

    fn book_archive(manifest: &str, spine: &str) -> MemoryArchive {
        MemoryArchive::new()
            .with_entry("META-INF/container.xml", CONTAINER.as_bytes().to_vec())
            .with_entry("OEBPS/content.opf", opf(manifest, spine))
    }

    #[test]
    fn test_title_precedence() {
        let archive = book_archive(
            r#"<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
               <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
               <item id="c" href="c.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<itemref idref="a"/><itemref idref="b"/><itemref idref="c"/>"#,
        )
        .with_entry("OEBPS/a.xhtml", xhtml("<title>  </title>", "<h2>Second level</h2><h1> Top </h1>"))
        .with_entry("OEBPS/b.xhtml", xhtml("<title>Doc Title</title>", "<h1>Heading</h1>"))
        .with_entry("OEBPS/c.xhtml", xhtml("", "<p>no headings</p>"));

        let book = assemble(&archive).unwrap();
        let titles: Vec<_> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Top", "Doc Title", "Chapter 3"]);
    }

    #[test]
    fn test_spine_filtering_and_numbering() {
        let archive = book_archive(
            r#"<item id="css" href="style.css" media-type="text/css"/>
               <item id="a" href="Text/a.xhtml" media-type="application/xhtml+xml"/>
               <item id="b" href="Text/b.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<itemref idref="css"/><itemref idref="ghost"/><itemref idref="a"/>
               <itemref idref="a"/><itemref idref="b"/>"#,
        )
        .with_entry("OEBPS/style.css", b"p {}".to_vec())
        .with_entry("OEBPS/Text/a.xhtml", xhtml("", "<p>a</p>"))
        .with_entry("OEBPS/Text/b.xhtml", xhtml("", "<p>b</p>"));

        let book = assemble(&archive).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.chapters[0].title, "Chapter 1");
        assert_eq!(book.chapters[1].title, "Chapter 2");
        assert_eq!(book.chapters[0].path, "OEBPS/Text/a.xhtml");
        assert_eq!(book.chapters[1].href, "Text/b.xhtml");
        assert_eq!(book.chapters[0].content, "<p>a</p>");
    }

    #[test]
    fn test_unreadable_chapter_is_skipped_with_warning() {
        let archive = book_archive(
            r#"<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
               <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<itemref idref="a"/><itemref idref="b"/>"#,
        )
        .with_entry("OEBPS/b.xhtml", xhtml("", "<h1>Only</h1>"));

        let book = assemble(&archive).unwrap();
        assert_eq!(book.len(), 1);
        assert_eq!(book.chapters[0].title, "Only");
        assert!(matches!(
            &book.warnings[..],
            [Warning::Chapter { path, .. }] if path == "OEBPS/a.xhtml"
        ));
    }

    #[test]
    fn test_no_chapters_is_empty_book() {
        let archive = book_archive(
            r#"<item id="css" href="style.css" media-type="text/css"/>"#,
            r#"<itemref idref="css"/>"#,
        );
        assert!(matches!(assemble(&archive), Err(Error::EmptyBook)));
    }

    #[test]
    fn test_metadata_carried_over() {
        let archive = book_archive(
            r#"<item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>"#,
            r#"<itemref idref="a"/>"#,
        )
        .with_entry("OEBPS/a.xhtml", xhtml("", "<p>x</p>"));

        let book = assemble(&archive).unwrap();
        assert_eq!(book.metadata.title, "Sample");
        assert_eq!(book.metadata.author, "Unknown Author");
    }
}
