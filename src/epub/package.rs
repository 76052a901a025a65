//! OPF package document parsing: metadata, manifest and spine.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::xml::{attr_value, local_name, resolve_entity};
use crate::archive::Archive;
use crate::book::Metadata;
use crate::error::{Error, Result};

/// Media type of chapter content documents.
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// Media type of EPUB 2 NCX navigation documents.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Parsed OPF package data.
#[derive(Debug, Clone, Default)]
pub struct PackageDocument {
    pub metadata: Metadata,
    pub manifest: Manifest,
    /// Spine `idref`s in document order (unfiltered).
    pub spine: Vec<String>,
}

/// A resource declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Relative to the package base directory, not yet joined.
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Whether this item can be rendered as a chapter.
    pub fn is_chapter(&self) -> bool {
        self.media_type == XHTML_MEDIA_TYPE
    }

    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE
    }

    /// Whether the whitespace-separated `properties` list contains `property`.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }
}

/// Id-keyed manifest that remembers declaration order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    by_id: HashMap<String, usize>,
}

impl Manifest {
    /// Add an item. A repeated id replaces the earlier declaration in place.
    pub fn insert(&mut self, item: ManifestItem) {
        match self.by_id.get(&item.id) {
            Some(&i) => self.items[i] = item,
            None => {
                self.by_id.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    /// Items in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ManifestItem> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestItem>>(iter: I) -> Self {
        let mut manifest = Manifest::default();
        for item in iter {
            manifest.insert(item);
        }
        manifest
    }
}

/// Read and parse the package document at `package_path`.
///
/// Any failure to read or parse it is reported as
/// [`Error::MalformedArchive`].
#[tracing::instrument(skip(archive))]
pub fn parse<A: Archive + ?Sized>(archive: &A, package_path: &str) -> Result<PackageDocument> {
    let entry = archive.find_entry(package_path).ok_or_else(|| {
        Error::MalformedArchive(format!("package document {package_path} not found"))
    })?;
    let content = archive
        .read_text(&entry)
        .map_err(|e| Error::malformed(package_path, e))?;

    let package = parse_opf(&content).map_err(|e| Error::malformed(package_path, e))?;
    tracing::debug!(
        manifest = package.manifest.len(),
        spine = package.spine.len(),
        "parsed package document"
    );
    Ok(package)
}

/// Metadata elements whose text we capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Title,
    Creator,
    Description,
    Language,
    Identifier,
    Publisher,
}

impl MetaField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"creator" => Some(Self::Creator),
            b"description" => Some(Self::Description),
            b"language" => Some(Self::Language),
            b"identifier" => Some(Self::Identifier),
            b"publisher" => Some(Self::Publisher),
            _ => None,
        }
    }
}

/// Parse OPF package document content.
///
/// Metadata text is kept verbatim (no trimming); only the first occurrence
/// of each single-valued field is used.
pub fn parse_opf(content: &str) -> std::result::Result<PackageDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut metadata = Metadata::default();
    let mut seen_title = false;
    let mut seen_creator = false;
    let mut seen_description = false;
    let mut manifest = Manifest::default();
    let mut spine: Vec<String> = Vec::new();
    let mut epub2_cover_id: Option<String> = None;

    let mut in_metadata = false;
    let mut current: Option<MetaField> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"metadata" => in_metadata = true,
                    _ if in_metadata && current.is_none() => {
                        if let Some(field) = MetaField::from_local_name(local) {
                            current = Some(field);
                            buf_text.clear();
                        } else {
                            handle_declaration(&e, &mut manifest, &mut spine, &mut epub2_cover_id);
                        }
                    }
                    _ => handle_declaration(&e, &mut manifest, &mut spine, &mut epub2_cover_id),
                }
            }
            Event::Empty(e) => {
                handle_declaration(&e, &mut manifest, &mut spine, &mut epub2_cover_id)
            }
            Event::Text(e) => {
                if current.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if current.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push_str(&resolved);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                    current = None;
                    continue;
                }

                let Some(field) = current else { continue };
                if MetaField::from_local_name(local) != Some(field) {
                    continue;
                }

                let text = std::mem::take(&mut buf_text);
                match field {
                    // Only the first title and creator count; an empty one
                    // leaves the default in place.
                    MetaField::Title if !seen_title => {
                        if !text.is_empty() {
                            metadata.title = text;
                        }
                        seen_title = true;
                    }
                    MetaField::Creator => {
                        if !seen_creator && !text.is_empty() {
                            metadata.author = text.clone();
                        }
                        seen_creator = true;
                        if !text.is_empty() {
                            metadata.authors.push(text);
                        }
                    }
                    MetaField::Description if !seen_description => {
                        metadata.description = text;
                        seen_description = true;
                    }
                    MetaField::Language if metadata.language.is_none() => {
                        metadata.language = Some(text)
                    }
                    MetaField::Identifier if metadata.identifier.is_none() => {
                        metadata.identifier = Some(text)
                    }
                    MetaField::Publisher if metadata.publisher.is_none() => {
                        metadata.publisher = Some(text)
                    }
                    _ => {}
                }
                current = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    // EPUB 3 "cover-image" property takes priority over the EPUB 2 meta
    metadata.cover_image = manifest
        .iter()
        .find(|item| item.has_property("cover-image"))
        .or_else(|| epub2_cover_id.as_deref().and_then(|id| manifest.get(id)))
        .map(|item| item.href.clone());

    Ok(PackageDocument {
        metadata,
        manifest,
        spine,
    })
}

/// Handle the attribute-only elements of the package: manifest items, spine
/// item references and the EPUB 2 cover meta.
fn handle_declaration(
    e: &BytesStart<'_>,
    manifest: &mut Manifest,
    spine: &mut Vec<String>,
    epub2_cover_id: &mut Option<String>,
) {
    let name = e.name();
    match local_name(name.as_ref()) {
        b"item" => {
            let Some(id) = attr_value(e, b"id").filter(|id| !id.is_empty()) else {
                return;
            };
            manifest.insert(ManifestItem {
                id,
                href: attr_value(e, b"href").unwrap_or_default(),
                media_type: attr_value(e, b"media-type").unwrap_or_default(),
                properties: attr_value(e, b"properties"),
            });
        }
        b"itemref" => {
            if let Some(idref) = attr_value(e, b"idref") {
                spine.push(idref);
            }
        }
        b"meta" => {
            if attr_value(e, b"name").as_deref() == Some("cover")
                && let Some(content) = attr_value(e, b"content").filter(|c| !c.is_empty())
            {
                *epub2_cover_id = Some(content);
            }
        }
        _ => {}
    }
}
