//! Chapter titles from the book's navigation documents.
//!
//! Two sources are consulted, legacy first: the EPUB 2 NCX and the EPUB 3
//! navigation document. The modern one is only read when the NCX yields
//! nothing.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::package::{Manifest, ManifestItem};
use super::xml::{attr_value, local_name, resolve_entity};
use crate::archive::Archive;
use crate::dom;
use crate::error::Warning;
use crate::path;

/// Manifest href (fragment stripped, relative to the package base
/// directory) to display title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationTitles {
    titles: HashMap<String, String>,
}

impl NavigationTitles {
    /// Title for the manifest href `href`. Fragments and `./` segments are
    /// ignored.
    pub fn get(&self, href: &str) -> Option<&str> {
        let key = path::normalize(path::strip_fragment(href));
        self.titles.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Record a title, replacing any earlier one for the same href.
    fn insert(&mut self, href: String, title: String) {
        self.titles.insert(href, title);
    }

    /// Build from `(href, label)` pairs found in the navigation document at
    /// `nav_path`.
    ///
    /// Hrefs are resolved against the navigation document's directory, then
    /// re-expressed relative to `base_dir`. Empty hrefs and labels are
    /// dropped; the last label for a file wins.
    fn from_links(links: Vec<(String, String)>, nav_path: &str, base_dir: &str) -> Self {
        let nav_dir = path::parent_dir(nav_path);
        let mut titles = NavigationTitles::default();

        for (href, label) in links {
            let target = path::strip_fragment(&href);
            let label = label.trim();
            if target.is_empty() || label.is_empty() {
                continue;
            }
            let resolved = path::normalize(&path::join(nav_dir, target));
            let key = relative_to(&resolved, base_dir);
            titles.insert(key, label.to_string());
        }

        titles
    }
}

/// Express an archive path relative to `base_dir` when it lies inside it.
fn relative_to(archive_path: &str, base_dir: &str) -> String {
    if base_dir.is_empty() {
        return archive_path.to_string();
    }
    archive_path
        .strip_prefix(base_dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(archive_path)
        .to_string()
}

/// Collect navigation titles for the book.
///
/// Never fails: an unreadable or unparsable navigation source is recorded
/// as a [`Warning::Navigation`] and contributes no titles.
#[tracing::instrument(skip(archive, manifest))]
pub fn extract_titles<A: Archive + ?Sized>(
    archive: &A,
    manifest: &Manifest,
    base_dir: &str,
) -> (NavigationTitles, Vec<Warning>) {
    let mut warnings = Vec::new();

    if let Some(ncx) = manifest.iter().find(|item| item.is_ncx()) {
        let ncx_path = path::join(base_dir, &ncx.href);
        match read_source(archive, &ncx_path).and_then(|content| {
            parse_ncx(&content).map_err(|e| format!("invalid NCX: {e}"))
        }) {
            Ok(links) => {
                let titles = NavigationTitles::from_links(links, &ncx_path, base_dir);
                if !titles.is_empty() {
                    tracing::debug!(count = titles.len(), path = %ncx_path, "titles from NCX");
                    return (titles, warnings);
                }
            }
            Err(reason) => warnings.push(navigation_warning(ncx_path, reason)),
        }
    }

    if let Some(nav) = find_nav_document(manifest) {
        let nav_path = path::join(base_dir, &nav.href);
        match read_source(archive, &nav_path) {
            Ok(content) => {
                let titles =
                    NavigationTitles::from_links(parse_nav_document(&content), &nav_path, base_dir);
                tracing::debug!(count = titles.len(), path = %nav_path, "titles from nav document");
                return (titles, warnings);
            }
            Err(reason) => warnings.push(navigation_warning(nav_path, reason)),
        }
    }

    (NavigationTitles::default(), warnings)
}

fn navigation_warning(path: String, reason: String) -> Warning {
    tracing::warn!(%path, %reason, "navigation source unusable");
    Warning::Navigation { path, reason }
}

fn read_source<A: Archive + ?Sized>(archive: &A, nav_path: &str) -> Result<String, String> {
    let entry = archive
        .find_entry(nav_path)
        .ok_or_else(|| "entry not found".to_string())?;
    archive.read_text(&entry).map_err(|e| e.to_string())
}

/// The EPUB 3 navigation document: the item declaring the `nav` property,
/// else the first item whose href mentions "nav".
fn find_nav_document(manifest: &Manifest) -> Option<&ManifestItem> {
    manifest
        .iter()
        .find(|item| item.has_property("nav"))
        .or_else(|| manifest.iter().find(|item| item.href.contains("nav")))
}

struct NavPoint {
    label: String,
    src: Option<String>,
}

/// Parse NCX content into `(content src, label)` pairs, one per `navPoint`,
/// in document order. Nested points follow their parent.
pub fn parse_ncx(content: &str) -> Result<Vec<(String, String)>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    // Points are allocated when they open so nesting keeps document order
    let mut points: Vec<NavPoint> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_label = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"navPoint" => {
                        open.push(points.len());
                        points.push(NavPoint {
                            label: String::new(),
                            src: None,
                        });
                    }
                    b"navLabel" => in_label = true,
                    b"text" if in_label => in_text = true,
                    b"content" => set_src(&mut points, &open, &e),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"content" {
                    set_src(&mut points, &open, &e);
                }
            }
            Event::Text(e) => {
                if in_text && let Some(&i) = open.last() {
                    points[i].label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if in_text && let Some(&i) = open.last() {
                    points[i].label.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if in_text
                    && let Some(&i) = open.last()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    points[i].label.push_str(&resolved);
                }
            }
            Event::End(e) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"navPoint" => {
                        open.pop();
                    }
                    b"navLabel" => in_label = false,
                    b"text" => in_text = false,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(points
        .into_iter()
        .filter_map(|point| Some((point.src?, point.label.trim().to_string())))
        .collect())
}

fn set_src(points: &mut [NavPoint], open: &[usize], e: &quick_xml::events::BytesStart<'_>) {
    if let Some(&i) = open.last()
        && points[i].src.is_none()
    {
        points[i].src = attr_value(e, b"src");
    }
}

/// Parse an EPUB 3 navigation document into `(href, link text)` pairs.
///
/// Prefers the anchors of the `nav` whose `epub:type` includes `toc`, then
/// the anchors of every `nav`, then any anchor in the document.
pub fn parse_nav_document(content: &str) -> Vec<(String, String)> {
    let dom = dom::parse_html(content);
    let navs = dom::find_elements_by_name(&dom.document, "nav");

    let anchors = if let Some(toc) = navs.iter().find(|nav| is_toc_nav(nav)) {
        dom::find_elements_by_name(toc, "a")
    } else if !navs.is_empty() {
        navs.iter()
            .flat_map(|nav| dom::find_elements_by_name(nav, "a"))
            .collect()
    } else {
        dom::find_elements_by_name(&dom.document, "a")
    };

    anchors
        .iter()
        .filter_map(|a| {
            let href = dom::get_attribute(a, "href")?;
            Some((href, dom::get_text_content(a).trim().to_string()))
        })
        .collect()
}

fn is_toc_nav(nav: &dom::Handle) -> bool {
    dom::get_attribute(nav, "epub:type")
        .is_some_and(|value| value.split_ascii_whitespace().any(|t| t == "toc"))
}
