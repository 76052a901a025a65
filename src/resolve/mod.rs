//! Chapter content resolution.
//!
//! Turns a chapter's raw body markup into self-contained HTML: images are
//! located in the archive and inlined as `data:` URIs, unlocatable images
//! become a visible placeholder, and scripts are stripped.

mod locate;
mod mime;

pub use locate::{Located, candidate_paths, locate, probe, resolve_reference, scan};
pub use mime::{IMAGE_EXTENSIONS, ImageFormat, is_image_path};

use std::rc::Rc;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::archive::Archive;
use crate::dom::{self, Handle};
use crate::error::Warning;

/// Markup of the "Image Not Found" placeholder.
const PLACEHOLDER_SVG: &str = concat!(
    r#"<svg width="200" height="100" xmlns="http://www.w3.org/2000/svg">"#,
    r##"<rect width="200" height="100" fill="#f0f0f0" stroke="#ccc" stroke-width="2" stroke-dasharray="5,10"/>"##,
    r##"<text x="100" y="55" text-anchor="middle" font-family="Arial" font-size="12" fill="#666">Image Not Found</text>"##,
    "</svg>",
);

/// `data:` URI of the placeholder shown for unlocatable images.
pub static PLACEHOLDER_DATA_URI: LazyLock<String> =
    LazyLock::new(|| data_uri("image/svg+xml", PLACEHOLDER_SVG.as_bytes()));

/// Styles applied to every successfully inlined image.
const LOADED_IMAGE_STYLE: &[(&str, &str)] = &[
    ("max-width", "100%"),
    ("height", "auto"),
    ("display", "block"),
    ("margin", "10px auto"),
];

const PLACEHOLDER_STYLE: &[(&str, &str)] = &[
    ("max-width", "200px"),
    ("margin", "10px auto"),
    ("display", "block"),
];

/// Build a base64 `data:` URI.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Resolve the images of one chapter and strip its scripts.
///
/// `body_html` is the chapter's body markup, `chapter_path` its archive
/// path (the anchor for relative references) and `base_dir` the package
/// base directory. Never fails: problems are returned as warnings.
///
/// Elements that already carry a `data-loaded` marker are left alone, so
/// resolving already-resolved markup reads nothing from the archive.
#[tracing::instrument(skip(body_html, archive), fields(len = body_html.len()))]
pub fn resolve_chapter<A: Archive + ?Sized>(
    body_html: &str,
    chapter_path: &str,
    archive: &A,
    base_dir: &str,
) -> (String, Vec<Warning>) {
    let dom = dom::parse_fragment(body_html);
    let Some(body) = dom::body(&dom) else {
        return (String::new(), Vec::new());
    };

    let scripts = dom::remove_elements(&body, &["script"]);
    if scripts > 0 {
        tracing::debug!(scripts, "removed script elements");
    }
    dom::for_each_element(&body, &mut |element| {
        dom::remove_attributes(element, |name| name.starts_with("on"));
    });

    let mut warnings = Vec::new();
    let images = dom::find_elements(&body, |name| {
        matches!(&*name.local, "img" | "image")
    });
    for image in &images {
        if let Some(warning) = resolve_image(image, chapter_path, archive, base_dir) {
            warnings.push(warning);
        }
    }

    (dom::serialize_children(&body), warnings)
}

/// Source reference of an image element: `src`, then `xlink:href`, then
/// `href`.
fn image_source(element: &Handle) -> Option<String> {
    dom::get_attribute(element, "src")
        .or_else(|| dom::get_xlink_href(element))
        .or_else(|| dom::get_attribute(element, "href"))
}

fn is_external(reference: &str) -> bool {
    reference.starts_with("http") || reference.starts_with("data:")
}

fn resolve_image<A: Archive + ?Sized>(
    element: &Handle,
    chapter_path: &str,
    archive: &A,
    base_dir: &str,
) -> Option<Warning> {
    if dom::has_attribute(element, "data-loaded") {
        return None;
    }
    let reference = image_source(element)?;
    if reference.is_empty() || is_external(&reference) {
        return None;
    }

    let found = match locate(archive, &reference, chapter_path, base_dir) {
        Located::Found(found) => found,
        Located::Missing(tried) => {
            tracing::warn!(%reference, tried = tried.len(), "image not found");
            let placeholder = dom::create_element("img", &[("src", PLACEHOLDER_DATA_URI.as_str())]);
            dom::set_style(&placeholder, PLACEHOLDER_STYLE);
            replace_image(element, placeholder);
            return Some(Warning::ImageMissing { reference, tried });
        }
    };

    let bytes = match archive.read_binary(&found) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%reference, path = %found, error = %e, "could not load image");
            dom::set_style(element, &[("display", "none")]);
            dom::set_attribute(element, "data-loaded", "failed");
            return Some(Warning::ImageLoad {
                reference,
                path: found,
                reason: e.to_string(),
            });
        }
    };
    let uri = data_uri(ImageFormat::from_path(&found).mime_type(), &bytes);

    if dom::element_name(element) == Some("image") {
        let img = dom::create_element(
            "img",
            &[("src", uri.as_str()), ("data-src", found.as_str()), ("data-loaded", "true")],
        );
        let mut style: Vec<(&str, String)> = Vec::new();
        for dimension in ["width", "height"] {
            if let Some(value) = dom::get_attribute(element, dimension) {
                style.push((dimension, with_unit(&value)));
            }
        }
        let style: Vec<(&str, &str)> = style.iter().map(|(p, v)| (*p, v.as_str())).collect();
        dom::set_style(&img, &style);
        dom::set_style(&img, LOADED_IMAGE_STYLE);
        replace_image(element, img);
    } else {
        dom::set_attribute(element, "src", &uri);
        dom::set_attribute(element, "data-src", &found);
        dom::set_attribute(element, "data-loaded", "true");
        dom::set_style(element, LOADED_IMAGE_STYLE);
    }

    tracing::debug!(%reference, path = %found, "inlined image");
    None
}

/// Put the HTML `img` built for `element` in its place.
///
/// An `img` left inside `<svg>` is hoisted out of foreign content when the
/// markup is parsed again, so an SVG `<image>` is never replaced in place.
/// The outermost `<svg>` gives way to `img` when the image is all it
/// holds; otherwise `img` goes just before it.
fn replace_image(element: &Handle, img: Handle) {
    let Some(svg) = outermost_svg(element) else {
        dom::replace_node(element, img);
        return;
    };
    if holds_only(&svg, element) {
        dom::replace_node(&svg, img);
    } else {
        dom::insert_before(&svg, img);
        dom::detach(element);
    }
}

fn outermost_svg(element: &Handle) -> Option<Handle> {
    let mut svg = None;
    let mut node = dom::parent(element);
    while let Some(current) = node {
        if dom::element_name(&current) == Some("svg") {
            svg = Some(current.clone());
        }
        node = dom::parent(&current);
    }
    svg
}

/// True when `image` is the only image or drawing in `svg` and no text
/// surrounds it. Grouping elements around it are allowed.
fn holds_only(svg: &Handle, image: &Handle) -> bool {
    if !dom::get_text_content(svg).trim().is_empty() {
        return false;
    }
    let mut sole = true;
    dom::for_each_element(svg, &mut |el| {
        let wrapper = matches!(dom::element_name(el), Some("svg" | "g"));
        if !wrapper && !Rc::ptr_eq(el, image) {
            sole = false;
        }
    });
    sole
}

/// Append `px` to unit-less numeric lengths.
fn with_unit(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.parse::<f64>().is_ok() {
        format!("{value}px")
    } else {
        value.to_string()
    }
}
