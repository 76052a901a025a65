//! HTML parsing and manipulation using html5ever
//!
//! Provides utilities for:
//! - Parsing chapter XHTML and detached body fragments
//! - Finding elements and reading/writing attributes and inline styles
//! - Replacing and removing nodes
//! - Serializing a subtree back to markup

use std::cell::RefCell;
use std::default::Default;
use std::rc::Rc;
use std::sync::LazyLock;

use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{Attribute, LocalName, ParseOpts, QualName, ns};
use markup5ever_rcdom::{Node, NodeData, SerializableHandle};
pub use markup5ever_rcdom::{Handle, RcDom};
use regex_lite::Regex;

/// Non-void elements that XHTML content documents commonly self-close.
///
/// The HTML tree builder ignores the self-closing flag on these, so a
/// `<title/>` would swallow the rest of the document.
static SELF_CLOSED_NON_VOID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<(a|b|i|u|em|strong|span|div|p|title|script|style|iframe|textarea|section|article|aside|h[1-6]|li|ul|ol|td|th|tr|table|video|audio|object|canvas)(\s[^<>]*?)?\s*/>",
    )
    .expect("valid self-closing tag pattern")
});

/// Parse HTML content into a DOM tree
pub fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let html = expand_self_closing(html);
    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Parse a fragment of HTML (not a full document)
///
/// The fragment ends up as the children of the returned document's `body`.
pub fn parse_fragment(html: &str) -> RcDom {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    parse_html(&wrapped)
}

/// Rewrite `<tag .../>` as `<tag ...></tag>` for non-void elements.
pub fn expand_self_closing(html: &str) -> std::borrow::Cow<'_, str> {
    SELF_CLOSED_NON_VOID.replace_all(html, "<$1$2></$1>")
}

/// Serialize a node and its children to HTML string
pub fn serialize_node(handle: &Handle) -> String {
    serialize_with_scope(handle, TraversalScope::IncludeNode)
}

/// Serialize only the children of a node (the node's inner HTML)
pub fn serialize_children(handle: &Handle) -> String {
    serialize_with_scope(handle, TraversalScope::ChildrenOnly(None))
}

fn serialize_with_scope(handle: &Handle, traversal_scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();

    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    if let Err(e) = serialize(&mut bytes, &serializable, opts) {
        tracing::error!(error = %e, "HTML serialization failed");
        return String::new();
    }

    String::from_utf8(bytes).unwrap_or_default()
}

/// Find elements by local name in a DOM tree (document order)
pub fn find_elements_by_name(handle: &Handle, name: &str) -> Vec<Handle> {
    find_elements(handle, |qname| qname.local.as_ref() == name)
}

/// Find elements whose name satisfies `predicate` (document order)
pub fn find_elements<F>(handle: &Handle, predicate: F) -> Vec<Handle>
where
    F: Fn(&QualName) -> bool,
{
    let mut results = Vec::new();
    find_elements_recursive(handle, &predicate, &mut results);
    results
}

fn find_elements_recursive<F>(handle: &Handle, predicate: &F, results: &mut Vec<Handle>)
where
    F: Fn(&QualName) -> bool,
{
    if let NodeData::Element { ref name, .. } = handle.data
        && predicate(name)
    {
        results.push(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        find_elements_recursive(child, predicate, results);
    }
}

/// Get the first element with the given local name
pub fn find_first_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: ref qname, .. } = handle.data
        && qname.local.as_ref() == name
    {
        return Some(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        if let Some(found) = find_first_element(child, name) {
            return Some(found);
        }
    }

    None
}

/// Local name of an element, if `handle` is one.
pub fn element_name(handle: &Handle) -> Option<&str> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Get text content from a node (ignoring tags)
pub fn get_text_content(handle: &Handle) -> String {
    let mut text = String::new();
    get_text_recursive(handle, &mut text);
    text
}

fn get_text_recursive(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
        }
        NodeData::Element { .. } | NodeData::Document => {
            for child in handle.children.borrow().iter() {
                get_text_recursive(child, text);
            }
        }
        _ => {}
    }
}

/// Get an attribute value from an element, matching the local name in the
/// null namespace only.
pub fn get_attribute(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.ns == ns!() && attr.name.local.as_ref() == attr_name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Get the `xlink:href` of an element.
///
/// Inside SVG the tree builder moves it into the XLink namespace; elsewhere
/// it stays a plain attribute literally named `xlink:href`.
pub fn get_xlink_href(handle: &Handle) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            let namespaced = attr.name.ns == ns!(xlink) && attr.name.local.as_ref() == "href";
            if namespaced || attr.name.local.as_ref() == "xlink:href" {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Returns true if the element carries `attr_name` (any namespace).
pub fn has_attribute(handle: &Handle, attr_name: &str) -> bool {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|a| a.name.local.as_ref() == attr_name),
        _ => false,
    }
}

/// Set an attribute on an element
pub fn set_attribute(handle: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        let mut attrs_mut = attrs.borrow_mut();

        for attr in attrs_mut.iter_mut() {
            if attr.name.ns == ns!() && attr.name.local.as_ref() == attr_name {
                attr.value = value.into();
                return;
            }
        }

        attrs_mut.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: value.into(),
        });
    }
}

/// Remove attributes whose local name satisfies `predicate`
pub fn remove_attributes<F>(handle: &Handle, predicate: F)
where
    F: Fn(&str) -> bool,
{
    if let NodeData::Element { ref attrs, .. } = handle.data {
        attrs
            .borrow_mut()
            .retain(|attr| !predicate(attr.name.local.as_ref()));
    }
}

/// Merge declarations into the element's inline `style` attribute.
///
/// Later declarations override earlier ones with the same property, the way
/// assigning to `element.style.<prop>` does in a browser.
pub fn set_style(handle: &Handle, declarations: &[(&str, &str)]) {
    let existing = get_attribute(handle, "style").unwrap_or_default();
    let mut merged: Vec<(String, String)> = existing
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then(|| (prop.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();

    for (prop, value) in declarations {
        match merged.iter_mut().find(|(p, _)| p == prop) {
            Some(slot) => slot.1 = value.to_string(),
            None => merged.push((prop.to_string(), value.to_string())),
        }
    }

    let style = merged
        .iter()
        .map(|(p, v)| format!("{p}: {v};"))
        .collect::<Vec<_>>()
        .join(" ");
    set_attribute(handle, "style", &style);
}

/// Create a detached HTML element with the given attributes
pub fn create_element(local: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: (*value).into(),
        })
        .collect();

    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(local)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a detached text node
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// Append `child` as the last child of `parent`
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Put `replacement` where `target` sits in its parent.
///
/// Returns false (and changes nothing) when `target` is detached.
pub fn replace_node(target: &Handle, replacement: Handle) -> bool {
    replace_node_with(target, vec![replacement])
}

/// Put `replacements`, in order, where `target` sits in its parent.
pub fn replace_node_with(target: &Handle, replacements: Vec<Handle>) -> bool {
    let Some(weak_parent) = target.parent.take() else {
        return false;
    };
    let Some(parent) = weak_parent.upgrade() else {
        return false;
    };

    let mut children = parent.children.borrow_mut();
    match children.iter().position(|c| Rc::ptr_eq(c, target)) {
        Some(pos) => {
            for node in &replacements {
                node.parent.set(Some(Rc::downgrade(&parent)));
            }
            children.splice(pos..=pos, replacements);
            true
        }
        None => {
            target.parent.set(Some(weak_parent));
            false
        }
    }
}

/// Parent of `handle`, if it is attached.
pub fn parent(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take()?;
    let parent = weak.upgrade();
    handle.parent.set(Some(weak));
    parent
}

/// Insert `node` as the sibling immediately before `target`.
pub fn insert_before(target: &Handle, node: Handle) -> bool {
    let Some(parent) = parent(target) else {
        return false;
    };
    let mut children = parent.children.borrow_mut();
    let Some(pos) = children.iter().position(|c| Rc::ptr_eq(c, target)) else {
        return false;
    };
    node.parent.set(Some(Rc::downgrade(&parent)));
    children.insert(pos, node);
    true
}

/// Detach `handle` from its parent.
pub fn detach(handle: &Handle) {
    if let Some(parent) = parent(handle) {
        parent
            .children
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, handle));
    }
    handle.parent.take();
}

/// Remove every element named in `names` from the subtree.
///
/// Returns the number of elements removed.
pub fn remove_elements(handle: &Handle, names: &[&str]) -> usize {
    let mut removed = 0;
    handle.children.borrow_mut().retain(|child| {
        let doomed = element_name(child).is_some_and(|n| names.contains(&n));
        if doomed {
            child.parent.take();
            removed += 1;
        }
        !doomed
    });

    for child in handle.children.borrow().iter() {
        removed += remove_elements(child, names);
    }
    removed
}

/// Visit every element in the subtree (document order)
pub fn for_each_element<F>(handle: &Handle, f: &mut F)
where
    F: FnMut(&Handle),
{
    if matches!(handle.data, NodeData::Element { .. }) {
        f(handle);
    }
    for child in handle.children.borrow().iter() {
        for_each_element(child, f);
    }
}

/// Get the `body` element of a parsed document
pub fn body(dom: &RcDom) -> Option<Handle> {
    find_first_element(&dom.document, "body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_children() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let dom = parse_html(html);
        let body = body(&dom).unwrap();
        assert_eq!(serialize_children(&body), "<p>Hello</p>");
    }

    #[test]
    fn test_parse_fragment() {
        let dom = parse_fragment("<p>One</p><p>Two</p>");
        let body = body(&dom).unwrap();
        assert_eq!(find_elements_by_name(&body, "p").len(), 2);
    }

    #[test]
    fn test_self_closing_title_does_not_swallow_body() {
        let html = r#"<html><head><title/></head><body><h1>Welcome</h1></body></html>"#;
        let dom = parse_html(html);
        let h1 = find_first_element(&dom.document, "h1").expect("h1 should be parsed");
        assert_eq!(get_text_content(&h1), "Welcome");
        let title = find_first_element(&dom.document, "title").unwrap();
        assert_eq!(get_text_content(&title), "");
    }

    #[test]
    fn test_expand_self_closing_keeps_void_elements() {
        assert_eq!(
            expand_self_closing(r#"<a id="x"/><br/><img src="a.png"/>"#),
            r#"<a id="x"></a><br/><img src="a.png"/>"#
        );
    }

    #[test]
    fn test_get_text_content() {
        let html = "<p>Hello <strong>World</strong></p>";
        let dom = parse_html(html);
        let p = find_first_element(&dom.document, "p").unwrap();
        assert_eq!(get_text_content(&p).trim(), "Hello World");
    }

    #[test]
    fn test_xlink_href_in_svg() {
        let html = r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><image xlink:href="a.png" href="b.png"/></svg>"#;
        let dom = parse_fragment(html);
        let image = find_first_element(&dom.document, "image").unwrap();
        assert_eq!(get_xlink_href(&image).as_deref(), Some("a.png"));
        assert_eq!(get_attribute(&image, "href").as_deref(), Some("b.png"));
    }

    #[test]
    fn test_set_style_overrides_in_order() {
        let dom = parse_fragment(r#"<img style="height: 20px; color: red">"#);
        let img = find_first_element(&dom.document, "img").unwrap();
        set_style(&img, &[("max-width", "100%"), ("height", "auto")]);
        assert_eq!(
            get_attribute(&img, "style").as_deref(),
            Some("height: auto; color: red; max-width: 100%;")
        );
    }

    #[test]
    fn test_replace_node() {
        let dom = parse_fragment("<div><span>old</span></div>");
        let span = find_first_element(&dom.document, "span").unwrap();
        let replacement = create_element("img", &[("alt", "new")]);
        assert!(replace_node(&span, replacement));
        assert!(!replace_node(&span, create_element("b", &[])));

        let div = find_first_element(&dom.document, "div").unwrap();
        assert_eq!(serialize_children(&div), r#"<img alt="new">"#);
    }

    #[test]
    fn test_replace_node_with_several() {
        let dom = parse_fragment("<p>a<b>x</b>c</p>");
        let bold = find_first_element(&dom.document, "b").unwrap();
        let mark = create_element("mark", &[]);
        append_child(&mark, create_text("y"));
        assert!(replace_node_with(&bold, vec![create_text("1"), mark, create_text("2")]));

        let p = find_first_element(&dom.document, "p").unwrap();
        assert_eq!(serialize_children(&p), "a1<mark>y</mark>2c");
    }

    #[test]
    fn test_insert_before_and_detach() {
        let dom = parse_fragment("<p>a<b>x</b>c</p>");
        let bold = find_first_element(&dom.document, "b").unwrap();
        let p = parent(&bold).unwrap();
        assert_eq!(element_name(&p), Some("p"));

        assert!(insert_before(&bold, create_element("br", &[])));
        detach(&bold);
        assert!(parent(&bold).is_none());
        assert_eq!(serialize_children(&p), "a<br>c");
    }

    #[test]
    fn test_remove_elements() {
        let dom = parse_fragment("<p>a<script>x()</script></p><script src=\"y.js\"></script>");
        let body = body(&dom).unwrap();
        assert_eq!(remove_elements(&body, &["script"]), 2);
        assert_eq!(serialize_children(&body), "<p>a</p>");
    }

    #[test]
    fn test_remove_attributes() {
        let dom = parse_fragment(r#"<p onclick="x()" class="c">t</p>"#);
        let p = find_first_element(&dom.document, "p").unwrap();
        remove_attributes(&p, |name| name.starts_with("on"));
        assert_eq!(serialize_node(&p), r#"<p class="c">t</p>"#);
    }
}
