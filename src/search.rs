//! In-book text search and match highlighting.
//!
//! Search runs over the plain text of each chapter's resolved content.
//! Matching is a literal, case-insensitive substring match; the query is
//! never interpreted as a pattern.

use markup5ever_rcdom::NodeData;
use regex_lite::Regex;

use crate::book::Book;
use crate::dom::{self, Handle};

/// CSS class of the `<mark>` elements inserted by [`highlight`].
pub const HIGHLIGHT_CLASS: &str = "search-highlight";

/// Limits applied to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Queries shorter than this (after trimming) return nothing.
    pub min_query_len: usize,
    /// Maximum hits reported per chapter.
    pub max_per_chapter: usize,
    /// Maximum hits reported for the whole book.
    pub max_total: usize,
    /// Characters of surrounding text kept on each side of a match.
    pub context_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            max_per_chapter: 5,
            max_total: 50,
            context_chars: 50,
        }
    }
}

/// One occurrence of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "cli", feature = "wasm"), derive(serde::Serialize))]
pub struct SearchHit {
    pub chapter_index: usize,
    pub chapter_title: String,
    /// Text around the match, with `...` where it was cut.
    pub context: String,
    /// Character offset of the match within the chapter's text.
    pub match_index: usize,
    /// The matched text as it appears in the chapter.
    pub match_text: String,
}

/// Case-insensitive literal matcher for `query`, or `None` when the query
/// is too short to search for.
fn matcher(query: &str, min_len: usize) -> Option<Regex> {
    let query = query.trim();
    if query.is_empty() || query.chars().count() < min_len {
        return None;
    }
    Regex::new(&folded_pattern(query)).ok()
}

/// Escaped pattern for `query` with every cased character widened to a
/// class of its single-character case variants.
///
/// `regex-lite` only folds ASCII under `(?i)`, so `é` must be spelled
/// `[éÉ]` to match `É`.
fn folded_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() * 2);
    for c in query.chars() {
        let mut variants = vec![c];
        for variant in c.to_lowercase().chain(c.to_uppercase()) {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
        // Multi-character mappings (ß to SS) cannot sit in a class
        let single = c.to_lowercase().count() == 1 && c.to_uppercase().count() == 1;
        if variants.len() > 1 && single {
            pattern.push('[');
            for variant in variants {
                pattern.push_str(&regex_lite::escape(variant.encode_utf8(&mut [0; 4])));
            }
            pattern.push(']');
        } else {
            pattern.push_str(&regex_lite::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    pattern
}

/// Search every chapter of `book` for `query`, in reading order.
#[tracing::instrument(skip(book), fields(chapters = book.chapters.len()))]
pub fn search(book: &Book, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
    let Some(regex) = matcher(query, options.min_query_len) else {
        return Vec::new();
    };

    let mut hits = Vec::new();
    for (chapter_index, chapter) in book.chapters.iter().enumerate() {
        if hits.len() >= options.max_total {
            break;
        }
        let text = plain_text(&chapter.content);
        let remaining = options.max_total - hits.len();

        for found in regex
            .find_iter(&text)
            .take(options.max_per_chapter.min(remaining))
        {
            hits.push(SearchHit {
                chapter_index,
                chapter_title: chapter.title.clone(),
                context: context_window(&text, found.start(), found.end(), options.context_chars),
                match_index: text[..found.start()].chars().count(),
                match_text: found.as_str().to_string(),
            });
        }
    }

    tracing::debug!(hits = hits.len(), "search complete");
    hits
}

/// Text content of a chapter's markup, tags stripped.
pub fn plain_text(content: &str) -> String {
    let dom = dom::parse_fragment(content);
    dom::body(&dom)
        .map(|body| dom::get_text_content(&body))
        .unwrap_or_default()
}

/// `text[start..end]` plus up to `context` characters on each side.
fn context_window(text: &str, start: usize, end: usize, context: usize) -> String {
    let before = &text[..start];
    let after = &text[end..];

    let lead = if context == 0 {
        start
    } else {
        before
            .char_indices()
            .rev()
            .nth(context - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let tail = after
        .char_indices()
        .nth(context)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let mut window = String::new();
    if lead > 0 {
        window.push_str("...");
    }
    window.push_str(&text[lead..tail]);
    if tail < text.len() {
        window.push_str("...");
    }
    window
}

/// Wrap every occurrence of `query` in `content` with
/// `<mark class="search-highlight">`.
///
/// Only text is matched, never tag names or attribute values. Returns the
/// content unchanged when the query is too short to search for.
pub fn highlight(content: &str, query: &str) -> String {
    let Some(regex) = matcher(query, SearchOptions::default().min_query_len) else {
        return content.to_string();
    };
    let dom = dom::parse_fragment(content);
    let Some(body) = dom::body(&dom) else {
        return content.to_string();
    };

    let mut texts = Vec::new();
    collect_text_nodes(&body, &mut texts);

    for node in texts {
        let text = match node.data {
            NodeData::Text { ref contents } => contents.borrow().to_string(),
            _ => continue,
        };
        if !regex.is_match(&text) {
            continue;
        }

        let mut pieces = Vec::new();
        let mut last = 0;
        for found in regex.find_iter(&text) {
            if found.start() > last {
                pieces.push(dom::create_text(&text[last..found.start()]));
            }
            let mark = dom::create_element("mark", &[("class", HIGHLIGHT_CLASS)]);
            dom::append_child(&mark, dom::create_text(found.as_str()));
            pieces.push(mark);
            last = found.end();
        }
        if last < text.len() {
            pieces.push(dom::create_text(&text[last..]));
        }
        dom::replace_node_with(&node, pieces);
    }

    dom::serialize_children(&body)
}

/// Text nodes outside `script`, `style` and existing highlights.
fn collect_text_nodes(handle: &Handle, out: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        match dom::element_name(child) {
            Some("script" | "style" | "mark") => {}
            Some(_) => collect_text_nodes(child, out),
            None => {
                if matches!(child.data, NodeData::Text { .. }) {
                    out.push(child.clone());
                }
            }
        }
    }
}
