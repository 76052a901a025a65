use crate::error::Warning;

/// Fallback title when the package declares none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Fallback author when the package declares no creator.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// A fully resolved book, ready for a reader UI.
///
/// Built in one pass by [`assemble`](crate::epub::assemble) and never
/// mutated afterwards. `chapters` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "cli", feature = "wasm"), derive(serde::Serialize))]
pub struct Book {
    pub metadata: Metadata,
    pub chapters: Vec<Chapter>,
    /// Non-fatal problems recorded while resolving the book.
    pub warnings: Vec<Warning>,
}

/// Book metadata (Dublin Core subset)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "cli", feature = "wasm"), derive(serde::Serialize))]
pub struct Metadata {
    pub title: String,
    /// First declared creator.
    pub author: String,
    pub description: String,
    /// Every declared creator, in document order.
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub publisher: Option<String>,
    /// Manifest href of the cover image, relative to the package document.
    pub cover_image: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            description: String::new(),
            authors: Vec::new(),
            language: None,
            identifier: None,
            publisher: None,
            cover_image: None,
        }
    }
}

/// One entry of the reading order, rendered to self-contained HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "cli", feature = "wasm"), derive(serde::Serialize))]
pub struct Chapter {
    /// Display title; never empty.
    pub title: String,
    /// Sanitized body markup with images inlined as `data:` URIs.
    pub content: String,
    /// Path of the content document inside the archive.
    pub path: String,
    /// Manifest href, relative to the package document.
    pub href: String,
}

impl Book {
    /// Number of chapters.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    /// Always false for an assembled book; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Get a chapter by its position in reading order
    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Find the chapter whose manifest href is `href` (fragment ignored)
    pub fn chapter_by_href(&self, href: &str) -> Option<(usize, &Chapter)> {
        let href = crate::path::strip_fragment(href);
        self.chapters
            .iter()
            .enumerate()
            .find(|(_, chapter)| chapter.href == href)
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if self.authors.is_empty() {
            self.author = author.clone();
        }
        self.authors.push(author);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            path: String::new(),
            href: String::new(),
        }
    }

    pub fn with_location(mut self, path: impl Into<String>, href: impl Into<String>) -> Self {
        self.path = path.into();
        self.href = href.into();
        self
    }
}
