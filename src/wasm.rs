//! WASM bindings for the browser reader.
//!
//! Books cross the boundary as JSON strings; the front-end parses them with
//! `JSON.parse`.

use wasm_bindgen::prelude::*;

use crate::epub::read_book_from_bytes;
use crate::search::{SearchOptions, highlight, search};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse an EPUB.
///
/// Takes raw EPUB bytes and returns the book (metadata, chapters and
/// warnings) as JSON.
#[wasm_bindgen]
pub fn parse_epub(data: &[u8]) -> Result<String, JsValue> {
    let book = read_book_from_bytes(data).map_err(to_js_error)?;
    serde_json::to_string(&book).map_err(to_js_error)
}

/// Search an EPUB.
///
/// Takes raw EPUB bytes and a query and returns the hits as JSON, using the
/// default limits.
#[wasm_bindgen]
pub fn search_epub(data: &[u8], query: &str) -> Result<String, JsValue> {
    let book = read_book_from_bytes(data).map_err(to_js_error)?;
    let hits = search(&book, query, &SearchOptions::default());
    serde_json::to_string(&hits).map_err(to_js_error)
}

/// Wrap occurrences of `query` in chapter markup with highlight marks.
#[wasm_bindgen]
pub fn highlight_content(content: &str, query: &str) -> String {
    highlight(content, query)
}
