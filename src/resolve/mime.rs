//! Image formats recognised when inlining chapter images.

use crate::path;

/// Raster and vector image formats an EPUB chapter can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// SVG image (vector)
    Svg,
    /// WebP image
    WebP,
    /// Windows bitmap
    Bmp,
}

/// Extensions treated as images when scanning the whole archive.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp", "bmp"];

impl ImageFormat {
    /// Format named by a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "svg" => Some(ImageFormat::Svg),
            "webp" => Some(ImageFormat::WebP),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Format of the entry at `path`, assuming JPEG when the extension is
    /// missing or unrecognised.
    pub fn from_path(path: &str) -> Self {
        path::extension(path)
            .and_then(|ext| Self::from_extension(&ext))
            .unwrap_or(ImageFormat::Jpeg)
    }

    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

/// Returns true if `path` ends in one of [`IMAGE_EXTENSIONS`].
pub fn is_image_path(path: &str) -> bool {
    path::extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
