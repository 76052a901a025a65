//! POSIX-style helpers for archive entry paths.
//!
//! Archive paths never start with `/` and always use `/` as the separator.

/// Join a directory and a relative href. An empty directory means the
/// archive root.
pub fn join(dir: &str, href: &str) -> String {
    if dir.is_empty() {
        href.to_string()
    } else {
        format!("{dir}/{href}")
    }
}

/// Directory part of `path` (everything before the final `/`), or `""`.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Final path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name up to its first `.`: `cover.final.jpg` -> `cover`.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    name.split('.').next().unwrap_or(name)
}

/// Lowercased extension of the final segment, without the dot.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Drop a `#fragment` (and any `?query`) from an href.
pub fn strip_fragment(href: &str) -> &str {
    let end = href.find(['#', '?']).unwrap_or(href.len());
    &href[..end]
}

/// Collapse `.` and `..` segments and duplicate separators.
///
/// `..` segments that would climb above the root are dropped.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
