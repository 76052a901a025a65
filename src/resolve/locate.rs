//! Finding the archive entry an image reference points at.
//!
//! Real-world EPUBs reference images with paths that are relative to the
//! wrong directory, differ in case, or point at folders that were renamed
//! during packaging. Resolution therefore tries an ordered list of guesses
//! and finally scans the whole archive.

use percent_encoding::percent_decode_str;

use super::mime::is_image_path;
use crate::archive::Archive;
use crate::path;

/// Resolve an image reference against the chapter that contains it.
///
/// `../x` and `./x` and bare `x` are relative to `chapter_dir`; `/x` is
/// relative to `base_dir` (the archive root when that is empty).
pub fn resolve_reference(reference: &str, chapter_dir: &str, base_dir: &str) -> String {
    match reference.strip_prefix('/') {
        Some(rooted) => path::normalize(&path::join(base_dir, rooted)),
        None => path::normalize(&path::join(chapter_dir, reference)),
    }
}

/// Ordered, de-duplicated list of archive paths to probe for `reference`.
///
/// The resolved path comes first, then the conventional image folders, the
/// bare file name and finally the reference exactly as written.
pub fn candidate_paths(reference: &str, chapter_path: &str, base_dir: &str) -> Vec<String> {
    let decoded = percent_decode_str(reference)
        .decode_utf8()
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| reference.to_string());
    let target = path::strip_fragment(&decoded);
    let file_name = path::file_name(target);

    let mut candidates = vec![resolve_reference(
        target,
        path::parent_dir(chapter_path),
        base_dir,
    )];
    if !file_name.is_empty() {
        candidates.push(format!("Images/{file_name}"));
        candidates.push(format!("images/{file_name}"));
        candidates.push(format!("OEBPS/Images/{file_name}"));
        candidates.push(format!("OEBPS/images/{file_name}"));
        if !base_dir.is_empty() {
            candidates.push(format!("{base_dir}/Images/{file_name}"));
            candidates.push(format!("{base_dir}/images/{file_name}"));
        }
        candidates.push(file_name.to_string());
    }
    candidates.push(reference.to_string());

    let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}

/// Probe `candidates` in order, each as written and then lowercased.
pub fn probe<A: Archive + ?Sized>(archive: &A, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        if archive.has_entry(candidate) {
            return Some(candidate.clone());
        }
        let lower = candidate.to_lowercase();
        (lower != *candidate && archive.has_entry(&lower)).then_some(lower)
    })
}

/// Last resort: look through every image entry in the archive.
///
/// Prefers an exact (case-insensitive) file name match, then the first
/// image whose file name starts with the reference's base name.
pub fn scan<A: Archive + ?Sized>(archive: &A, file_name: &str) -> Option<String> {
    if file_name.is_empty() {
        return None;
    }
    let images: Vec<String> = archive
        .entry_paths()
        .into_iter()
        .filter(|entry| is_image_path(entry))
        .collect();

    if let Some(exact) = images
        .iter()
        .find(|entry| path::file_name(entry).eq_ignore_ascii_case(file_name))
    {
        return Some(exact.clone());
    }

    let stem = path::file_stem(file_name).to_lowercase();
    if stem.is_empty() {
        return None;
    }
    images
        .into_iter()
        .find(|entry| path::file_name(entry).to_lowercase().starts_with(&stem))
}

/// Outcome of locating one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// The archive path that matched.
    Found(String),
    /// Nothing matched; carries the candidate paths that were probed.
    Missing(Vec<String>),
}

/// Run the full cascade for one reference: candidates, then archive scan.
pub fn locate<A: Archive + ?Sized>(
    archive: &A,
    reference: &str,
    chapter_path: &str,
    base_dir: &str,
) -> Located {
    let candidates = candidate_paths(reference, chapter_path, base_dir);
    if let Some(found) = probe(archive, &candidates) {
        return Located::Found(found);
    }

    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let file_name = path::file_name(path::strip_fragment(&decoded));
    match scan(archive, file_name) {
        Some(found) => {
            tracing::debug!(reference, %found, "image found by archive scan");
            Located::Found(found)
        }
        None => Located::Missing(candidates),
    }
}
