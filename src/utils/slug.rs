//! URL slugification for output paths and tag names.

use crate::config::SlugMode;
use std::path::{Component, Path, PathBuf};

/// Characters forbidden in file paths
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '"', '\t', '\r', '\n',
];

/// Slugify each normal component of a relative path.
///
/// `..`, `.` and root components are dropped so a permalink can never
/// escape the output directory.
pub fn slugify_path(path: &Path, mode: SlugMode) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .map(|part| slugify_component(&part, mode))
        .filter(|part| !part.is_empty())
        .collect()
}

/// Slug for a tag name. Tags always get a full ASCII slug so their URLs
/// are stable regardless of the path mode.
///
/// Empty when nothing usable remains, e.g. for `"#"` or `".."`.
pub fn slugify_tag(tag: &str) -> String {
    let slug = slug::slugify(tag);
    if !slug.is_empty() {
        return slug;
    }
    let fallback: String = sanitize_text(tag).chars().filter(|&c| c != '/').collect();
    if fallback.chars().all(|c| c == '.') {
        String::new()
    } else {
        fallback
    }
}

fn slugify_component(part: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::On => match part.rsplit_once('.') {
            // keep file extensions such as `index.html` intact
            Some((stem, ext)) if !stem.is_empty() && is_extension(ext) => {
                format!("{}.{ext}", slug::slugify(stem))
            }
            _ => slug::slugify(part),
        },
        SlugMode::Safe => sanitize_text(part),
        SlugMode::No => part.to_owned(),
    }
}

fn is_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
