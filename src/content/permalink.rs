//! Output path and URL assignment for documents.
//!
//! | Source | Front matter | Output path | URL |
//! |--------|--------------|-------------|-----|
//! | `index.md` | | `index.html` | `/` |
//! | `posts/index.md` | | `posts/index.html` | `/posts/` |
//! | `posts/hello.md` | | `posts/hello/index.html` | `/posts/hello/` |
//! | `about.md` | `permalink: /me/` | `me/index.html` | `/me/` |
//! | `old.md` | `permalink: /notes/old.html` | `notes/old.html` | `/notes/old.html` |

use crate::{
    config::SlugMode,
    utils::{slug::slugify_path, to_url_path},
};
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Where a page lands, relative to the output directory, and its URL path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permalink {
    /// e.g. `posts/hello/index.html`
    pub path: PathBuf,
    /// e.g. `/posts/hello/`
    pub url: String,
}

impl Permalink {
    /// Permalink of a content file at `relative` (path under the content dir).
    pub fn for_document(relative: &Path, explicit: Option<&str>, mode: SlugMode) -> Self {
        let path = match explicit {
            Some(explicit) => explicit_path(explicit),
            None => implicit_path(relative),
        };
        Self::from_output_path(slugify_path(&path, mode))
    }

    /// Build from an output path; `index.html` collapses to its directory URL.
    pub fn from_output_path(path: PathBuf) -> Self {
        let url = to_url_path(&path);
        let url = match url.strip_suffix(INDEX_FILE) {
            Some(dir) => format!("/{dir}"),
            None => format!("/{url}"),
        };
        Self { path, url }
    }

    /// Permalink of a directory-style page, e.g. `tags/rust` → `tags/rust/index.html`.
    pub fn for_directory(dir: &Path) -> Self {
        Self::from_output_path(dir.join(INDEX_FILE))
    }

    /// Absolute URL for feeds and sitemaps.
    pub fn full_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.url)
    }
}

fn implicit_path(relative: &Path) -> PathBuf {
    let stem = relative.with_extension("");
    match stem.file_name().and_then(|n| n.to_str()) {
        Some("index") => stem.with_file_name(INDEX_FILE),
        _ => stem.join(INDEX_FILE),
    }
}

fn explicit_path(permalink: &str) -> PathBuf {
    let trimmed = permalink.trim().trim_start_matches('/');
    if trimmed.ends_with(".html") || trimmed.ends_with(".htm") || trimmed.ends_with(".xml") {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(trimmed.trim_end_matches('/')).join(INDEX_FILE)
    }
}
