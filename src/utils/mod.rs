pub mod date;
pub mod minify;
pub mod slug;

use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Collect all files from a directory recursively, sorted by path.
///
/// A missing directory yields an empty list. Any entry that cannot be
/// read fails the walk as [`BuildError::Read`].
pub fn collect_all_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            BuildError::read(path, err.into())
        })?;
        let name = entry.file_name().to_str().unwrap_or_default();
        if entry.file_type().is_file() && !IGNORED_FILES.contains(&name) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Forward-slash string form of a relative path, for URLs and template names.
pub fn to_url_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
