//! Content store: every document under `[build].content`.
//!
//! Documents are parsed in parallel, then drafts are dropped and
//! permalinks checked for collisions. The returned list is sorted by
//! source path.

pub mod front_matter;
pub mod permalink;

pub use front_matter::FrontMatter;
pub use permalink::Permalink;

use crate::{
    config::{SiteConfig, SlugMode},
    error::{BuildError, Result},
    utils::{collect_all_files, slug::slugify_tag},
};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Marker separating a post's summary from the rest of its body.
pub const MORE_MARKER: &str = "<!-- more -->";

/// How a document body is turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Markdown,
    /// Substituted verbatim.
    Html,
}

impl BodyFormat {
    /// Format for a file extension, or `None` for non-content files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A parsed content file. Immutable after load.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path of the source file.
    pub source: PathBuf,
    /// Path relative to the content directory.
    pub relative: PathBuf,
    pub front: FrontMatter,
    /// Body text after the front-matter block.
    pub body: String,
    pub format: BodyFormat,
    pub permalink: Permalink,
}

impl Document {
    /// Parse one content file from its text.
    pub fn parse(source: PathBuf, relative: PathBuf, text: &str, mode: SlugMode) -> Result<Self> {
        let malformed = |reason: String| BuildError::MalformedFrontMatter {
            path: source.clone(),
            reason,
        };

        let format = BodyFormat::from_path(&relative).unwrap_or(BodyFormat::Markdown);
        let (meta, body) = front_matter::split(text).map_err(malformed)?;
        let front = match meta {
            Some((syntax, raw)) => front_matter::parse(syntax, raw).map_err(malformed)?,
            None => FrontMatter::default(),
        };
        if let Some(tag) = front.tags.iter().find(|tag| slugify_tag(tag).is_empty()) {
            return Err(malformed(format!("tag `{tag}` has no characters usable in a URL")));
        }
        let permalink = Permalink::for_document(&relative, front.permalink.as_deref(), mode);

        Ok(Self {
            body: body.to_owned(),
            source,
            relative,
            front,
            format,
            permalink,
        })
    }

    /// Front-matter title, else the file stem (`index` uses its directory name).
    pub fn title(&self) -> String {
        if let Some(title) = &self.front.title {
            return title.clone();
        }
        let stem = self.relative.file_stem().and_then(|s| s.to_str());
        match stem {
            Some("index") => self
                .relative
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("index")
                .to_owned(),
            Some(stem) => stem.to_owned(),
            None => String::new(),
        }
    }

    /// Declared layout, else `default`.
    pub fn layout<'a>(&'a self, default: &'a str) -> &'a str {
        self.front.layout.as_deref().unwrap_or(default)
    }

    /// Body text before the `<!-- more -->` marker, if present.
    pub fn excerpt(&self) -> Option<&str> {
        self.body
            .split_once(MORE_MARKER)
            .map(|(before, _)| before.trim())
            .filter(|before| !before.is_empty())
    }
}

/// Load every document under `[build].content`.
pub fn load(config: &SiteConfig) -> Result<Vec<Document>> {
    let root = &config.build.content;
    let mode = config.build.slug.path;

    let documents: Vec<Document> = collect_all_files(root)?
        .into_par_iter()
        .filter(|path| BodyFormat::from_path(path).is_some())
        .map(|path| {
            let text = fs::read_to_string(&path).map_err(|err| BuildError::read(&path, err))?;
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            Document::parse(path, relative, &text, mode)
        })
        .collect::<Result<_>>()?;

    let documents: Vec<Document> = documents
        .into_iter()
        .filter(|doc| config.build.drafts || !doc.front.draft)
        .collect();

    ensure_unique(documents.iter().map(|doc| (&doc.permalink, doc.source.as_path())))?;
    Ok(documents)
}

/// Non-content files under the content directory, copied verbatim.
pub fn content_assets(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let files = collect_all_files(&config.build.content)?;
    Ok(files
        .into_iter()
        .filter(|path| BodyFormat::from_path(path).is_none())
        .collect())
}

/// Fail on the first output path claimed by two sources, or written as a
/// file by one source while another needs it as a directory.
pub fn ensure_unique<'a>(
    entries: impl IntoIterator<Item = (&'a Permalink, &'a Path)>,
) -> Result<()> {
    let mut seen: BTreeMap<&Path, (&Permalink, &Path)> = BTreeMap::new();
    for (permalink, source) in entries {
        if let Some((_, first)) = seen.insert(&permalink.path, (permalink, source)) {
            return Err(BuildError::DuplicatePermalink {
                permalink: permalink.url.clone(),
                first: first.to_path_buf(),
                second: source.to_path_buf(),
            });
        }
    }

    for (path, (_, source)) in &seen {
        if let Some((file, first)) = path.ancestors().skip(1).find_map(|dir| seen.get(dir)) {
            return Err(BuildError::DuplicatePermalink {
                permalink: file.url.clone(),
                first: first.to_path_buf(),
                second: source.to_path_buf(),
            });
        }
    }
    Ok(())
}
