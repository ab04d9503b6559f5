//! `[build]` section configuration.
//!
//! Source/output directories, layout fallback, and the derived outputs
//! (tag pages, feed, sitemap).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::path::{Component, Path, PathBuf};

/// URL slug generation mode for output paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Always convert to an ASCII slug (e.g., "Hello World" → "hello-world").
    On,
    /// Strip characters that are unsafe in paths, keep the rest (default).
    #[default]
    Safe,
    /// No slugification; preserve original text.
    No,
}

/// `[build]` section in quire.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// templates = "templates"
/// output = "public"
/// default_layout = "page"
///
/// [build.rss]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Content source directory (Markdown/HTML documents).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Template directory (layouts and partials).
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Static assets directory, copied verbatim.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Layout used by documents that do not declare one.
    #[serde(default = "defaults::build::default_layout")]
    #[educe(Default = defaults::build::default_layout())]
    pub default_layout: String,

    /// Minify HTML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Clear output directory before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Publish documents marked `draft: true`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// URL slugification settings.
    #[serde(default)]
    pub slug: SlugConfig,

    /// Tag index pages.
    #[serde(default)]
    pub tags: TagsConfig,

    /// RSS feed generation settings.
    #[serde(default)]
    pub rss: RssConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.slug]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slugify output paths
    #[serde(default = "defaults::build::slug::path")]
    #[educe(Default = defaults::build::slug::path())]
    pub path: SlugMode,
}

/// `[build.tags]` section - one listing page per tag plus an overview.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TagsConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output directory for tag pages, relative to the output root.
    #[serde(
        default = "defaults::build::tags::path",
        deserialize_with = "output_relative"
    )]
    #[educe(Default = defaults::build::tags::path())]
    pub path: PathBuf,
}

/// `[build.rss]` section - RSS feed generation configuration.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    /// Enable RSS feed generation. Requires `[base].url`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Output path for the feed, relative to the output root.
    #[serde(
        default = "defaults::build::rss::path",
        deserialize_with = "output_relative"
    )]
    #[educe(Default = defaults::build::rss::path())]
    pub path: PathBuf,

    /// Maximum number of entries, newest first.
    #[serde(default = "defaults::build::rss::limit")]
    #[educe(Default = defaults::build::rss::limit())]
    pub limit: usize,
}

/// `[build.sitemap]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path for the sitemap, relative to the output root.
    #[serde(
        default = "defaults::build::sitemap::path",
        deserialize_with = "output_relative"
    )]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// True for a non-empty path that stays inside the output directory.
pub fn is_output_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn output_relative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
    let path = PathBuf::deserialize(deserializer)?;
    if !is_output_relative(&path) {
        return Err(de::Error::custom(format!(
            "`{}` must be a relative path inside the output directory",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config = SiteConfig::default();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.default_layout, "page");
        assert!(!config.build.minify);
        assert!(!config.build.drafts);
        assert_eq!(config.build.slug.path, SlugMode::Safe);
        assert!(config.build.tags.enable);
        assert!(!config.build.rss.enable);
        assert_eq!(config.build.rss.limit, 20);
        assert!(config.build.sitemap.enable);
    }

    #[test]
    fn test_build_config_sections() {
        let config = r#"
            [build]
            content = "posts"
            output = "dist"
            default_layout = "post"

            [build.slug]
            path = "on"

            [build.tags]
            path = "topics"

            [build.rss]
            enable = true
            path = "rss.xml"
            limit = 5

            [build.sitemap]
            enable = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.content, PathBuf::from("posts"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.default_layout, "post");
        assert_eq!(config.build.slug.path, SlugMode::On);
        assert_eq!(config.build.tags.path, PathBuf::from("topics"));
        assert!(config.build.rss.enable);
        assert_eq!(config.build.rss.path, PathBuf::from("rss.xml"));
        assert_eq!(config.build.rss.limit, 5);
        assert!(!config.build.sitemap.enable);
    }

    #[test]
    fn test_derived_paths_must_stay_in_output() {
        for section in ["tags", "rss", "sitemap"] {
            for path in ["/tmp/escaped", "../outside", "tags/../../up", ""] {
                let config = format!("[build.{section}]\npath = \"{path}\"");
                assert!(
                    toml::from_str::<SiteConfig>(&config).is_err(),
                    "[build.{section}] path = {path:?} accepted"
                );
            }
        }

        let config: SiteConfig = toml::from_str("[build.tags]\npath = \"blog/topics\"").unwrap();
        assert_eq!(config.build.tags.path, PathBuf::from("blog/topics"));
    }

    #[test]
    fn test_invalid_slug_mode_rejected() {
        let result = toml::from_str::<SiteConfig>("[build.slug]\npath = \"maybe\"");
        assert!(result.is_err());
    }
}
