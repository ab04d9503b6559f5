//! Site assembly: index, render, then write.
//!
//! [`build`] produces every [`Page`] in memory and plans the asset copies;
//! [`write`] puts them on disk. A build that fails before writing leaves
//! the output directory untouched.

pub mod context;
pub mod feed;
pub mod index;
pub mod sitemap;

use crate::{
    config::SiteConfig,
    content::{self, Document, Permalink},
    error::{BuildError, Result},
    render::{self, Context, Page, Renderer},
    template::{TemplateResolver, TemplateTree},
    utils::collect_all_files,
};
use index::SiteIndex;
use rayon::prelude::*;
use serde_json::Value;
use sitemap::UrlEntry;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

const TAG_LAYOUT: &str = "tag";
const TAGS_LAYOUT: &str = "tags";

/// A page with no source document.
struct DerivedPage {
    /// Names the page in error messages.
    origin: PathBuf,
    permalink: Permalink,
    layout: &'static str,
    page: Value,
}

/// A file copied verbatim into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source: PathBuf,
    /// Relative to the output directory.
    pub path: PathBuf,
}

impl Asset {
    fn under(root: &Path, source: PathBuf) -> Self {
        let path = source.strip_prefix(root).unwrap_or(&source).to_path_buf();
        Self { source, path }
    }
}

/// Everything a build puts into the output directory.
#[derive(Debug, Clone, Default)]
pub struct SiteOutput {
    pub pages: Vec<Page>,
    pub assets: Vec<Asset>,
}

/// Files written by [`write`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub pages: usize,
    pub assets: usize,
}

/// Render every document plus the derived pages, and collect assets.
///
/// `on_progress` is called once per rendered document.
pub fn build(
    documents: &[Document],
    resolver: &TemplateResolver,
    config: &SiteConfig,
    on_progress: impl Fn() + Sync,
) -> Result<SiteOutput> {
    let index = SiteIndex::build(documents, config);
    let summaries: Vec<Option<String>> = documents.par_iter().map(render::summary_html).collect();
    let site = context::site_value(documents, &summaries, &index, config);
    let derived = plan_derived(documents, &summaries, &index, config);

    let assets = collect_assets(config)?;

    check_output_paths(documents, &derived, &assets, config)?;

    let default_layout = config.build.default_layout.as_str();
    let mut trees: BTreeMap<&str, Arc<TemplateTree>> = BTreeMap::new();
    let requests = documents
        .iter()
        .map(|doc| (doc.layout(default_layout), doc.source.as_path()))
        .chain(derived.iter().map(|d| (d.layout, d.origin.as_path())));
    for (layout, requested_by) in requests {
        if !trees.contains_key(layout) {
            trees.insert(layout, resolver.resolve(layout, requested_by)?);
        }
    }

    let renderer = Renderer::new(config);

    let mut pages: Vec<Page> = documents
        .par_iter()
        .zip(summaries.par_iter())
        .map(|(doc, summary)| {
            let page = context::document_page(doc, summary.as_deref(), config);
            let ctx = Context {
                site: &site,
                page: &page,
            };
            let result = renderer.render(doc, &trees[doc.layout(default_layout)], ctx);
            on_progress();
            result
        })
        .collect::<Result<_>>()?;

    let derived_pages: Vec<Page> = derived
        .par_iter()
        .map(|d| {
            let ctx = Context {
                site: &site,
                page: &d.page,
            };
            renderer.render_derived(&d.origin, &d.permalink, &trees[d.layout], ctx)
        })
        .collect::<Result<_>>()?;

    let base_url = config.base.base_url();
    let mut entries: Vec<UrlEntry> = documents
        .iter()
        .map(|doc| UrlEntry {
            loc: doc.permalink.full_url(base_url),
            lastmod: doc.front.updated.or(doc.front.date).map(|date| date.ymd()),
        })
        .collect();
    entries.extend(derived.iter().map(|d| UrlEntry {
        loc: d.permalink.full_url(base_url),
        lastmod: None,
    }));

    pages.extend(derived_pages);
    pages.extend(feed::build_feed(documents, &summaries, &index, config)?);
    pages.extend(sitemap::build_sitemap(entries, config));
    Ok(SiteOutput { pages, assets })
}

/// Tag listings and the tag overview, when `[build.tags]` is enabled.
fn plan_derived(
    documents: &[Document],
    summaries: &[Option<String>],
    index: &SiteIndex,
    config: &SiteConfig,
) -> Vec<DerivedPage> {
    if !config.build.tags.enable || index.tags.is_empty() {
        return Vec::new();
    }

    let mut derived: Vec<DerivedPage> = index
        .tags
        .values()
        .map(|tag| DerivedPage {
            origin: PathBuf::from(format!("<tag `{}`>", tag.name)),
            permalink: tag.permalink.clone(),
            layout: TAG_LAYOUT,
            page: context::tag_page(tag, documents, summaries, config),
        })
        .collect();

    let overview = SiteIndex::overview_permalink(config);
    derived.push(DerivedPage {
        origin: PathBuf::from("<tags overview>"),
        page: context::tags_page(index, &overview.url),
        permalink: overview,
        layout: TAGS_LAYOUT,
    });
    derived
}

/// Every output path must have exactly one producer.
fn check_output_paths(
    documents: &[Document],
    derived: &[DerivedPage],
    assets: &[Asset],
    config: &SiteConfig,
) -> Result<()> {
    let generated: Vec<(Permalink, PathBuf)> = [
        (config.build.rss.enable, &config.build.rss.path, "<rss feed>"),
        (config.build.sitemap.enable, &config.build.sitemap.path, "<sitemap>"),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| *enabled)
    .map(|(_, path, origin)| (Permalink::from_output_path(path.clone()), PathBuf::from(origin)))
    .collect();
    let copied: Vec<(Permalink, &Path)> = assets
        .iter()
        .map(|asset| (Permalink::from_output_path(asset.path.clone()), asset.source.as_path()))
        .collect();

    let claims = documents
        .iter()
        .map(|doc| (&doc.permalink, doc.source.as_path()))
        .chain(derived.iter().map(|d| (&d.permalink, d.origin.as_path())))
        .chain(generated.iter().map(|(p, origin)| (p, origin.as_path())))
        .chain(copied.iter().map(|(p, source)| (p, *source)));
    content::ensure_unique(claims)
}

/// Write pages and copy assets into the output directory.
///
/// With `[build].clean`, the output directory is removed first.
pub fn write(site: &SiteOutput, config: &SiteConfig) -> Result<WriteSummary> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output).map_err(|err| BuildError::write(output, err))?;
    }
    fs::create_dir_all(output).map_err(|err| BuildError::write(output, err))?;

    site.assets
        .par_iter()
        .try_for_each(|asset| copy_file(&asset.source, &output.join(&asset.path)))?;

    site.pages
        .par_iter()
        .try_for_each(|page| write_file(&output.join(&page.path), &page.content))?;

    Ok(WriteSummary {
        pages: site.pages.len(),
        assets: site.assets.len(),
    })
}

/// Files under `[build].assets` and non-document files under
/// `[build].content`.
fn collect_assets(config: &SiteConfig) -> Result<Vec<Asset>> {
    let assets_dir = &config.build.assets;
    let content_dir = &config.build.content;

    let assets = collect_all_files(assets_dir)?
        .into_iter()
        .map(|path| Asset::under(assets_dir, path))
        .chain(
            content::content_assets(config)?
                .into_iter()
                .map(|path| Asset::under(content_dir, path)),
        )
        .collect();
    Ok(assets)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| BuildError::write(parent, err))?;
    }
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|err| BuildError::write(path, err))
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    ensure_parent(dest)?;
    fs::copy(source, dest)
        .map(|_| ())
        .map_err(|err| BuildError::write(dest, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct TestSite {
        dir: TempDir,
    }

    impl TestSite {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn file(self, path: &str, content: &str) -> Self {
            let path = self.dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn config(&self) -> SiteConfig {
            let config_path = self.dir.path().join("quire.toml");
            let config = if config_path.exists() {
                SiteConfig::from_path(&config_path).unwrap()
            } else {
                SiteConfig::default()
            };
            config.with_root(self.dir.path())
        }

        /// Same steps as `quire build`.
        fn build(&self, config: &SiteConfig) -> Result<WriteSummary> {
            let documents = content::load(config)?;
            let resolver = TemplateResolver::load(&config.build.templates)?;
            resolver.validate()?;
            let site = build(&documents, &resolver, config, || {})?;
            write(&site, config)
        }

        fn output(&self, config: &SiteConfig, path: &str) -> String {
            fs::read_to_string(config.build.output.join(path)).unwrap()
        }
    }

    fn all_files(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        collect_all_files(dir)
            .unwrap()
            .into_iter()
            .map(|path| {
                let content = fs::read(&path).unwrap();
                (path.strip_prefix(dir).unwrap().to_path_buf(), content)
            })
            .collect()
    }

    fn blog() -> TestSite {
        TestSite::new()
            .file(
                "quire.toml",
                "[base]\ntitle = \"Blog\"\nurl = \"https://example.com\"\n[build.rss]\nenable = true\n",
            )
            .file(
                "content/posts/january.md",
                "---\ntitle: January\ndate: 2024-01-01\ntags: [x]\n---\nFirst post.\n",
            )
            .file(
                "content/posts/february.md",
                "---\ntitle: February\ndate: 2024-02-01\ntags: [x, y]\n---\nSecond post.\n\n<!-- more -->\n\nMore.\n",
            )
            .file("content/index.md", "---\ntitle: Home\n---\n# Welcome\n")
            .file("content/posts/cover.png", "png")
            .file("assets/style.css", "body {}")
    }

    #[test]
    fn test_build_writes_pages_feed_sitemap_and_assets() {
        let site = blog();
        let config = site.config();
        let summary = site.build(&config).unwrap();

        // 3 documents, 2 tag pages, tag overview, feed, sitemap
        assert_eq!(summary.pages, 8);
        assert_eq!(summary.assets, 2);

        let files: Vec<PathBuf> = all_files(&config.build.output).into_keys().collect();
        let expected: Vec<PathBuf> = [
            "feed.xml",
            "index.html",
            "posts/cover.png",
            "posts/february/index.html",
            "posts/january/index.html",
            "sitemap.xml",
            "style.css",
            "tags/index.html",
            "tags/x/index.html",
            "tags/y/index.html",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(files, expected);

        let home = site.output(&config, "index.html");
        assert!(home.contains("<h1 id=\"welcome\">Welcome</h1>"));
        assert!(home.contains("<title>Home | Blog</title>"));

        let sitemap = site.output(&config, "sitemap.xml");
        assert!(sitemap.contains("<loc>https://example.com/posts/february/</loc>"));
        assert!(sitemap.contains("<lastmod>2024-02-01</lastmod>"));

        let feed = site.output(&config, "feed.xml");
        assert!(feed.find("February").unwrap() < feed.find("January").unwrap());
    }

    #[test]
    fn test_tag_page_lists_newest_first() {
        let site = blog();
        let config = site.config();
        site.build(&config).unwrap();

        let tag_x = site.output(&config, "tags/x/index.html");
        let feb = tag_x.find("February").unwrap();
        let jan = tag_x.find("January").unwrap();
        assert!(feb < jan);

        let tag_y = site.output(&config, "tags/y/index.html");
        assert!(tag_y.contains("February"));
        assert!(!tag_y.contains("January"));

        let overview = site.output(&config, "tags/index.html");
        assert!(overview.contains("<a href=\"/tags/x/\">x</a> (2)"));
    }

    #[test]
    fn test_unknown_layout_writes_nothing() {
        let site = blog().file(
            "content/odd.md",
            "---\nlayout: fancy\n---\nNo such layout.\n",
        );
        let config = site.config();

        let err = site.build(&config).unwrap_err();
        match err {
            BuildError::UnknownLayout { layout, document } => {
                assert_eq!(layout, "fancy");
                assert!(document.ends_with("content/odd.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_unbound_variable_writes_nothing() {
        let site = blog().file("templates/page.html", "{{ page.nonexistent }}");
        let config = site.config();

        assert!(matches!(
            site.build(&config).unwrap_err(),
            BuildError::UnboundVariable { .. }
        ));
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_build_is_deterministic() {
        let site = blog();
        let mut first = site.config();
        first.build.output = site.dir.path().join("out-1");
        let mut second = site.config();
        second.build.output = site.dir.path().join("out-2");

        site.build(&first).unwrap();
        site.build(&second).unwrap();

        assert_eq!(all_files(&first.build.output), all_files(&second.build.output));
    }

    #[test]
    fn test_document_colliding_with_tag_page() {
        let site = blog().file("content/tags/x.md", "Claims the tag page path.");
        let config = site.config();

        match site.build(&config).unwrap_err() {
            BuildError::DuplicatePermalink {
                permalink,
                first,
                second,
            } => {
                assert_eq!(permalink, "/tags/x/");
                assert!(first.ends_with("content/tags/x.md"));
                assert_eq!(second, PathBuf::from("<tag `x`>"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cyclic_include_rejected() {
        let site = blog()
            .file("templates/page.html", "{% include \"partials/a\" %}")
            .file("templates/partials/a.html", "{% include \"partials/b\" %}")
            .file("templates/partials/b.html", "{% include \"partials/a\" %}");
        let config = site.config();

        let err = site.build(&config).unwrap_err();
        assert!(matches!(err, BuildError::CyclicInclude { .. }));
        assert!(err.to_string().contains("partials/a -> partials/b -> partials/a"));
    }

    #[test]
    fn test_site_layouts_and_partials() {
        let site = blog()
            .file(
                "templates/base.html",
                "<html>{% include \"partials/nav\" %}{{ content | safe }}</html>",
            )
            .file(
                "templates/partials/nav.html",
                "<nav>{% for post in site.posts %}<a href=\"{{ post.url }}\">{{ loop.index }}</a>{% endfor %}</nav>",
            )
            .file(
                "templates/page.html",
                "{% layout \"base\" %}\n<main>{{ content | safe }}</main>",
            );
        let config = site.config();
        site.build(&config).unwrap();

        assert_eq!(
            site.output(&config, "index.html"),
            "<html><nav><a href=\"/posts/february/\">1</a><a href=\"/posts/january/\">2</a></nav>\
             <main><h1 id=\"welcome\">Welcome</h1>\n</main></html>"
        );
    }

    #[test]
    fn test_drafts_and_clean() {
        let site = blog()
            .file("content/wip.md", "---\ndraft: true\n---\nWIP")
            .file("public/stale.html", "old");
        let mut config = site.config();
        config.build.clean = true;
        site.build(&config).unwrap();

        assert!(!config.build.output.join("wip/index.html").exists());
        assert!(!config.build.output.join("stale.html").exists());

        config.build.drafts = true;
        site.build(&config).unwrap();
        assert!(config.build.output.join("wip/index.html").exists());
    }

    #[test]
    fn test_tags_disabled() {
        let site = blog();
        let mut config = site.config();
        config.build.tags.enable = false;
        let summary = site.build(&config).unwrap();

        assert_eq!(summary.pages, 5);
        assert!(!config.build.output.join("tags").exists());
    }

    #[test]
    fn test_asset_clashing_with_content_asset() {
        let site = blog().file("content/style.css", "from content");
        let config = site.config();

        match site.build(&config).unwrap_err() {
            BuildError::DuplicatePermalink {
                permalink,
                first,
                second,
            } => {
                assert_eq!(permalink, "/style.css");
                assert!(first.ends_with("assets/style.css"));
                assert!(second.ends_with("content/style.css"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_asset_file_blocking_page_directory() {
        let site = blog().file("assets/posts/january", "not a directory");
        let config = site.config();

        match site.build(&config).unwrap_err() {
            BuildError::DuplicatePermalink { permalink, first, .. } => {
                assert_eq!(permalink, "/posts/january");
                assert!(first.ends_with("assets/posts/january"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_unwritable_output_aborts_with_write_error() {
        let site = blog().file("public", "a file where the output directory belongs");
        let config = site.config();

        match site.build(&config).unwrap_err() {
            BuildError::Write { path, .. } => assert_eq!(path, config.build.output),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stale_file_blocking_page_aborts() {
        let site = blog().file("public/posts", "stale");
        let config = site.config();

        match site.build(&config).unwrap_err() {
            BuildError::Write { path, .. } => {
                assert!(path.starts_with(config.build.output.join("posts")), "{path:?}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_site() {
        let site = TestSite::new();
        let config = site.config();
        let summary = site.build(&config).unwrap();

        // only the sitemap
        assert_eq!(summary, WriteSummary { pages: 1, assets: 0 });
    }
}
