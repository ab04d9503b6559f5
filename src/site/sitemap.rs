//! Sitemap generation.
//!
//! Lists every HTML page for search engine indexing:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    content::Permalink,
    render::Page,
    utils::minify::{MinifyType, minify},
};
use std::fmt::Write;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Single URL entry in the sitemap
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UrlEntry {
    /// Full URL location
    pub loc: String,
    /// Last modification date, `YYYY-MM-DD`
    pub lastmod: Option<String>,
}

/// Build the sitemap page if enabled in config. Entries are sorted by URL.
pub fn build_sitemap(mut entries: Vec<UrlEntry>, config: &SiteConfig) -> Option<Page> {
    if !config.build.sitemap.enable {
        return None;
    }

    entries.sort();
    let xml = into_xml(&entries);
    let content = minify(MinifyType::Xml(xml.as_bytes()), config.build.minify).into_owned();
    let permalink = Permalink::from_output_path(config.build.sitemap.path.clone());
    Some(Page {
        path: permalink.path,
        url: permalink.url,
        content,
    })
}

fn into_xml(entries: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    let _ = writeln!(xml, r#"<urlset xmlns="{SITEMAP_NS}">"#);

    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
        if let Some(lastmod) = &entry.lastmod {
            let _ = writeln!(xml, "    <lastmod>{lastmod}</lastmod>");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
