//! `[base]` section configuration.
//!
//! Site-wide metadata exposed to templates as `site.*`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quire.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Site"
/// description = "Essays on programming"
/// author = "Alice"
/// url = "https://example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    #[serde(default)]
    pub title: String,

    /// Author name for feed entries and meta tags.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Author email for the feed.
    #[serde(default = "defaults::base::email")]
    #[educe(Default = defaults::base::email())]
    pub email: String,

    /// Site description for SEO meta tags and the feed channel.
    #[serde(default)]
    pub description: String,

    /// Base URL for absolute links in feed/sitemap.
    /// Required when `[build.rss].enable = true`.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Copyright notice for the site footer.
    #[serde(default)]
    pub copyright: String,
}

impl BaseConfig {
    /// Base URL without a trailing slash, empty when unset.
    pub fn base_url(&self) -> &str {
        self.url.as_deref().unwrap_or_default().trim_end_matches('/')
    }
}
