//! RSS feed generation.
//!
//! The newest `[build.rss].limit` dated documents become feed items.

use super::index::SiteIndex;
use crate::{
    config::SiteConfig,
    content::{Document, Permalink},
    error::{BuildError, Result},
    render::Page,
    utils::minify::{MinifyType, minify},
};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::sync::LazyLock;

/// Build the feed page if enabled in config.
pub fn build_feed(
    documents: &[Document],
    summaries: &[Option<String>],
    index: &SiteIndex,
    config: &SiteConfig,
) -> Result<Option<Page>> {
    if !config.build.rss.enable {
        return Ok(None);
    }

    let items: Vec<rss::Item> = index
        .posts
        .iter()
        .take(config.build.rss.limit)
        .map(|&i| to_rss_item(&documents[i], summaries[i].as_deref(), config))
        .collect();
    let last_build_date = index
        .posts
        .first()
        .and_then(|&i| documents[i].front.date)
        .map(|date| date.to_rfc2822());

    let base = &config.base;
    let channel = ChannelBuilder::default()
        .title(&base.title)
        .link(base.base_url())
        .description(&base.description)
        .language(Some(base.language.clone()))
        .copyright((!base.copyright.is_empty()).then(|| base.copyright.clone()))
        .last_build_date(last_build_date)
        .generator(Some("quire".to_owned()))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| BuildError::Feed(format!("rss validation failed: {e}")))?;

    let xml = channel.to_string();
    let content = minify(MinifyType::Xml(xml.as_bytes()), config.build.minify).into_owned();
    let permalink = Permalink::from_output_path(config.build.rss.path.clone());
    Ok(Some(Page {
        path: permalink.path,
        url: permalink.url,
        content,
    }))
}

fn to_rss_item(doc: &Document, summary: Option<&str>, config: &SiteConfig) -> rss::Item {
    let link = doc.permalink.full_url(config.base.base_url());
    let author = normalize_rss_author(doc.front.author.as_deref(), config);

    ItemBuilder::default()
        .title(Some(doc.title()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(summary.map(str::to_owned))
        .pub_date(doc.front.date.map(|date| date.to_rfc2822()))
        .author(author)
        .categories(
            doc.front
                .tags
                .iter()
                .map(|tag| rss::CategoryBuilder::default().name(tag.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build()
}

/// RSS wants `email@example.com (Name)`.
///
/// Uses the document author if already in that form, then the site author,
/// then combines `[base].email` with the author's name. Without an email
/// the item has no author.
fn normalize_rss_author(author: Option<&str>, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    if let Some(author) = author.filter(|a| RE_VALID_AUTHOR.is_match(a)) {
        return Some(author.to_owned());
    }

    let site_author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return Some(site_author.clone());
    }

    let email = config.base.email.trim();
    if email.is_empty() {
        return None;
    }
    let name = author.unwrap_or(site_author);
    Some(format!("{email} ({name})"))
}
