//! JSON values exposed to templates as `site.*` and `page.*`.
//!
//! | Variable | Contents |
//! |----------|----------|
//! | `site.title`, `site.url`, ... | `[base]` fields |
//! | `site.extra` | `[extra]` table |
//! | `site.posts` | dated documents, newest first |
//! | `site.tags` | `{ name, slug, url, count }` per tag |
//! | `page.*` | current document: `title`, `url`, `date`, `tags`, `summary`, `extra`, ... |

use super::index::{SiteIndex, TagEntry};
use crate::{config::SiteConfig, content::Document, content::front_matter::toml_to_json};
use serde_json::{Map, Value, json};

/// Per-document data shared by `site.posts`, tag listings and `page`.
pub fn post_value(doc: &Document, summary: Option<&str>, config: &SiteConfig) -> Value {
    json!({
        "title": doc.title(),
        "url": doc.permalink.url,
        "full_url": doc.permalink.full_url(config.base.base_url()),
        "date": doc.front.date,
        "updated": doc.front.updated,
        "tags": doc.front.tags,
        "summary": summary,
        "author": doc.front.author.as_deref().unwrap_or(&config.base.author),
    })
}

/// `page` for a content document.
pub fn document_page(doc: &Document, summary: Option<&str>, config: &SiteConfig) -> Value {
    let mut page = post_value(doc, summary, config);
    if let Value::Object(map) = &mut page {
        map.insert(
            "layout".into(),
            doc.layout(&config.build.default_layout).into(),
        );
        map.insert(
            "source".into(),
            crate::utils::to_url_path(&doc.relative).into(),
        );
        map.insert("draft".into(), doc.front.draft.into());
        map.insert(
            "extra".into(),
            Value::Object(doc.front.extra.clone().into_iter().collect()),
        );
    }
    page
}

/// `page` for one tag listing.
pub fn tag_page(
    tag: &TagEntry,
    documents: &[Document],
    summaries: &[Option<String>],
    config: &SiteConfig,
) -> Value {
    let posts: Vec<Value> = tag
        .documents
        .iter()
        .map(|&i| post_value(&documents[i], summaries[i].as_deref(), config))
        .collect();

    json!({
        "title": tag.name,
        "url": tag.permalink.url,
        "tag": tag_value(tag, true),
        "posts": posts,
    })
}

/// `page` for the tag overview.
pub fn tags_page(index: &SiteIndex, url: &str) -> Value {
    json!({
        "title": "Tags",
        "url": url,
        "tags": tag_list(index, true),
    })
}

/// The `site` object, built once per build and shared by every page.
pub fn site_value(
    documents: &[Document],
    summaries: &[Option<String>],
    index: &SiteIndex,
    config: &SiteConfig,
) -> Value {
    let base = &config.base;
    let posts: Vec<Value> = index
        .posts
        .iter()
        .map(|&i| post_value(&documents[i], summaries[i].as_deref(), config))
        .collect();
    let extra: Map<String, Value> = config
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), toml_to_json(v.clone())))
        .collect();

    json!({
        "title": base.title,
        "description": base.description,
        "author": base.author,
        "email": base.email,
        "url": base.base_url(),
        "language": base.language,
        "copyright": base.copyright,
        "extra": extra,
        "posts": posts,
        "tags": tag_list(index, config.build.tags.enable),
    })
}

fn tag_list(index: &SiteIndex, linked: bool) -> Vec<Value> {
    index
        .tags
        .values()
        .map(|tag| tag_value(tag, linked))
        .collect()
}

/// `url` is null when tag pages are not generated.
fn tag_value(tag: &TagEntry, linked: bool) -> Value {
    json!({
        "name": tag.name,
        "slug": tag.slug,
        "url": linked.then_some(&tag.permalink.url),
        "count": tag.documents.len(),
    })
}
