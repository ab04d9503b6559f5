//! Site-wide aggregates computed before any page is rendered.
//!
//! Entries refer to documents by their position in the loaded document
//! list, which is sorted by source path.

use crate::{
    config::SiteConfig,
    content::{Document, Permalink},
    utils::slug::slugify_tag,
};
use std::{cmp::Ordering, collections::BTreeMap};

/// Documents sharing one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Display name, as first written in a document.
    pub name: String,
    pub slug: String,
    /// Listing page, `<tags.path>/<slug>/index.html`.
    pub permalink: Permalink,
    /// Document indices, newest first.
    pub documents: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteIndex {
    /// Dated documents, newest first.
    pub posts: Vec<usize>,
    /// Tags keyed by slug, so `Rust` and `rust` share a page.
    pub tags: BTreeMap<String, TagEntry>,
}

impl SiteIndex {
    pub fn build(documents: &[Document], config: &SiteConfig) -> Self {
        let tags_dir = &config.build.tags.path;

        let mut posts: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.front.date.is_some())
            .map(|(i, _)| i)
            .collect();
        posts.sort_by(|&a, &b| compare_by_date(&documents[a], &documents[b]));

        let mut tags: BTreeMap<String, TagEntry> = BTreeMap::new();
        for (i, doc) in documents.iter().enumerate() {
            for name in &doc.front.tags {
                let slug = slugify_tag(name);
                let entry = tags.entry(slug.clone()).or_insert_with(|| TagEntry {
                    name: name.clone(),
                    permalink: Permalink::for_directory(&tags_dir.join(&slug)),
                    slug,
                    documents: Vec::new(),
                });
                if entry.documents.last() != Some(&i) {
                    entry.documents.push(i);
                }
            }
        }
        for entry in tags.values_mut() {
            entry
                .documents
                .sort_by(|&a, &b| compare_by_date(&documents[a], &documents[b]));
        }

        Self { posts, tags }
    }

    /// Overview page listing every tag, `<tags.path>/index.html`.
    pub fn overview_permalink(config: &SiteConfig) -> Permalink {
        Permalink::for_directory(&config.build.tags.path)
    }
}

/// Newest first; dated before undated; ties broken by title, then source.
fn compare_by_date(a: &Document, b: &Document) -> Ordering {
    let by_date = match (a.front.date, b.front.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.title().cmp(&b.title()))
        .then_with(|| a.source.cmp(&b.source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlugMode;
    use std::path::PathBuf;

    fn doc(relative: &str, front: &str) -> Document {
        Document::parse(
            PathBuf::from(relative),
            PathBuf::from(relative),
            &format!("---\n{front}\n---\nbody"),
            SlugMode::Safe,
        )
        .unwrap()
    }

    fn titles(docs: &[Document], indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| docs[i].title()).collect()
    }

    #[test]
    fn test_tag_lists_newest_first() {
        let docs = vec![
            doc("a.md", "title: January\ndate: 2024-01-01\ntags: [x]"),
            doc("b.md", "title: February\ndate: 2024-02-01\ntags: [x, y]"),
        ];
        let index = SiteIndex::build(&docs, &SiteConfig::default());

        let x = &index.tags["x"];
        assert_eq!(titles(&docs, &x.documents), vec!["February", "January"]);
        assert_eq!(x.permalink.url, "/tags/x/");
        assert_eq!(titles(&docs, &index.tags["y"].documents), vec!["February"]);
    }

    #[test]
    fn test_posts_only_dated_newest_first() {
        let docs = vec![
            doc("about.md", "title: About"),
            doc("old.md", "title: Old\ndate: 2023-05-01"),
            doc("new.md", "title: New\ndate: 2024-05-01 08:00:00"),
        ];
        let index = SiteIndex::build(&docs, &SiteConfig::default());
        assert_eq!(titles(&docs, &index.posts), vec!["New", "Old"]);
    }

    #[test]
    fn test_same_date_ordered_by_title_and_undated_last() {
        let docs = vec![
            doc("z.md", "title: Zeta\ndate: 2024-01-01\ntags: [t]"),
            doc("a.md", "title: Alpha\ndate: 2024-01-01\ntags: [t]"),
            doc("u.md", "title: Undated\ntags: [t]"),
        ];
        let index = SiteIndex::build(&docs, &SiteConfig::default());
        assert_eq!(
            titles(&docs, &index.tags["t"].documents),
            vec!["Alpha", "Zeta", "Undated"]
        );
    }

    #[test]
    fn test_tags_merge_by_slug() {
        let docs = vec![
            doc("a.md", "tags: [Rust Lang]"),
            doc("b.md", "tags: [rust lang]"),
        ];
        let index = SiteIndex::build(&docs, &SiteConfig::default());

        assert_eq!(index.tags.len(), 1);
        let entry = &index.tags["rust-lang"];
        assert_eq!(entry.name, "Rust Lang");
        assert_eq!(entry.documents.len(), 2);
    }

    #[test]
    fn test_overview_permalink_follows_config() {
        let mut config = SiteConfig::default();
        config.build.tags.path = PathBuf::from("topics");
        assert_eq!(SiteIndex::overview_permalink(&config).url, "/topics/");
    }
}
