//! Site initialization module.
//!
//! Creates a new site with a default configuration, starter templates and
//! two sample documents.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Default config filename
const CONFIG_FILE: &str = "quire.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &[
    "content/posts",
    "templates/partials",
    "assets/images",
    "assets/styles",
];

/// Starter files, relative to the site root.
const STARTER_FILES: &[(&str, &str)] = &[
    (
        "templates/base.html",
        r#"<!DOCTYPE html>
<html lang="{{ site.language }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ page.title }} | {{ site.title }}</title>
  <link rel="stylesheet" href="/styles/main.css">
</head>
<body>
  {% include "partials/header" %}
  <main>{{ content | safe }}</main>
</body>
</html>
"#,
    ),
    (
        "templates/partials/header.html",
        r#"<header>
  <a href="/">{{ site.title | default("Home") }}</a>
  <a href="/tags/">Tags</a>
</header>
"#,
    ),
    (
        "templates/page.html",
        r#"{% layout "base" %}
<article>
  <h1>{{ page.title }}</h1>
  {% if page.date %}<time datetime="{{ page.date }}">{{ page.date | date("%B %d, %Y") }}</time>{% endif %}
  {{ content | safe }}
</article>
"#,
    ),
    (
        "templates/home.html",
        r#"{% layout "base" %}
{{ content | safe }}
<ul>
  {% for post in site.posts %}<li><a href="{{ post.url }}">{{ post.title }}</a></li>
  {% endfor %}
</ul>
"#,
    ),
    (
        "content/index.md",
        "---\ntitle: Home\nlayout: home\n---\n# Welcome\n\nRecent posts:\n",
    ),
    (
        "content/posts/hello.md",
        "---\ntitle: Hello, world\ndate: 2024-01-01\ntags: [meta]\n---\nFirst post.\n\n<!-- more -->\n\nThe rest of it.\n",
    ),
    ("assets/styles/main.css", "body { max-width: 42rem; margin: 0 auto; }\n"),
];

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `quire init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_starter_files(root)?;
    init_ignored_files(root, &[Path::new("/public/")])?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `quire init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn init_starter_files(root: &Path) -> Result<()> {
    for (relative, content) in STARTER_FILES {
        let path = root.join(relative);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.to_str())
        .collect::<Vec<_>>()
        .join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}
