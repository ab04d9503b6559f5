//! Template registry and resolution.
//!
//! Templates live under `[build].templates` as `*.html` files and are named
//! by their relative path without extension (`partials/header`).
//! Resolving a layout expands its includes and follows its
//! `{% layout %}` chain, producing a [`TemplateTree`] the renderer walks
//! innermost first.

mod builtin;
pub mod syntax;

pub use syntax::Node;

use crate::{
    error::{BuildError, Result},
    utils::{collect_all_files, to_url_path},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A parsed template file.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    /// Source file, or a `<builtin>` marker.
    pub path: PathBuf,
    pub nodes: Vec<Node>,
    pub layout: Option<String>,
}

impl Template {
    pub fn parse(name: &str, path: PathBuf, source: &str) -> Result<Self> {
        let parsed = syntax::parse(name, source)?;
        Ok(Self {
            name: name.to_owned(),
            path,
            nodes: parsed.nodes,
            layout: parsed.layout,
        })
    }
}

/// One layer of a resolved layout chain, with every include expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub name: String,
    pub nodes: Vec<Node>,
}

/// A layout chain, innermost first. Each layer's output becomes `content`
/// for the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTree {
    pub chain: Vec<ResolvedTemplate>,
}

/// Every known template, by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    templates: BTreeMap<String, Template>,
}

impl TemplateResolver {
    /// Load every `*.html` under `dir`, then fill in built-in layouts the
    /// site does not define. A missing directory leaves only the built-ins.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut resolver = Self::default();

        for path in collect_all_files(dir)? {
            if path.extension().is_none_or(|ext| ext != "html") {
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(&path).with_extension("");
            let name = to_url_path(&relative);
            let source = fs::read_to_string(&path).map_err(|err| BuildError::read(&path, err))?;
            resolver.insert(Template::parse(&name, path, &source)?);
        }

        resolver.add_builtins()?;
        Ok(resolver)
    }

    /// Build from in-memory `(name, source)` pairs plus the built-ins.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut resolver = Self::default();
        for (name, source) in sources {
            let path = PathBuf::from(format!("{name}.html"));
            resolver.insert(Template::parse(name, path, source)?);
        }
        resolver.add_builtins()?;
        Ok(resolver)
    }

    fn add_builtins(&mut self) -> Result<()> {
        for (name, source) in builtin::ALL {
            if !self.templates.contains_key(*name) {
                let path = PathBuf::from(format!("<builtin>/{name}.html"));
                self.insert(Template::parse(name, path, source)?);
            }
        }
        Ok(())
    }

    fn insert(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Resolve `layout` for the document at `requested_by`.
    ///
    /// # Errors
    ///
    /// - `UnknownLayout` if `layout`, or a parent layout, is not known
    /// - `UnknownPartial` if an include names no template
    /// - `CyclicInclude` if includes or layouts form a cycle
    pub fn resolve(&self, layout: &str, requested_by: &Path) -> Result<Arc<TemplateTree>> {
        let mut chain = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        let mut requester = requested_by;
        let mut current = layout;

        loop {
            if visited.iter().any(|name| name == current) {
                visited.push(current.to_owned());
                return Err(BuildError::CyclicInclude { chain: visited });
            }
            let template = self
                .templates
                .get(current)
                .ok_or_else(|| BuildError::UnknownLayout {
                    layout: current.to_owned(),
                    document: requester.to_path_buf(),
                })?;
            visited.push(current.to_owned());

            let mut stack = vec![template.name.clone()];
            chain.push(ResolvedTemplate {
                name: template.name.clone(),
                nodes: self.expand(&template.nodes, &mut stack)?,
            });

            match &template.layout {
                Some(parent) => {
                    requester = &template.path;
                    current = parent;
                }
                None => break,
            }
        }

        Ok(Arc::new(TemplateTree { chain }))
    }

    /// Resolve every known template once, surfacing cycles and unknown
    /// names before any page is rendered.
    pub fn validate(&self) -> Result<()> {
        for template in self.templates.values() {
            self.resolve(&template.name, &template.path)?;
        }
        Ok(())
    }

    /// Replace `Include` nodes with the included template's expanded body.
    ///
    /// `stack` holds the include chain leading here.
    fn expand(&self, nodes: &[Node], stack: &mut Vec<String>) -> Result<Vec<Node>> {
        nodes
            .iter()
            .map(|node| {
                Ok(match node {
                    Node::Include(name) => self.expand_include(name, stack)?,
                    Node::For { var, iter, body } => Node::For {
                        var: var.clone(),
                        iter: iter.clone(),
                        body: self.expand(body, stack)?,
                    },
                    Node::If {
                        cond,
                        then,
                        otherwise,
                    } => Node::If {
                        cond: cond.clone(),
                        then: self.expand(then, stack)?,
                        otherwise: self.expand(otherwise, stack)?,
                    },
                    Node::Partial { name, nodes } => Node::Partial {
                        name: name.clone(),
                        nodes: self.expand(nodes, stack)?,
                    },
                    other => other.clone(),
                })
            })
            .collect()
    }

    fn expand_include(&self, name: &str, stack: &mut Vec<String>) -> Result<Node> {
        if stack.iter().any(|entry| entry == name) {
            let mut chain = stack.clone();
            chain.push(name.to_owned());
            return Err(BuildError::CyclicInclude { chain });
        }

        let parent = stack.last().cloned().unwrap_or_default();
        let partial = self
            .templates
            .get(name)
            .ok_or_else(|| BuildError::UnknownPartial {
                template: parent,
                partial: name.to_owned(),
            })?;
        if partial.layout.is_some() {
            return Err(BuildError::syntax(
                name,
                "a template used as a partial cannot declare a layout",
            ));
        }

        stack.push(name.to_owned());
        let nodes = self.expand(&partial.nodes, stack)?;
        stack.pop();

        Ok(Node::Partial {
            name: name.to_owned(),
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(sources: &[(&str, &str)]) -> TemplateResolver {
        TemplateResolver::from_sources(sources.iter().copied()).unwrap()
    }

    fn doc() -> &'static Path {
        Path::new("content/post.md")
    }

    #[test]
    fn test_builtins_registered() {
        let resolver = resolver(&[]);
        let names: Vec<_> = resolver.names().collect();
        assert_eq!(names, vec!["page", "tag", "tags"]);
        assert!(resolver.validate().is_ok());
    }

    #[test]
    fn test_site_template_overrides_builtin() {
        let resolver = resolver(&[("page", "custom")]);
        let tree = resolver.resolve("page", doc()).unwrap();
        assert_eq!(tree.chain[0].nodes, vec![Node::Text("custom".into())]);
    }

    #[test]
    fn test_resolve_expands_includes() {
        let resolver = resolver(&[
            ("post", "<main>{% include \"partials/nav\" %}</main>"),
            ("partials/nav", "<nav>{% include \"partials/link\" %}</nav>"),
            ("partials/link", "<a>"),
        ]);

        let tree = resolver.resolve("post", doc()).unwrap();
        assert_eq!(tree.chain[0].name, "post");
        let Node::Partial { name, nodes } = &tree.chain[0].nodes[1] else {
            panic!("expected expanded partial");
        };
        assert_eq!(name, "partials/nav");
        assert!(matches!(&nodes[1], Node::Partial { name, .. } if name == "partials/link"));
    }

    #[test]
    fn test_resolve_layout_chain_innermost_first() {
        let resolver = resolver(&[
            ("post", "{% layout \"base\" %}<article>{{ content | safe }}</article>"),
            ("base", "<body>{{ content | safe }}</body>"),
        ]);

        let tree = resolver.resolve("post", doc()).unwrap();
        let names: Vec<_> = tree.chain.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["post", "base"]);
    }

    #[test]
    fn test_unknown_layout() {
        let err = resolver(&[]).resolve("fancy", doc()).unwrap_err();
        match err {
            BuildError::UnknownLayout { layout, document } => {
                assert_eq!(layout, "fancy");
                assert_eq!(document, doc());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_parent_layout_names_child_template() {
        let err = resolver(&[("post", "{% layout \"missing\" %}x")])
            .resolve("post", doc())
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnknownLayout { layout, document }
                if layout == "missing" && document == Path::new("post.html")
        ));
    }

    #[test]
    fn test_unknown_partial() {
        let err = resolver(&[("post", "{% include \"nope\" %}")])
            .resolve("post", doc())
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnknownPartial { template, partial }
                if template == "post" && partial == "nope"
        ));
    }

    #[test]
    fn test_cyclic_include_reports_chain() {
        let resolver = resolver(&[
            ("post", "{% include \"a\" %}"),
            ("a", "{% include \"b\" %}"),
            ("b", "{% include \"a\" %}"),
        ]);

        let err = resolver.resolve("post", doc()).unwrap_err();
        assert_eq!(err.to_string(), "cyclic include: post -> a -> b -> a");
        assert!(resolver.validate().is_err());
    }

    #[test]
    fn test_self_include_is_cycle() {
        let err = resolver(&[("a", "{% include \"a\" %}")])
            .resolve("a", doc())
            .unwrap_err();
        assert!(matches!(err, BuildError::CyclicInclude { chain } if chain == ["a", "a"]));
    }

    #[test]
    fn test_cyclic_layout_chain() {
        let resolver = resolver(&[
            ("a", "{% layout \"b\" %}A"),
            ("b", "{% layout \"a\" %}B"),
        ]);
        let err = resolver.resolve("a", doc()).unwrap_err();
        assert_eq!(err.to_string(), "cyclic include: a -> b -> a");
    }

    #[test]
    fn test_partial_with_layout_rejected() {
        let resolver = resolver(&[
            ("post", "{% include \"wrapped\" %}"),
            ("wrapped", "{% layout \"page\" %}x"),
        ]);
        assert!(matches!(
            resolver.resolve("post", doc()).unwrap_err(),
            BuildError::TemplateSyntax { template, .. } if template == "wrapped"
        ));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("post.html"), "{% include \"partials/head\" %}").unwrap();
        fs::write(dir.path().join("partials/head.html"), "<head>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let resolver = TemplateResolver::load(dir.path()).unwrap();
        let names: Vec<_> = resolver.names().collect();
        assert_eq!(names, vec!["page", "partials/head", "post", "tag", "tags"]);
        assert!(resolver.validate().is_ok());
    }

    #[test]
    fn test_load_reports_syntax_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.html"), "{% if x %}").unwrap();
        assert!(matches!(
            TemplateResolver::load(dir.path()).unwrap_err(),
            BuildError::TemplateSyntax { template, .. } if template == "bad"
        ));
    }
}
