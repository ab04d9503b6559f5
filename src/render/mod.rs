//! Document rendering: body conversion plus layout-chain substitution.
//!
//! Rendering is pure. A [`Page`] holds final bytes; nothing touches the
//! filesystem until the site is written.

pub mod context;
pub mod markdown;

use crate::{
    config::SiteConfig,
    content::{BodyFormat, Document, Permalink},
    error::{BuildError, Result},
    template::{
        Node, TemplateTree,
        syntax::{Condition, Expr, Filter, VarPath},
    },
    utils::{
        date::PostDate,
        minify::{MinifyType, minify},
    },
};
use context::{Scope, escape_html, is_truthy, stringify};
use serde_json::{Value, json};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

/// Rendered output for one output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub url: String,
    pub content: Vec<u8>,
}

/// Values visible to templates besides `content`.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub site: &'a Value,
    pub page: &'a Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    minify: bool,
}

impl Renderer {
    pub const fn new(config: &SiteConfig) -> Self {
        Self {
            minify: config.build.minify,
        }
    }

    /// Render a document through its resolved layout chain.
    pub fn render(&self, doc: &Document, tree: &TemplateTree, ctx: Context<'_>) -> Result<Page> {
        self.render_tree(&doc.source, &doc.permalink, tree, ctx, body_html(doc))
    }

    /// Render a page with no source document (tag listings).
    /// `origin` names the page in error messages.
    pub fn render_derived(
        &self,
        origin: &Path,
        permalink: &Permalink,
        tree: &TemplateTree,
        ctx: Context<'_>,
    ) -> Result<Page> {
        self.render_tree(origin, permalink, tree, ctx, String::new())
    }

    fn render_tree(
        &self,
        origin: &Path,
        permalink: &Permalink,
        tree: &TemplateTree,
        ctx: Context<'_>,
        mut content: String,
    ) -> Result<Page> {
        let eval = Evaluator { origin };

        for layer in &tree.chain {
            let content_value = Value::String(content);
            let site = Scope::root("site", ctx.site);
            let page = site.push("page", ctx.page);
            let scope = page.push("content", &content_value);

            let mut out = String::new();
            eval.render_nodes(&layer.nodes, &layer.name, &scope, &mut out)?;
            content = out;
        }

        let bytes = minify(MinifyType::Html(content.as_bytes()), self.minify).into_owned();
        Ok(Page {
            path: permalink.path.clone(),
            url: permalink.url.clone(),
            content: bytes,
        })
    }
}

/// Body converted to HTML.
pub fn body_html(doc: &Document) -> String {
    match doc.format {
        BodyFormat::Markdown => markdown::render(&doc.body),
        BodyFormat::Html => doc.body.clone(),
    }
}

/// Summary as HTML: front-matter `summary`, else the text before
/// `<!-- more -->`.
pub fn summary_html(doc: &Document) -> Option<String> {
    if let Some(summary) = &doc.front.summary {
        return Some(markdown::render(summary));
    }
    let excerpt = doc.excerpt()?;
    Some(match doc.format {
        BodyFormat::Markdown => markdown::render(excerpt),
        BodyFormat::Html => excerpt.to_owned(),
    })
}

// ============================================================================
// Evaluation
// ============================================================================

struct Evaluator<'a> {
    origin: &'a Path,
}

impl Evaluator<'_> {
    fn render_nodes(
        &self,
        nodes: &[Node],
        template: &str,
        scope: &Scope<'_>,
        out: &mut String,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expr(expr) => out.push_str(&self.eval_expr(expr, template, scope)?),
                Node::Partial { name, nodes } => self.render_nodes(nodes, name, scope, out)?,
                Node::Include(name) => {
                    return Err(BuildError::UnknownPartial {
                        template: template.to_owned(),
                        partial: name.clone(),
                    });
                }
                Node::For { var, iter, body } => {
                    let items: &[Value] = match scope.lookup(iter) {
                        Some(Value::Array(items)) => items,
                        Some(Value::Null) => &[],
                        Some(_) => {
                            return Err(BuildError::syntax(
                                template,
                                format!("`{iter}` is not a list"),
                            ));
                        }
                        None => return Err(self.unbound(iter, template)),
                    };

                    let len = items.len();
                    for (i, item) in items.iter().enumerate() {
                        let meta = json!({
                            "index": i + 1,
                            "index0": i,
                            "first": i == 0,
                            "last": i + 1 == len,
                            "length": len,
                        });
                        let item_scope = scope.push(var, item);
                        let loop_scope = item_scope.push("loop", &meta);
                        self.render_nodes(body, template, &loop_scope, out)?;
                    }
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = match cond {
                        Condition::Truthy(path) => scope.lookup(path).is_some_and(is_truthy),
                        Condition::Falsy(path) => !scope.lookup(path).is_some_and(is_truthy),
                    };
                    let nodes = if branch { then } else { otherwise };
                    self.render_nodes(nodes, template, scope, out)?;
                }
            }
        }
        Ok(())
    }

    fn eval_expr(&self, expr: &Expr, template: &str, scope: &Scope<'_>) -> Result<String> {
        let mut value: Option<Cow<'_, Value>> = scope.lookup(&expr.path).map(Cow::Borrowed);

        for filter in &expr.filters {
            value = match filter {
                Filter::Safe => value,
                Filter::Default(fallback) => match value {
                    Some(v) if !v.is_null() => Some(v),
                    _ => Some(Cow::Owned(Value::String(fallback.clone()))),
                },
                filter => {
                    let v = value.ok_or_else(|| self.unbound(&expr.path, template))?;
                    Some(Cow::Owned(apply_filter(filter, &v, template)?))
                }
            };
        }

        let value = value.ok_or_else(|| self.unbound(&expr.path, template))?;
        let text = stringify(&value);
        Ok(if expr.is_safe() {
            text
        } else {
            escape_html(&text)
        })
    }

    fn unbound(&self, path: &VarPath, template: &str) -> BuildError {
        BuildError::UnboundVariable {
            name: path.to_string(),
            template: template.to_owned(),
            document: self.origin.to_path_buf(),
        }
    }
}

fn apply_filter(filter: &Filter, value: &Value, template: &str) -> Result<Value> {
    let value = match (filter, value) {
        (Filter::Date(_), Value::Null) => Value::Null,
        (Filter::Date(pattern), Value::String(s)) => PostDate::parse(s)
            .and_then(|date| date.format(pattern))
            .map(Value::String)
            .ok_or_else(|| {
                BuildError::syntax(template, format!("`date` filter: `{s}` is not a date"))
            })?,
        (Filter::Date(_), other) => {
            return Err(BuildError::syntax(
                template,
                format!("`date` filter expects a string, found `{other}`"),
            ));
        }
        (Filter::Join(sep), Value::Array(items)) => Value::String(
            items
                .iter()
                .map(stringify)
                .collect::<Vec<_>>()
                .join(sep),
        ),
        (Filter::Join(_), other) => Value::String(stringify(other)),
        (Filter::Upper, v) => Value::String(stringify(v).to_uppercase()),
        (Filter::Lower, v) => Value::String(stringify(v).to_lowercase()),
        (Filter::Length, v) => Value::from(match v {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::String(s) => s.chars().count(),
            _ => 0,
        }),
        (Filter::Safe | Filter::Default(_), v) => v.clone(),
    };
    Ok(value)
}
