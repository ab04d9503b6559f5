//! Template tokenizer and parser.
//!
//! Two kinds of tags are recognized in template text:
//!
//! - `{{ path | filter | filter("arg") }}` prints a value
//! - `{% include "name" %}`, `{% layout "name" %}`, `{% for x in path %}`,
//!   `{% if path %}`, `{% else %}`, `{% endif %}`, `{% endfor %}`
//!
//! Everything else is literal text.

use crate::error::{BuildError, Result};
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::{fmt, sync::LazyLock};

/// Dotted variable path, e.g. `page.extra.hero`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPath(pub Vec<String>);

impl VarPath {
    fn parse(src: &str) -> Option<Self> {
        let segments: Vec<String> = src.split('.').map(str::to_owned).collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        });
        valid.then_some(Self(segments))
    }
}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Print without HTML escaping.
    Safe,
    /// Fallback for an unbound or null value.
    Default(String),
    /// chrono `strftime` pattern applied to a date string.
    Date(String),
    Join(String),
    Upper,
    Lower,
    Length,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub path: VarPath,
    pub filters: Vec<Filter>,
}

impl Expr {
    pub fn is_safe(&self) -> bool {
        self.filters.contains(&Filter::Safe)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Truthy(VarPath),
    Falsy(VarPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Expr(Expr),
    Include(String),
    /// An include after expansion, named for error reporting.
    Partial { name: String, nodes: Vec<Node> },
    For {
        var: String,
        iter: VarPath,
        body: Vec<Node>,
    },
    If {
        cond: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Parsed template body plus its `{% layout %}` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub nodes: Vec<Node>,
    pub layout: Option<String>,
}

pub fn parse(name: &str, source: &str) -> Result<Parsed> {
    let tokens = tokenize(name, source)?;
    let mut parser = Parser {
        name,
        tokens,
        pos: 0,
        layout: None,
    };

    let (nodes, stop) = parser.parse_nodes(0)?;
    match stop {
        Stop::Eof => Ok(Parsed {
            nodes,
            layout: parser.layout,
        }),
        other => Err(BuildError::syntax(
            name,
            format!("unexpected `{{% {} %}}`", other.keyword()),
        )),
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Expr(&'a str),
    Tag(&'a str),
}

fn tokenize<'a>(name: &str, source: &'a str) -> Result<Vec<Token<'a>>> {
    // quoted arguments may contain the closing delimiter
    static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)\{\{((?:"[^"]*"|[^"])*?)\}\}|\{%((?:"[^"]*"|[^"])*?)%\}"#).unwrap()
    });

    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in RE_TAG.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(name, &source[last..whole.start()], &mut tokens)?;
        if let Some(expr) = caps.get(1) {
            tokens.push(Token::Expr(expr.as_str().trim()));
        } else if let Some(tag) = caps.get(2) {
            tokens.push(Token::Tag(tag.as_str().trim()));
        }
        last = whole.end();
    }
    push_text(name, &source[last..], &mut tokens)?;
    Ok(tokens)
}

fn push_text<'a>(name: &str, text: &'a str, tokens: &mut Vec<Token<'a>>) -> Result<()> {
    if let Some(open) = ["{{", "{%"].into_iter().find(|open| text.contains(open)) {
        return Err(BuildError::syntax(name, format!("unclosed `{open}`")));
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(())
}

// ============================================================================
// Parser
// ============================================================================

/// Why `parse_nodes` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Eof,
    Else,
    EndIf,
    EndFor,
}

impl Stop {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Eof => "end of template",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::EndFor => "endfor",
        }
    }
}

struct Parser<'a> {
    name: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    layout: Option<String>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> BuildError {
        BuildError::syntax(self.name, reason)
    }

    fn parse_nodes(&mut self, depth: usize) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).copied() {
            self.pos += 1;
            match token {
                Token::Text("") => {}
                Token::Text(text) => nodes.push(Node::Text(text.to_owned())),
                Token::Expr(src) => nodes.push(Node::Expr(self.parse_expr(src)?)),
                Token::Tag(src) => {
                    let (keyword, rest) = src.split_once(char::is_whitespace).unwrap_or((src, ""));
                    let rest = rest.trim();
                    match keyword {
                        "include" => nodes.push(Node::Include(self.quoted(rest, "include")?)),
                        "layout" => self.parse_layout(rest, depth)?,
                        "for" => nodes.push(self.parse_for(rest, depth)?),
                        "if" => nodes.push(self.parse_if(rest, depth)?),
                        "else" => return Ok((nodes, Stop::Else)),
                        "endif" => return Ok((nodes, Stop::EndIf)),
                        "endfor" => return Ok((nodes, Stop::EndFor)),
                        other => return Err(self.error(format!("unknown tag `{other}`"))),
                    }
                }
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn parse_layout(&mut self, rest: &str, depth: usize) -> Result<()> {
        if depth > 0 {
            return Err(self.error("`layout` must appear at the top level"));
        }
        if self.layout.is_some() {
            return Err(self.error("`layout` declared more than once"));
        }
        self.layout = Some(self.quoted(rest, "layout")?);

        // the line holding the directive produces no output
        if let Some(Token::Text(text)) = self.tokens.get(self.pos).copied() {
            let text = text
                .strip_prefix("\r\n")
                .or_else(|| text.strip_prefix('\n'))
                .unwrap_or(text);
            self.tokens[self.pos] = Token::Text(text);
        }
        Ok(())
    }

    fn parse_for(&mut self, rest: &str, depth: usize) -> Result<Node> {
        let mut parts = rest.split_whitespace();
        let (Some(var), Some("in"), Some(iter), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(self.error(format!("expected `for <name> in <path>`, found `for {rest}`")));
        };
        let iter = self.var_path(iter)?;

        let (body, stop) = self.parse_nodes(depth + 1)?;
        if stop != Stop::EndFor {
            return Err(self.unclosed("for", stop));
        }

        Ok(Node::For {
            var: var.to_owned(),
            iter,
            body,
        })
    }

    fn parse_if(&mut self, rest: &str, depth: usize) -> Result<Node> {
        let cond = match rest.strip_prefix("not ") {
            Some(path) => Condition::Falsy(self.var_path(path.trim())?),
            None => Condition::Truthy(self.var_path(rest)?),
        };

        let (then, stop) = self.parse_nodes(depth + 1)?;
        let otherwise = match stop {
            Stop::EndIf => Vec::new(),
            Stop::Else => {
                let (otherwise, stop) = self.parse_nodes(depth + 1)?;
                if stop != Stop::EndIf {
                    return Err(self.unclosed("if", stop));
                }
                otherwise
            }
            other => return Err(self.unclosed("if", other)),
        };

        Ok(Node::If {
            cond,
            then,
            otherwise,
        })
    }

    fn unclosed(&self, block: &str, stop: Stop) -> BuildError {
        self.error(format!(
            "unclosed `{{% {block} %}}` block: found {}",
            stop.keyword()
        ))
    }

    fn parse_expr(&self, src: &str) -> Result<Expr> {
        let mut parts = split_pipes(src).into_iter();
        let head = parts.next().unwrap_or_default();
        let path = self.var_path(head.trim())?;
        let filters = parts
            .map(|f| self.parse_filter(f.trim()))
            .collect::<Result<_>>()?;
        Ok(Expr { path, filters })
    }

    fn parse_filter(&self, src: &str) -> Result<Filter> {
        let (name, arg) = match src.split_once('(') {
            Some((name, rest)) => {
                let Some(arg) = rest.trim_end().strip_suffix(')') else {
                    return Err(self.error(format!("unclosed `(` in filter `{src}`")));
                };
                (name.trim(), Some(self.quoted(arg.trim(), name.trim())?))
            }
            None => (src, None),
        };

        let filter = match (name, arg) {
            ("safe", None) => Filter::Safe,
            ("upper", None) => Filter::Upper,
            ("lower", None) => Filter::Lower,
            ("length", None) => Filter::Length,
            ("default", Some(arg)) => Filter::Default(arg),
            ("join", Some(arg)) => Filter::Join(arg),
            ("join", None) => Filter::Join(", ".to_owned()),
            ("date", Some(pattern)) => {
                if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
                    return Err(self.error(format!("invalid date pattern `{pattern}`")));
                }
                Filter::Date(pattern)
            }
            ("default" | "date", None) => {
                return Err(self.error(format!("filter `{name}` requires an argument")));
            }
            (name, Some(_)) if matches!(name, "safe" | "upper" | "lower" | "length") => {
                return Err(self.error(format!("filter `{name}` takes no argument")));
            }
            (name, _) => return Err(self.error(format!("unknown filter `{name}`"))),
        };
        Ok(filter)
    }

    fn var_path(&self, src: &str) -> Result<VarPath> {
        VarPath::parse(src).ok_or_else(|| self.error(format!("invalid variable path `{src}`")))
    }

    /// Strip the double quotes around a directive or filter argument.
    fn quoted(&self, src: &str, what: &str) -> Result<String> {
        src.strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .filter(|s| !s.contains('"'))
            .map(str::to_owned)
            .ok_or_else(|| self.error(format!("`{what}` expects a quoted string, found `{src}`")))
    }
}

/// Split on `|` outside double-quoted strings.
fn split_pipes(src: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in src.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '|' if !in_quotes => {
                parts.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&src[start..]);
    parts
}
