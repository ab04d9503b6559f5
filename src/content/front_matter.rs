//! Front-matter splitting and typed parsing.
//!
//! A document may start with a YAML block fenced by `---` lines or a TOML
//! block fenced by `+++` lines:
//!
//! ```text
//! ---
//! title: Currying in Scala
//! date: 2024-02-01
//! tags: [scala, fp]
//! ---
//! Body starts here.
//! ```
//!
//! Both are first converted to a JSON value, so YAML and TOML documents go
//! through the same typed deserialization.

use crate::utils::date::PostDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata block syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    const fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Typed front matter: recognized keys plus an open `extra` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<PostDate>,
    pub updated: Option<PostDate>,
    pub tags: Vec<String>,
    pub layout: Option<String>,
    pub permalink: Option<String>,
    pub draft: bool,
    pub summary: Option<String>,
    pub author: Option<String>,
    /// Every unrecognized key, available to templates as `page.extra.*`.
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    title: Option<String>,
    date: Option<String>,
    updated: Option<String>,
    tags: Option<Tags>,
    layout: Option<String>,
    permalink: Option<String>,
    draft: bool,
    summary: Option<String>,
    author: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// `tags: [a, b]` or the shorthand `tags: "a, b"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Inline(String),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        let tags = match self {
            Self::List(tags) => tags,
            Self::Inline(s) => s.split(',').map(str::to_owned).collect(),
        };
        let mut out: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.trim();
            if !tag.is_empty() && !out.iter().any(|t| t == tag) {
                out.push(tag.to_owned());
            }
        }
        out
    }
}

/// Split a source file into its metadata block and body.
///
/// Returns `Ok((None, source))` when the file has no front matter and an
/// error message when an opening fence is never closed.
pub fn split(source: &str) -> Result<(Option<(Format, &str)>, &str), String> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let (first_line, rest) = match source.find('\n') {
        Some(i) => (&source[..i], &source[i + 1..]),
        None => (source, ""),
    };
    let format = match first_line.trim_end() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => return Ok((None, source)),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == format.fence() {
            let meta = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some((format, meta)), body));
        }
        offset += line.len();
    }

    Err(format!(
        "unterminated front matter: missing closing `{}`",
        format.fence()
    ))
}

/// Parse a metadata block into typed front matter.
pub fn parse(format: Format, raw: &str) -> Result<FrontMatter, String> {
    if raw.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let value = match format {
        Format::Yaml => serde_yaml::from_str::<Value>(raw).map_err(|e| e.to_string())?,
        Format::Toml => {
            let table = toml::from_str::<toml::Table>(raw).map_err(|e| e.message().to_owned())?;
            toml_to_json(toml::Value::Table(table))
        }
    };

    let value = match value {
        Value::Null => Value::Object(Map::new()),
        map @ Value::Object(_) => map,
        other => {
            return Err(format!(
                "expected a key-value mapping, found {}",
                json_type_name(&other)
            ));
        }
    };

    let raw: RawFrontMatter = serde_json::from_value(value).map_err(|e| e.to_string())?;

    Ok(FrontMatter {
        title: raw.title,
        date: parse_date("date", raw.date)?,
        updated: parse_date("updated", raw.updated)?,
        tags: raw.tags.map(Tags::into_vec).unwrap_or_default(),
        layout: raw.layout.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty()),
        permalink: raw.permalink,
        draft: raw.draft,
        summary: raw.summary,
        author: raw.author,
        extra: raw.extra,
    })
}

fn parse_date(key: &str, value: Option<String>) -> Result<Option<PostDate>, String> {
    value
        .map(|s| PostDate::parse(&s).ok_or_else(|| format!("invalid `{key}`: `{s}`")))
        .transpose()
}

/// TOML datetimes become their string form; everything else maps 1:1.
pub(crate) fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_yaml() {
        let (meta, body) = split("---\ntitle: Hi\n---\nBody\n").unwrap();
        assert_eq!(meta, Some((Format::Yaml, "title: Hi\n")));
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_split_toml_with_crlf() {
        let (meta, body) = split("+++\r\ntitle = \"Hi\"\r\n+++\r\nBody").unwrap();
        assert_eq!(meta, Some((Format::Toml, "title = \"Hi\"\r\n")));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_without_front_matter() {
        let (meta, body) = split("# Just markdown\n---\n").unwrap();
        assert_eq!(meta, None);
        assert_eq!(body, "# Just markdown\n---\n");
    }

    #[test]
    fn test_split_strips_bom() {
        let (meta, _) = split("\u{feff}---\n---\n").unwrap();
        assert_eq!(meta, Some((Format::Yaml, "")));
    }

    #[test]
    fn test_split_unterminated() {
        let err = split("---\ntitle: Hi\nBody").unwrap_err();
        assert!(err.contains("unterminated"));
    }

    #[test]
    fn test_parse_yaml_typed_and_extra() {
        let fm = parse(
            Format::Yaml,
            "title: Lenses\ndate: 2024-02-01\ntags: [scala, fp, scala]\nlayout: post\nhero: cover.png\n",
        )
        .unwrap();

        assert_eq!(fm.title.as_deref(), Some("Lenses"));
        assert_eq!(fm.date, PostDate::parse("2024-02-01"));
        assert_eq!(fm.tags, vec!["scala", "fp"]);
        assert_eq!(fm.layout.as_deref(), Some("post"));
        assert!(!fm.draft);
        assert_eq!(fm.extra["hero"], Value::from("cover.png"));
    }

    #[test]
    fn test_parse_toml_native_date() {
        let fm = parse(
            Format::Toml,
            "title = \"Flutter notes\"\ndate = 2024-01-01\ntags = \"dart, ui\"\ndraft = true\n",
        )
        .unwrap();

        assert_eq!(fm.date, PostDate::parse("2024-01-01"));
        assert_eq!(fm.tags, vec!["dart", "ui"]);
        assert!(fm.draft);
    }

    #[test]
    fn test_parse_empty_block() {
        assert_eq!(parse(Format::Yaml, "").unwrap(), FrontMatter::default());
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        let err = parse(Format::Yaml, "- a\n- b\n").unwrap_err();
        assert!(err.contains("a sequence"));
    }

    #[test]
    fn test_parse_rejects_bad_yaml() {
        assert!(parse(Format::Yaml, "title: [unclosed\n").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let err = parse(Format::Yaml, "date: someday\n").unwrap_err();
        assert!(err.contains("invalid `date`"));
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        assert!(parse(Format::Yaml, "draft: maybe\n").is_err());
    }
}
