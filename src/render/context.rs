//! Variable scopes and value helpers for template evaluation.

use crate::template::syntax::VarPath;
use serde_json::Value;

/// A chain of variable bindings; inner scopes shadow outer ones.
///
/// Scopes are immutable and borrowed, so a `for` loop binds its items
/// without cloning the list it iterates.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    name: &'a str,
    value: &'a Value,
}

impl<'a> Scope<'a> {
    pub const fn root(name: &'a str, value: &'a Value) -> Self {
        Self {
            parent: None,
            name,
            value,
        }
    }

    pub const fn push(&'a self, name: &'a str, value: &'a Value) -> Self {
        Self {
            parent: Some(self),
            name,
            value,
        }
    }

    /// Look up a dotted path. `None` means unbound; a bound `null` is `Some`.
    pub fn lookup(&self, path: &VarPath) -> Option<&'a Value> {
        let (head, rest) = path.0.split_first()?;

        let mut scope = Some(self);
        let mut value = None;
        while let Some(s) = scope {
            if s.name == head {
                value = Some(s.value);
                break;
            }
            scope = s.parent;
        }

        rest.iter().try_fold(value?, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

/// Text form used when printing a value.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness for `{% if %}`: null, false, 0, "" and empty collections are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> VarPath {
        VarPath(s.split('.').map(str::to_owned).collect())
    }

    #[test]
    fn test_lookup_nested_and_indexed() {
        let page = json!({ "title": "Hi", "tags": ["a", "b"], "extra": { "hero": null } });
        let scope = Scope::root("page", &page);

        assert_eq!(scope.lookup(&path("page.title")), Some(&json!("Hi")));
        assert_eq!(scope.lookup(&path("page.tags.1")), Some(&json!("b")));
        assert_eq!(scope.lookup(&path("page.extra.hero")), Some(&Value::Null));
        assert_eq!(scope.lookup(&path("page.subtitle")), None);
        assert_eq!(scope.lookup(&path("site.title")), None);
    }

    #[test]
    fn test_inner_scope_shadows() {
        let outer = json!("outer");
        let inner = json!({ "name": "inner" });
        let root = Scope::root("post", &outer);
        let child = root.push("post", &inner);

        assert_eq!(child.lookup(&path("post.name")), Some(&json!("inner")));
        assert_eq!(root.lookup(&path("post")), Some(&outer));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([1])));
        assert!(is_truthy(&json!(true)));
    }

    #[test]
    fn test_escape_and_stringify() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(3)), "3");
        assert_eq!(stringify(&json!(["a"])), r#"["a"]"#);
    }
}
