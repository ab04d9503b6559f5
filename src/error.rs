//! Build error taxonomy.
//!
//! Every variant names the offending document or template so the message
//! printed by the CLI is actionable on its own. All of them abort the build.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while loading, resolving, rendering or writing a site.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("malformed front matter in `{path}`: {reason}")]
    MalformedFrontMatter { path: PathBuf, reason: String },

    #[error("duplicate permalink `{permalink}`: produced by both `{first}` and `{second}`")]
    DuplicatePermalink {
        permalink: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("unknown layout `{layout}` requested by `{document}`")]
    UnknownLayout { layout: String, document: PathBuf },

    #[error("unknown partial `{partial}` included from template `{template}`")]
    UnknownPartial { template: String, partial: String },

    #[error("cyclic include: {}", chain.join(" -> "))]
    CyclicInclude { chain: Vec<String> },

    #[error("template syntax error in `{template}`: {reason}")]
    TemplateSyntax { template: String, reason: String },

    #[error("unbound variable `{name}` in template `{template}` while rendering `{document}`")]
    UnboundVariable {
        name: String,
        template: String,
        document: PathBuf,
    },

    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feed generation failed: {0}")]
    Feed(String),
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

impl BuildError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(template: &str, reason: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            template: template.to_owned(),
            reason: reason.into(),
        }
    }
}
