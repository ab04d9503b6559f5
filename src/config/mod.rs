//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url)             |
//! | `[build]`   | Directories, default layout, tags, feed, etc.  |
//! | `[extra]`   | User-defined fields, exposed as `site.extra`   |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Site"
//! description = "Essays on programming"
//! url = "https://example.com"
//!
//! [build]
//! content = "content"
//! output = "public"
//!
//! [build.rss]
//! enable = true
//!
//! [extra]
//! github = "alice"
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

pub use build::SlugMode;

use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;

use crate::cli::{BuildArgs, Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Site root directory (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig =
            toml::from_str(content).map_err(|err| ConfigError::Toml(PathBuf::new(), err))?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let config: SiteConfig =
            toml::from_str(&content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;
        Ok(config)
    }

    /// Load the config for a CLI invocation.
    ///
    /// `build` tolerates a missing config file and falls back to defaults;
    /// `init` requires that none exists yet.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root();
        let config_path = root.join(&cli.config);

        let mut config = match (&cli.command, config_path.exists()) {
            (Commands::Init { .. }, true) => bail!(
                "Config file `{}` already exists. Remove it manually or init in a different path.",
                config_path.display()
            ),
            (Commands::Init { .. }, false) | (Commands::Build { .. }, false) => Self::default(),
            (Commands::Build { .. }, true) => Self::from_path(&config_path)?,
        };

        config.config_path = normalize_path(&config_path);
        config.resolve_paths(&root);

        if let Commands::Build { build_args } = &cli.command {
            config.update_with_args(build_args);
            config.validate()?;
        }

        Ok(config)
    }

    /// Resolve every configured directory against `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.resolve_paths(root);
        self
    }

    /// Get the root directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a file inside the output directory.
    pub fn output_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.build.output.join(relative)
    }

    /// Apply `build` subcommand overrides.
    pub fn update_with_args(&mut self, args: &BuildArgs) {
        if let Some(output) = &args.output {
            self.build.output = normalize_path(output);
        }
        if let Some(base_url) = &args.base_url {
            self.base.url = Some(base_url.clone());
        }
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        self.build.clean |= args.clean;
        self.build.drafts |= args.drafts;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn resolve_paths(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.build.content = normalize_path(&root.join(expand(&self.build.content)));
        self.build.templates = normalize_path(&root.join(expand(&self.build.templates)));
        self.build.assets = normalize_path(&root.join(expand(&self.build.assets)));
        self.build.output = normalize_path(&root.join(expand(&self.build.output)));
        self.root = root;
    }

    /// Validate configuration before a build
    pub fn validate(&self) -> Result<()> {
        if self.build.rss.enable && self.base.url.is_none() {
            bail!(ConfigError::Validation(
                "[base.url] is required for RSS generation".into()
            ));
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.default_layout.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.default_layout] must not be empty".into()
            ));
        }

        let dirs = &self.build;
        let inputs = [
            ("root", &self.root),
            ("content", &dirs.content),
            ("templates", &dirs.templates),
            ("assets", &dirs.assets),
        ];
        // `clean` removes the output directory, so it must never hold a source
        if let Some((name, _)) = inputs
            .iter()
            .find(|(_, input)| input.starts_with(&dirs.output))
        {
            bail!(ConfigError::Validation(format!(
                "[build.output] must not contain or equal the {name} directory"
            )));
        }

        let derived = [
            ("build.tags", &dirs.tags.path),
            ("build.rss", &dirs.rss.path),
            ("build.sitemap", &dirs.sitemap.path),
        ];
        if let Some((name, path)) = derived
            .iter()
            .find(|(_, path)| !build::is_output_relative(path))
        {
            bail!(ConfigError::Validation(format!(
                "[{name}].path `{}` must be a relative path inside the output directory",
                path.display()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Expand a leading `~` in a configured path.
fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
