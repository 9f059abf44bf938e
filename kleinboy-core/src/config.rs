//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "kleinboy.yml";
pub const DEFAULT_UNTITLED: &str = "(Untitled)";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the kleinboy.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Title used when neither frontmatter nor a heading provides one
    #[serde(default = "default_untitled")]
    pub untitled: String,

    #[serde(default = "default_true")]
    pub dump_article_metadata: bool,

    #[serde(default, rename = "dumpArticleAST")]
    pub dump_article_ast: bool,

    #[serde(default, rename = "dumpArticleHTML")]
    pub dump_article_html: bool,

    #[serde(default = "default_true")]
    pub dump_tag_metadata: bool,

    #[serde(default)]
    pub paths: PathsConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_untitled() -> String {
    String::from(DEFAULT_UNTITLED)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content root; `articles`, `tags` and `output` are relative to it
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_articles")]
    pub articles: PathBuf,

    #[serde(default = "default_tags")]
    pub tags: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_articles() -> PathBuf {
    PathBuf::from("articles")
}

fn default_tags() -> PathBuf {
    PathBuf::from("tags")
}

fn default_output() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            articles: default_articles(),
            tags: default_tags(),
            output: default_output(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            untitled: default_untitled(),
            dump_article_metadata: true,
            dump_article_ast: false,
            dump_article_html: false,
            dump_tag_metadata: true,
            paths: PathsConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&contents)?
        };

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults rooted at
    /// the current directory
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}; using defaults", path);
            Ok(Self::default())
        }
    }

    /// Same configuration with the content root replaced
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths.root = root.into();
        self
    }

    /// Turn on the AST and HTML dumps
    pub fn with_debug_dumps(mut self) -> Self {
        self.dump_article_ast = true;
        self.dump_article_html = true;
        self
    }

    /// Content root, resolved relative to the config file
    pub fn root_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.root)
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.root_dir().join(&self.paths.articles)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.root_dir().join(&self.paths.tags)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_dir().join(&self.paths.output)
    }

    pub fn ast_dir(&self) -> PathBuf {
        self.output_dir().join("ast")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.output_dir().join("html")
    }

    pub fn articles_json(&self) -> PathBuf {
        self.output_dir().join("articles.json")
    }

    pub fn tags_json(&self) -> PathBuf {
        self.output_dir().join("tags.json")
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            match config_path.parent() {
                Some(parent) => parent.join(path),
                None => path.to_path_buf(),
            }
        } else {
            path.to_path_buf()
        }
    }
}
