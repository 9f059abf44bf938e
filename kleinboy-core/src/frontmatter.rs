//! Frontmatter discovery and merging.
//!
//! Metadata for an article can live in two places:
//!
//! - inline, as a YAML (`---`) or TOML (`+++`) block at the top of the
//!   markdown file, which the parser surfaces as a [`Node::Yaml`] or
//!   [`Node::Toml`] node;
//! - in a sidecar next to it: `name.blog.json`, `name.blog.yml`,
//!   `name.blog.yaml` or `name.blog.toml`, probed in that order. Only the
//!   first one found is read.
//!
//! Sidecar keys replace inline keys one by one (shallow merge).

use crate::ast::Node;
use crate::models::FrontMatter;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML frontmatter in {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML frontmatter in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON frontmatter in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Frontmatter in {0:?} is not a mapping")]
    NotAMapping(PathBuf),

    #[error("Unexpected frontmatter value in {path:?}: {source}")]
    Shape {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read sidecar {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

/// Sidecar extensions in probe order.
pub const SIDECAR_EXTENSIONS: [(&str, Format); 4] = [
    ("blog.json", Format::Json),
    ("blog.yml", Format::Yaml),
    ("blog.yaml", Format::Yaml),
    ("blog.toml", Format::Toml),
];

impl Format {
    /// Parse `text` into a key/value mapping.
    ///
    /// An empty document (or YAML `null`) is an empty mapping; any other
    /// non-mapping document is an error. `path` is only used for messages.
    pub fn parse(self, text: &str, path: &Path) -> Result<Map<String, Value>, FrontmatterError> {
        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        let value = match self {
            Format::Json => {
                serde_json::from_str::<Value>(text).map_err(|source| FrontmatterError::Json {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Format::Yaml => {
                serde_yaml::from_str::<Value>(text).map_err(|source| FrontmatterError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Format::Toml => {
                let table = toml::from_str::<toml::Table>(text).map_err(|source| {
                    FrontmatterError::Toml {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                toml_to_json(toml::Value::Table(table))
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(FrontmatterError::NotAMapping(path.to_path_buf())),
        }
    }
}

/// TOML datetimes become their RFC 3339 text; everything else maps 1:1.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// The first frontmatter block in the tree, with its format.
pub fn find_inline(ast: &Node) -> Option<(Format, &str)> {
    match ast.find(&|n| matches!(n, Node::Yaml { .. } | Node::Toml { .. }))? {
        Node::Yaml { value } => Some((Format::Yaml, value)),
        Node::Toml { value } => Some((Format::Toml, value)),
        _ => None,
    }
}

/// Sidecar paths for `source`, in probe order.
pub fn sidecar_candidates(source: &Path) -> Vec<(PathBuf, Format)> {
    SIDECAR_EXTENSIONS
        .iter()
        .map(|(ext, format)| (source.with_extension(ext), *format))
        .collect()
}

/// The first sidecar of `source` that exists on disk.
pub async fn find_sidecar(source: &Path) -> Result<Option<(PathBuf, Format)>, FrontmatterError> {
    for (path, format) in sidecar_candidates(source) {
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| FrontmatterError::Io {
                path: path.clone(),
                source,
            })?;
        if exists {
            return Ok(Some((path, format)));
        }
    }
    Ok(None)
}

/// Shallow merge: keys from `sidecar` replace keys from `inline`.
pub fn merge(
    inline: Option<Map<String, Value>>,
    sidecar: Option<Map<String, Value>>,
) -> Map<String, Value> {
    let mut merged = inline.unwrap_or_default();
    if let Some(sidecar) = sidecar {
        merged.extend(sidecar);
    }
    merged
}

/// Read, merge and decode all frontmatter for the markdown file at `source`
/// whose parsed tree is `ast`.
pub async fn resolve(source: &Path, ast: &Node) -> Result<FrontMatter, FrontmatterError> {
    let inline = find_inline(ast)
        .map(|(format, text)| format.parse(text, source))
        .transpose()?;

    let sidecar = match find_sidecar(source).await? {
        Some((path, format)) => {
            tracing::debug!("Reading sidecar {:?}", path);
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| FrontmatterError::Io {
                    path: path.clone(),
                    source,
                })?;
            Some(format.parse(&text, &path)?)
        }
        None => None,
    };

    let merged = merge(inline, sidecar);
    serde_json::from_value(Value::Object(merged)).map_err(|err| FrontmatterError::Shape {
        path: source.to_path_buf(),
        source: err,
    })
}
