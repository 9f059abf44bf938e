//! Content model: frontmatter, article metadata, and the two registries.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key of the frontmatter namespace whose fields win over top-level ones.
pub const NAMESPACE_KEY: &str = "x-kleinboy";

/// Metadata found in a document's frontmatter block and/or its sidecar file.
///
/// Unrecognized keys are kept in `extra` so the record serializes back to
/// the same mapping it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub layout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub date: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub category: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_strings"
    )]
    pub categories: Option<Vec<String>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_strings"
    )]
    pub tags: Option<Vec<String>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub title: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub description: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_strings"
    )]
    pub images: Option<Vec<String>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub status: Option<String>,

    #[serde(rename = "x-kleinboy", skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceFields>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Fields under the `x-kleinboy` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceFields {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub status: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub title: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub description: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_strings"
    )]
    pub images: Option<Vec<String>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub published_time: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub modified_time: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FrontMatter {
    fn namespaced<T>(&self, field: impl Fn(&NamespaceFields) -> Option<&T>) -> Option<&T>
    where
        T: ?Sized,
    {
        self.namespace.as_ref().and_then(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.namespaced(|ns| ns.title.as_deref())
            .or(self.title.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        self.namespaced(|ns| ns.description.as_deref())
            .or(self.description.as_deref())
    }

    pub fn images(&self) -> Option<&[String]> {
        self.namespaced(|ns| ns.images.as_deref())
            .or(self.images.as_deref())
    }

    /// Namespace status, then top-level status, then `published` mapped to
    /// `"published"` / `"draft"`.
    pub fn status(&self) -> Option<String> {
        self.namespaced(|ns| ns.status.as_deref())
            .or(self.status.as_deref())
            .map(str::to_string)
            .or_else(|| {
                self.published.map(|published| {
                    let status = if published { "published" } else { "draft" };
                    status.to_string()
                })
            })
    }

    pub fn published_time(&self) -> Option<&str> {
        self.namespaced(|ns| ns.published_time.as_deref())
            .or(self.date.as_deref())
    }

    pub fn modified_time(&self) -> Option<&str> {
        self.namespaced(|ns| ns.modified_time.as_deref())
            .or(self.date.as_deref())
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}

/// Where an article was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Markdown,
}

/// Everything collected about one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    /// Logical site path, e.g. `posts/hello` for `articles/posts/hello.md`
    pub path: String,

    #[serde(rename = "sourceType")]
    pub source_type: SourceType,

    /// Origin file relative to the content root, `/`-separated
    #[serde(rename = "sourcePath")]
    pub source_path: String,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

impl ArticleMetadata {
    pub fn index(&self) -> ArticleIndex {
        ArticleIndex {
            path: self.path.clone(),
            status: self.status.clone(),
            published_time: self.published_time.clone(),
        }
    }
}

/// The slice of [`ArticleMetadata`] needed for ordering and tag links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleIndex {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,
}

/// All articles of one run, plus their display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRegistry {
    pub articles: BTreeMap<String, ArticleMetadata>,
    pub ordered_articles: Vec<ArticleIndex>,
}

impl ArticleRegistry {
    pub fn get(&self, path: &str) -> Option<&ArticleMetadata> {
        self.articles.get(path)
    }

    /// Articles in display order.
    pub fn ordered(&self) -> impl Iterator<Item = &ArticleMetadata> {
        self.ordered_articles
            .iter()
            .filter_map(|index| self.articles.get(&index.path))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMetadata {
    pub key: String,

    pub title: String,

    /// Present when the tag has its own page under `tags/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ArticleMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRegistry {
    pub tags: BTreeMap<String, TagMetadata>,
    pub tag_to_articles: BTreeMap<String, BTreeMap<String, ArticleIndex>>,
}

impl TagRegistry {
    pub fn get(&self, key: &str) -> Option<&TagMetadata> {
        self.tags.get(key)
    }

    /// Articles carrying `key`, keyed by article path.
    pub fn articles_for(&self, key: &str) -> Option<&BTreeMap<String, ArticleIndex>> {
        self.tag_to_articles.get(key)
    }
}

/// Accept any scalar where a string is expected (`date: 2024`, `title: 42`).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

/// Accept a single scalar or a list of scalars (`tags: rust`).
fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(scalar_to_string)
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
            .map_err(D::Error::custom),
        Some(value) => scalar_to_string(value)
            .map(|s| Some(vec![s]))
            .map_err(D::Error::custom),
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, found {}", other)),
    }
}
