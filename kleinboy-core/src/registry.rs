//! Article and tag registries.
//!
//! Article order: undated articles (drafts) come first, in descending path
//! order; dated articles follow, newest first. Equal dates fall back to
//! descending path. A date that cannot be parsed sorts after every
//! parseable one.

use crate::collector::{to_slash, ArticleCollector, CollectError};
use crate::dates::parse_date;
use crate::models::{ArticleIndex, ArticleMetadata, ArticleRegistry, TagMetadata, TagRegistry};
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Articles directory {0:?} does not exist")]
    MissingRoot(PathBuf),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

/// Collect every `*.md` file under `root` into a registry.
pub async fn build_article_registry(
    root: &Path,
    collector: &mut ArticleCollector,
) -> Result<ArticleRegistry, BuildError> {
    if !is_dir(root).await {
        return Err(BuildError::MissingRoot(root.to_path_buf()));
    }

    let files = discover_markdown_files(root);
    tracing::info!("Found {} markdown files in {:?}", files.len(), root);

    let mut articles: BTreeMap<String, ArticleMetadata> = BTreeMap::new();
    for file in &files {
        let path = logical_path(root, file);
        let article = collector.collect(file, &path).await?;
        if let Some(previous) = articles.insert(path.clone(), article) {
            tracing::warn!(
                "Duplicate article path {}: {} replaced by {}",
                path,
                previous.source_path,
                file.display()
            );
        }
    }

    let ordered_articles = order_articles(articles.values());
    Ok(ArticleRegistry {
        articles,
        ordered_articles,
    })
}

/// Group articles by tag and resolve each tag's display title.
///
/// A tag with a page at `tags_dir/<key>.md` takes its title from that page,
/// which is collected like any article under the logical path `tags/<key>`.
pub async fn build_tag_registry(
    articles: &ArticleRegistry,
    tags_dir: &Path,
    collector: &mut ArticleCollector,
) -> Result<TagRegistry, BuildError> {
    let mut tag_to_articles: BTreeMap<String, BTreeMap<String, ArticleIndex>> = BTreeMap::new();
    for article in articles.articles.values() {
        for tag in &article.tags {
            tag_to_articles
                .entry(tag.clone())
                .or_default()
                .insert(article.path.clone(), article.index());
        }
    }

    let mut tags = BTreeMap::new();
    for key in tag_to_articles.keys() {
        let page = tags_dir.join(format!("{}.md", key));
        let metadata = if !is_plain_tag_key(key) {
            tracing::warn!("Tag {:?} is not a plain file name; not looking up a tag page", key);
            TagMetadata {
                key: key.clone(),
                title: key.clone(),
                article: None,
            }
        } else if is_file(&page).await {
            let path = format!("tags/{}", key);
            if articles.get(&path).is_some() {
                tracing::warn!(
                    "Tag page {:?} shares logical path {} with an article; its dumps are skipped",
                    page,
                    path
                );
            }
            let article = collector.collect(&page, &path).await?;
            TagMetadata {
                key: key.clone(),
                title: article.title.clone(),
                article: Some(article),
            }
        } else {
            TagMetadata {
                key: key.clone(),
                title: key.clone(),
                article: None,
            }
        };
        tags.insert(key.clone(), metadata);
    }

    tracing::info!("Built tag registry with {} tags", tags.len());

    Ok(TagRegistry {
        tags,
        tag_to_articles,
    })
}

/// A tag key that names a single file inside the tags directory.
fn is_plain_tag_key(key: &str) -> bool {
    !key.is_empty() && key != "." && key != ".." && !key.contains(['/', '\\'])
}

/// Project articles to their index entries, in display order.
pub fn order_articles<'a>(
    articles: impl IntoIterator<Item = &'a ArticleMetadata>,
) -> Vec<ArticleIndex> {
    let mut indexes: Vec<ArticleIndex> = articles.into_iter().map(ArticleMetadata::index).collect();
    indexes.sort_by_cached_key(sort_key);
    indexes
}

/// Undated (0) < dated (1) < unparseable (2); newer dates and larger paths
/// first within a group.
fn sort_key(index: &ArticleIndex) -> (u8, Reverse<Option<NaiveDateTime>>, Reverse<String>) {
    let (group, date) = match index.published_time.as_deref() {
        None => (0, None),
        Some(raw) => match parse_date(raw) {
            Some(date) => (1, Some(date)),
            None => {
                tracing::warn!(
                    "Unrecognized published_time {:?} on {}; sorting it last",
                    raw,
                    index.path
                );
                (2, None)
            }
        },
    };
    (group, Reverse(date), Reverse(index.path.clone()))
}

/// Markdown files under `root`, in a stable (file name) order.
fn discover_markdown_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .map(|entry| entry.into_path())
        .collect()
}

/// `root/posts/hello.md` → `posts/hello`
fn logical_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    to_slash(&relative.with_extension(""))
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
