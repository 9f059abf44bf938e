//! Per-file collection: markdown file in, [`ArticleMetadata`] out.

use crate::config::Config;
use crate::dump::{dump_path, DumpReport, DumpTasks};
use crate::extract::{extract_description, extract_images, extract_title, DescriptionOptions};
use crate::frontmatter::{self, FrontmatterError};
use crate::markdown::MarkdownProcessor;
use crate::models::{ArticleMetadata, SourceType};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

/// Turns markdown files into [`ArticleMetadata`], one at a time.
///
/// Owns the debug dump writes it starts; call [`ArticleCollector::finish`]
/// to wait for them.
pub struct ArticleCollector {
    config: Config,
    processor: MarkdownProcessor,
    description: DescriptionOptions,
    dumps: DumpTasks,
}

impl ArticleCollector {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            processor: MarkdownProcessor::new(),
            description: DescriptionOptions::default(),
            dumps: DumpTasks::new(),
        }
    }

    /// Collect the markdown file at `source_path`, published under
    /// `logical_path`.
    pub async fn collect(
        &mut self,
        source_path: &Path,
        logical_path: &str,
    ) -> Result<ArticleMetadata, CollectError> {
        tracing::debug!("Collecting {:?} as {}", source_path, logical_path);

        let markdown =
            tokio::fs::read_to_string(source_path)
                .await
                .map_err(|source| CollectError::Read {
                    path: source_path.to_path_buf(),
                    source,
                })?;
        let ast = self.processor.parse(&markdown);
        let fm = frontmatter::resolve(source_path, &ast).await?;

        let title = fm
            .title()
            .map(str::to_string)
            .or_else(|| extract_title(&ast))
            .unwrap_or_else(|| self.config.untitled.clone());
        let description = fm
            .description()
            .map(str::to_string)
            .unwrap_or_else(|| extract_description(&ast, &self.description));
        let images = fm
            .images()
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| extract_images(&ast));

        let metadata = ArticleMetadata {
            path: logical_path.to_string(),
            source_type: SourceType::Markdown,
            source_path: self.display_source_path(source_path),
            title,
            description,
            tags: fm.tags().to_vec(),
            images,
            status: fm.status(),
            published_time: fm.published_time().map(str::to_string),
            modified_time: fm.modified_time().map(str::to_string),
        };

        if self.config.dump_article_ast {
            match serde_json::to_string_pretty(&ast) {
                Ok(json) => {
                    self.dumps.spawn_write(
                        dump_path(&self.config.ast_dir(), logical_path, ".json"),
                        json,
                    );
                }
                Err(err) => tracing::warn!("Failed to serialize AST of {}: {}", logical_path, err),
            }
        }

        if self.config.dump_article_html {
            let html = self.processor.render_html(&ast);
            self.dumps.spawn_write(
                dump_path(&self.config.html_dir(), logical_path, ".html"),
                html,
            );
        }

        Ok(metadata)
    }

    /// Wait for outstanding debug dumps.
    pub async fn finish(&mut self) -> DumpReport {
        self.dumps.join().await
    }

    /// `source_path` relative to the content root with `/` separators, or
    /// as given when it lies outside the root.
    fn display_source_path(&self, source_path: &Path) -> String {
        let root = self.config.root_dir();
        let relative = source_path.strip_prefix(&root).unwrap_or(source_path);
        to_slash(relative)
    }
}

/// Join path components with `/` regardless of platform, dropping `.`.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn config_for(dir: &TempDir) -> Config {
        Config::default().with_root(dir.path())
    }

    fn write(dir: &TempDir, rel: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_collect_from_markdown_only() {
        let dir = tempdir().unwrap();
        let source = write(
            &dir,
            "articles/posts/hello.md",
            "# Hello World\n\nFirst paragraph.\n\n![one](a.png)\n\n```\nhidden\n```\n\n![two](a.png)\n",
        );

        let mut collector = ArticleCollector::new(config_for(&dir));
        let meta = collector.collect(&source, "posts/hello").await.unwrap();

        assert_eq!(meta.path, "posts/hello");
        assert_eq!(meta.source_path, "articles/posts/hello.md");
        assert_eq!(meta.source_type, SourceType::Markdown);
        assert_eq!(meta.title, "Hello World");
        assert_eq!(meta.description, "First paragraph. ... ... ...");
        assert_eq!(meta.images, vec!["a.png", "a.png"]);
        assert!(meta.tags.is_empty());
        assert_eq!(meta.status, None);
        assert_eq!(meta.published_time, None);
    }

    #[tokio::test]
    async fn test_untitled_fallback() {
        let dir = tempdir().unwrap();
        let source = write(&dir, "articles/plain.md", "no heading here\n");

        let mut config = config_for(&dir);
        config.untitled = "Nameless".into();
        let mut collector = ArticleCollector::new(config);
        let meta = collector.collect(&source, "plain").await.unwrap();
        assert_eq!(meta.title, "Nameless");
    }

    #[tokio::test]
    async fn test_namespace_title_beats_heading() {
        let dir = tempdir().unwrap();
        let source = write(
            &dir,
            "articles/ns.md",
            "---\nx-kleinboy:\n  title: C\n  images: [cover.png]\n---\n\n# D\n\n![inline](x.png)\n",
        );

        let mut collector = ArticleCollector::new(config_for(&dir));
        let meta = collector.collect(&source, "ns").await.unwrap();
        assert_eq!(meta.title, "C");
        assert_eq!(meta.images, vec!["cover.png"]);
    }

    #[tokio::test]
    async fn test_frontmatter_fields() {
        let dir = tempdir().unwrap();
        let source = write(
            &dir,
            "articles/fm.md",
            "+++\ntags = [\"go\", \"rust\"]\ndate = 2020-01-01\npublished = false\ndescription = \"Given\"\n+++\n\n# T\n\nBody\n",
        );
        write(
            &dir,
            "articles/fm.blog.yml",
            "x-kleinboy:\n  modified_time: \"2020-02-02\"\n",
        );

        let mut collector = ArticleCollector::new(config_for(&dir));
        let meta = collector.collect(&source, "fm").await.unwrap();
        assert_eq!(meta.tags, vec!["go", "rust"]);
        assert_eq!(meta.description, "Given");
        assert_eq!(meta.status.as_deref(), Some("draft"));
        assert_eq!(meta.published_time.as_deref(), Some("2020-01-01"));
        assert_eq!(meta.modified_time.as_deref(), Some("2020-02-02"));
    }

    #[tokio::test]
    async fn test_malformed_frontmatter_propagates() {
        let dir = tempdir().unwrap();
        let source = write(&dir, "articles/bad.md", "---\ntitle: [oops\n---\n\n# Bad\n");

        let mut collector = ArticleCollector::new(config_for(&dir));
        let err = collector.collect(&source, "bad").await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::Frontmatter(FrontmatterError::Yaml { .. })
        ));
    }

    #[tokio::test]
    async fn test_debug_dumps_written() {
        let dir = tempdir().unwrap();
        let source = write(&dir, "articles/a/b.md", "# Dumped\n\ntext\n");

        let config = config_for(&dir).with_debug_dumps();
        let mut collector = ArticleCollector::new(config);
        collector.collect(&source, "a/b").await.unwrap();
        let report = collector.finish().await;
        assert_eq!(report, DumpReport { written: 2, failed: 0 });

        let ast = fs::read_to_string(dir.path().join("generated/ast/a/b.json")).unwrap();
        let ast: serde_json::Value = serde_json::from_str(&ast).unwrap();
        assert_eq!(ast["type"], "root");

        let html = fs::read_to_string(dir.path().join("generated/html/a/b.html")).unwrap();
        assert!(html.contains("Dumped"));
    }

    #[tokio::test]
    async fn test_failed_dump_does_not_fail_collection() {
        let dir = tempdir().unwrap();
        let source = write(&dir, "articles/x.md", "# X\n");
        // `generated` is a file, so nothing can be written below it
        write(&dir, "generated", "not a directory");

        let config = config_for(&dir).with_debug_dumps();
        let mut collector = ArticleCollector::new(config);
        let meta = collector.collect(&source, "x").await.unwrap();
        assert_eq!(meta.title, "X");
        let report = collector.finish().await;
        assert_eq!(report.failed, 2);
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("./articles/a.md")), "articles/a.md");
    }
}
