//! Site building logic - one run from content root to registries.

use crate::collector::ArticleCollector;
use crate::config::Config;
use crate::dump::DumpReport;
use crate::models::{ArticleRegistry, TagRegistry};
use crate::registry::{build_article_registry, build_tag_registry, BuildError};

/// Everything one run produces.
#[derive(Debug)]
pub struct SiteOutput {
    pub articles: ArticleRegistry,
    pub tags: TagRegistry,
    pub dumps: DumpReport,
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Collect every article, then every tag, then wait for debug dumps.
    ///
    /// Dumps already started are joined even when collection fails.
    pub async fn build(&self) -> Result<SiteOutput, BuildError> {
        let mut collector = ArticleCollector::new(self.config.clone());
        let result = self.collect(&mut collector).await;
        let dumps = collector.finish().await;
        if dumps.written + dumps.failed > 0 {
            tracing::info!("Debug dumps: {}", dumps);
        }

        let (articles, tags) = result?;
        tracing::info!(
            "Built {} articles and {} tags",
            articles.len(),
            tags.tags.len()
        );

        Ok(SiteOutput {
            articles,
            tags,
            dumps,
        })
    }

    async fn collect(
        &self,
        collector: &mut ArticleCollector,
    ) -> Result<(ArticleRegistry, TagRegistry), BuildError> {
        let articles = build_article_registry(&self.config.articles_dir(), collector).await?;
        let tags = build_tag_registry(&articles, &self.config.tags_dir(), collector).await?;
        Ok((articles, tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_build_site() {
        let dir = tempdir().unwrap();
        let articles = dir.path().join("articles");
        fs::create_dir_all(&articles).unwrap();
        fs::write(
            articles.join("p1.md"),
            "---\ntags: [go]\ndate: 2021-03-04\n---\n\n# First\n",
        )
        .unwrap();
        fs::write(articles.join("draft.md"), "# Draft\n").unwrap();

        let builder = SiteBuilder::new(Config::default().with_root(dir.path()));
        let output = builder.build().await.unwrap();

        assert_eq!(output.articles.len(), 2);
        assert_eq!(output.articles.ordered_articles[0].path, "draft");
        assert_eq!(output.tags.get("go").unwrap().title, "go");
        assert_eq!(output.dumps, DumpReport::default());
    }

    #[tokio::test]
    async fn test_build_with_dumps() {
        let dir = tempdir().unwrap();
        let articles = dir.path().join("articles");
        fs::create_dir_all(&articles).unwrap();
        fs::write(articles.join("only.md"), "# Only\n").unwrap();

        let config = Config::default().with_root(dir.path()).with_debug_dumps();
        let output = SiteBuilder::new(config).build().await.unwrap();

        assert_eq!(output.dumps.written, 2);
        assert!(dir.path().join("generated/ast/only.json").exists());
        assert!(dir.path().join("generated/html/only.html").exists());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempdir().unwrap();
        let builder = SiteBuilder::new(Config::default().with_root(dir.path()));
        assert!(matches!(
            builder.build().await,
            Err(BuildError::MissingRoot(_))
        ));
    }
}
