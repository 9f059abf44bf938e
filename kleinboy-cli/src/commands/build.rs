//! Build command implementation.

use anyhow::{Context, Result};
use kleinboy_core::{Config, SiteBuilder};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Collect metadata for the content tree and write the JSON artifacts
pub async fn build_site(config_path: &Path, debug: bool) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let mut config =
        Config::load_or_default(config_path).context("Failed to load configuration")?;
    if debug {
        config = config.with_debug_dumps();
    }

    let builder = SiteBuilder::new(config.clone());
    let output = builder.build().await.context("Failed to build site")?;

    tracing::info!(
        "Collected {} articles and {} tags",
        output.articles.len(),
        output.tags.tags.len()
    );

    if config.dump_article_metadata {
        write_json(&config.articles_json(), &output.articles)?;
    } else {
        tracing::info!("dumpArticleMetadata disabled; skipping articles.json");
    }

    if config.dump_tag_metadata {
        write_json(&config.tags_json(), &output.tags)?;
    } else {
        tracing::info!("dumpTagMetadata disabled; skipping tags.json");
    }

    if output.dumps.failed > 0 {
        tracing::warn!("{} debug dumps could not be written", output.dumps.failed);
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {:?}", path))?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;

    tracing::info!("Generated {:?}", path);

    Ok(())
}
