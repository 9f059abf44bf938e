//! Image report over the last build's articles.json.

use anyhow::{Context, Result};
use kleinboy_core::images::image_paths;
use kleinboy_core::{ArticleRegistry, Config};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub fn list_images(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
    let articles_json = config.articles_json();

    let json = fs::read_to_string(&articles_json).with_context(|| {
        format!(
            "Failed to read {:?}; run `kleinboy build` first",
            articles_json
        )
    })?;
    let registry: ArticleRegistry = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {:?}", articles_json))?;

    let paths = image_paths(&registry);
    tracing::debug!("{} images across {} articles", paths.len(), registry.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in paths {
        writeln!(out, "{}", path)?;
    }

    Ok(())
}
