//! # kleinboy-core
//!
//! Core library for the kleinboy article metadata builder.
//!
//! Markdown files go in; an article registry (title, description, images,
//! tags, publish status and times, display order) and a tag registry come
//! out.

pub mod ast;
pub mod builder;
pub mod collector;
pub mod config;
pub mod dates;
pub mod dump;
pub mod extract;
pub mod frontmatter;
pub mod images;
pub mod markdown;
pub mod models;
pub mod registry;
pub mod slug;

pub use ast::Node;
pub use builder::{SiteBuilder, SiteOutput};
pub use collector::{ArticleCollector, CollectError};
pub use config::{Config, ConfigError};
pub use dump::DumpReport;
pub use frontmatter::FrontmatterError;
pub use markdown::MarkdownProcessor;
pub use models::{
    ArticleIndex, ArticleMetadata, ArticleRegistry, FrontMatter, SourceType, TagMetadata,
    TagRegistry,
};
pub use registry::BuildError;
pub use slug::slugify;
