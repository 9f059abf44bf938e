//! CLI command implementations.

pub mod build;
pub mod images;

pub use build::build_site;
pub use images::list_images;
