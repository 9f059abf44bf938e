//! Image references resolved against the article that uses them.

use crate::models::ArticleRegistry;
use regex::Regex;
use std::sync::OnceLock;

static URL_SCHEME: OnceLock<Regex> = OnceLock::new();

fn url_scheme() -> &'static Regex {
    URL_SCHEME.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("static regex"))
}

/// Resolve `url` as referenced from the article at `source_path`.
///
/// URLs with a scheme and root-relative paths come back unchanged. Anything
/// else is taken relative to the directory of `source_path`, with `.` and
/// `..` segments folded away.
///
/// ```
/// use kleinboy_core::images::resolve_image_path;
///
/// assert_eq!(resolve_image_path("articles/posts/a.md", "../img/x.png"), "articles/img/x.png");
/// assert_eq!(resolve_image_path("articles/a.md", "/static/x.png"), "/static/x.png");
/// ```
pub fn resolve_image_path(source_path: &str, url: &str) -> String {
    if url.starts_with('/') || url_scheme().is_match(url) {
        return url.to_string();
    }

    let base = source_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(url.split('/')) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Every image of every article, articles in display order.
pub fn image_paths(articles: &ArticleRegistry) -> Vec<String> {
    articles
        .ordered()
        .flat_map(|article| {
            article
                .images
                .iter()
                .map(|url| resolve_image_path(&article.source_path, url))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleMetadata, SourceType};
    use crate::registry::order_articles;
    use std::collections::BTreeMap;

    fn article(path: &str, date: Option<&str>, images: &[&str]) -> ArticleMetadata {
        ArticleMetadata {
            path: path.into(),
            source_type: SourceType::Markdown,
            source_path: format!("articles/{}.md", path),
            title: path.into(),
            description: String::new(),
            tags: Vec::new(),
            images: images.iter().map(|s| s.to_string()).collect(),
            status: None,
            published_time: date.map(str::to_string),
            modified_time: None,
        }
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(
            resolve_image_path("articles/posts/a.md", "pic.png"),
            "articles/posts/pic.png"
        );
        assert_eq!(
            resolve_image_path("articles/posts/a.md", "./img/../pic.png"),
            "articles/posts/pic.png"
        );
        assert_eq!(resolve_image_path("a.md", "../../up.png"), "../../up.png");
    }

    #[test]
    fn test_absolute_urls_untouched() {
        assert_eq!(
            resolve_image_path("articles/a.md", "https://example.com/x.png"),
            "https://example.com/x.png"
        );
        assert_eq!(
            resolve_image_path("articles/a.md", "data:image/png;base64,AAAA"),
            "data:image/png;base64,AAAA"
        );
        assert_eq!(
            resolve_image_path("articles/a.md", "//cdn.example.com/x.png"),
            "//cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_image_paths_follow_display_order() {
        let list = [
            article("old", Some("2019-01-01"), &["o.png"]),
            article("new", Some("2022-01-01"), &["n1.png", "n2.png"]),
            article("draft", None, &["d.png"]),
        ];
        let registry = ArticleRegistry {
            articles: list
                .iter()
                .map(|a| (a.path.clone(), a.clone()))
                .collect::<BTreeMap<_, _>>(),
            ordered_articles: order_articles(&list),
        };

        assert_eq!(
            image_paths(&registry),
            vec![
                "articles/d.png",
                "articles/n1.png",
                "articles/n2.png",
                "articles/o.png"
            ]
        );
    }
}
