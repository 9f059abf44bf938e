//! Markdown parsing and HTML rendering.
//!
//! `pulldown-cmark` does the heavy lifting in both directions; this module
//! fixes the parser options and routes everything through [`Node`] so the
//! metadata extractors and the HTML output see the same tree.

use crate::ast::Node;
use crate::slug::Slugger;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Markdown processor with frontmatter block support
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        // `---` YAML and `+++` TOML blocks at the top of a file
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        options.insert(Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS);

        Self { options }
    }

    /// Parse markdown text into a document tree
    pub fn parse(&self, markdown: &str) -> Node {
        Node::from_events(Parser::new_ext(markdown, self.options))
    }

    /// Render a document tree to an HTML fragment
    ///
    /// Headings get stable ids (explicit `{#id}` attributes are kept) and a
    /// trailing `#` anchor link. Frontmatter blocks are not rendered.
    pub fn render_html(&self, ast: &Node) -> String {
        let events = attach_heading_ids(ast.to_events());
        let events = add_heading_anchors(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill in missing heading ids from the heading text.
fn attach_heading_ids(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut slugger = Slugger::new();
    for event in &events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            slugger.reserve(id);
        }
    }

    let mut result = Vec::with_capacity(events.len());
    let mut pending: Option<usize> = None;
    let mut title = String::new();

    for event in events {
        match &event {
            Event::Start(Tag::Heading { id: None, .. }) => {
                pending = Some(result.len());
                title.clear();
            }
            Event::Text(text) | Event::Code(text) if pending.is_some() => {
                title.push_str(text);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(index) = pending.take() {
                    if let Event::Start(Tag::Heading { id, .. }) = &mut result[index] {
                        *id = Some(CowStr::from(slugger.slug(&title)));
                    }
                }
            }
            _ => {}
        }
        result.push(event);
    }

    result
}

fn add_heading_anchors(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut result = Vec::with_capacity(events.len());
    let mut current_id: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                current_id = id.as_ref().map(|s| s.to_string());
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(id) = current_id.take() {
                    let anchor = format!(
                        "<a class=\"heading-anchor\" href=\"#{}\" aria-label=\"Link to heading\">#</a>",
                        html_escape(&id)
                    );
                    result.push(Event::Html(CowStr::from(anchor)));
                }
                result.push(Event::End(TagEnd::Heading(level)));
            }
            other => result.push(other),
        }
    }

    result
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
