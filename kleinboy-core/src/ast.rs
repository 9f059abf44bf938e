//! Document tree built from `pulldown-cmark` events.
//!
//! The parser hands out a flat stream of start/end events. Metadata
//! extraction wants a tree it can search and prune, and the debug dump wants
//! something that serializes as one JSON document, so the stream is folded
//! into [`Node`] here and unfolded back into events for HTML rendering.

use pulldown_cmark::{
    Alignment, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, MetadataBlockKind, Tag,
};
use serde::{Deserialize, Serialize};

/// A node of the parsed document.
///
/// Serializes with a `type` tag (`"root"`, `"heading"`, `"text"`,
/// `"inlineCode"`, `"image"`, `"yaml"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root {
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        children: Vec<Node>,
    },
    Blockquote {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        children: Vec<Node>,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        children: Vec<Node>,
    },
    Table {
        align: Vec<Align>,
        children: Vec<Node>,
    },
    TableHead {
        children: Vec<Node>,
    },
    TableRow {
        children: Vec<Node>,
    },
    TableCell {
        children: Vec<Node>,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Delete {
        children: Vec<Node>,
    },
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        title: String,
        children: Vec<Node>,
    },
    FootnoteDefinition {
        label: String,
        children: Vec<Node>,
    },
    /// Any construct without a dedicated variant (definition lists,
    /// superscript, ...). Keeps its children so text is still reachable.
    Container {
        children: Vec<Node>,
    },
    Text {
        value: String,
    },
    InlineCode {
        value: String,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        value: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        title: String,
        alt: String,
    },
    Html {
        value: String,
    },
    FootnoteReference {
        label: String,
    },
    Break,
    ThematicBreak,
    Yaml {
        value: String,
    },
    Toml {
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl From<Alignment> for Align {
    fn from(value: Alignment) -> Self {
        match value {
            Alignment::None => Align::None,
            Alignment::Left => Align::Left,
            Alignment::Center => Align::Center,
            Alignment::Right => Align::Right,
        }
    }
}

impl From<Align> for Alignment {
    fn from(value: Align) -> Self {
        match value {
            Align::None => Alignment::None,
            Align::Left => Alignment::Left,
            Align::Center => Alignment::Center,
            Align::Right => Alignment::Right,
        }
    }
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root { children }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// Child nodes in document order; empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children, .. }
            | Node::TableHead { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. }
            | Node::FootnoteDefinition { children, .. }
            | Node::Container { children } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Table { children, .. }
            | Node::TableHead { children }
            | Node::TableRow { children }
            | Node::TableCell { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. }
            | Node::FootnoteDefinition { children, .. }
            | Node::Container { children } => Some(children),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Node::Heading { .. })
    }

    /// First node, depth-first and in document order, matching `pred`.
    pub fn find(&self, pred: &impl Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(pred))
    }

    /// Fold a parser event stream into a tree rooted at [`Node::Root`].
    pub fn from_events<'a>(events: impl IntoIterator<Item = Event<'a>>) -> Node {
        let mut folder = Folder::default();
        for event in events {
            folder.push(event);
        }
        folder.finish()
    }

    /// Unfold the tree back into parser events for HTML rendering.
    ///
    /// Frontmatter blocks produce no events.
    pub fn to_events(&self) -> Vec<Event<'static>> {
        let mut events = Vec::new();
        self.unfold(&mut events);
        events
    }

    fn unfold(&self, out: &mut Vec<Event<'static>>) {
        let tag = match self {
            Node::Root { children } | Node::Container { children } => {
                for child in children {
                    child.unfold(out);
                }
                return;
            }
            Node::Text { value } => {
                out.push(Event::Text(CowStr::from(value.clone())));
                return;
            }
            Node::InlineCode { value } => {
                out.push(Event::Code(CowStr::from(value.clone())));
                return;
            }
            Node::Html { value } => {
                out.push(Event::Html(CowStr::from(value.clone())));
                return;
            }
            Node::FootnoteReference { label } => {
                out.push(Event::FootnoteReference(CowStr::from(label.clone())));
                return;
            }
            Node::Break => {
                out.push(Event::HardBreak);
                return;
            }
            Node::ThematicBreak => {
                out.push(Event::Rule);
                return;
            }
            Node::Yaml { .. } | Node::Toml { .. } => return,
            Node::Code { lang, value } => {
                let kind = match lang {
                    Some(lang) => CodeBlockKind::Fenced(CowStr::from(lang.clone())),
                    None => CodeBlockKind::Indented,
                };
                let tag = Tag::CodeBlock(kind);
                let end = tag.to_end();
                out.push(Event::Start(tag));
                out.push(Event::Text(CowStr::from(value.clone())));
                out.push(Event::End(end));
                return;
            }
            Node::Image { url, title, alt } => {
                let tag = Tag::Image {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::from(url.clone()),
                    title: CowStr::from(title.clone()),
                    id: CowStr::Borrowed(""),
                };
                let end = tag.to_end();
                out.push(Event::Start(tag));
                if !alt.is_empty() {
                    out.push(Event::Text(CowStr::from(alt.clone())));
                }
                out.push(Event::End(end));
                return;
            }
            Node::Paragraph { .. } => Tag::Paragraph,
            Node::Heading { depth, id, .. } => Tag::Heading {
                level: HeadingLevel::try_from(*depth as usize).unwrap_or(HeadingLevel::H6),
                id: id.clone().map(CowStr::from),
                classes: Vec::new(),
                attrs: Vec::new(),
            },
            Node::Blockquote { .. } => Tag::BlockQuote(None),
            Node::List { ordered, start, .. } => {
                Tag::List(ordered.then(|| start.unwrap_or(1)))
            }
            Node::ListItem { .. } => Tag::Item,
            Node::Table { align, .. } => {
                Tag::Table(align.iter().copied().map(Alignment::from).collect())
            }
            Node::TableHead { .. } => Tag::TableHead,
            Node::TableRow { .. } => Tag::TableRow,
            Node::TableCell { .. } => Tag::TableCell,
            Node::Emphasis { .. } => Tag::Emphasis,
            Node::Strong { .. } => Tag::Strong,
            Node::Delete { .. } => Tag::Strikethrough,
            Node::Link { url, title, .. } => Tag::Link {
                link_type: LinkType::Inline,
                dest_url: CowStr::from(url.clone()),
                title: CowStr::from(title.clone()),
                id: CowStr::Borrowed(""),
            },
            Node::FootnoteDefinition { label, .. } => {
                Tag::FootnoteDefinition(CowStr::from(label.clone()))
            }
        };

        let end = tag.to_end();
        out.push(Event::Start(tag));
        if let Node::ListItem {
            checked: Some(checked),
            ..
        } = self
        {
            out.push(Event::TaskListMarker(*checked));
        }
        for child in self.children() {
            child.unfold(out);
        }
        out.push(Event::End(end));
    }
}

/// Stack machine turning start/end events into nested nodes.
struct Folder {
    stack: Vec<Node>,
    /// Nesting depth of tags opened inside an image; their text becomes alt.
    alt_depth: usize,
}

impl Default for Folder {
    fn default() -> Self {
        Self {
            stack: vec![Node::root(Vec::new())],
            alt_depth: 0,
        }
    }
}

impl Folder {
    fn top(&mut self) -> &mut Node {
        // The root is never popped.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, event: Event<'_>) {
        if matches!(self.top(), Node::Image { .. }) {
            self.push_alt(event);
            return;
        }

        match event {
            Event::Start(tag) => {
                let node = open(tag);
                self.stack.push(node);
            }
            Event::End(_) => self.close(),
            Event::Text(text) => match self.top() {
                Node::Code { value, .. }
                | Node::Html { value }
                | Node::Yaml { value }
                | Node::Toml { value } => value.push_str(&text),
                _ => self.leaf(Node::text(text.to_string())),
            },
            Event::Code(code) => self.leaf(Node::InlineCode {
                value: code.to_string(),
            }),
            Event::Html(html) | Event::InlineHtml(html) => match self.top() {
                Node::Html { value } => value.push_str(&html),
                _ => self.leaf(Node::Html {
                    value: html.to_string(),
                }),
            },
            Event::FootnoteReference(label) => self.leaf(Node::FootnoteReference {
                label: label.to_string(),
            }),
            Event::SoftBreak => self.leaf(Node::text("\n")),
            Event::HardBreak => self.leaf(Node::Break),
            Event::Rule => self.leaf(Node::ThematicBreak),
            Event::TaskListMarker(done) => {
                if let Node::ListItem { checked, .. } = self.top() {
                    *checked = Some(done);
                }
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.leaf(Node::text(math.to_string()))
            }
        }
    }

    fn push_alt(&mut self, event: Event<'_>) {
        match event {
            Event::Start(_) => self.alt_depth += 1,
            Event::End(_) if self.alt_depth > 0 => self.alt_depth -= 1,
            Event::End(_) => self.close(),
            Event::Text(text) | Event::Code(text) => {
                if let Node::Image { alt, .. } = self.top() {
                    alt.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Node::Image { alt, .. } = self.top() {
                    alt.push(' ');
                }
            }
            _ => {}
        }
    }

    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(node) = self.stack.pop() {
            self.leaf(node);
        }
    }

    /// Append a finished node to the innermost open container, merging runs
    /// of text into a single node.
    fn leaf(&mut self, node: Node) {
        let Some(children) = self.top().children_mut() else {
            return;
        };
        if let (Node::Text { value: next }, Some(Node::Text { value: last })) =
            (&node, children.last_mut())
        {
            last.push_str(next);
            return;
        }
        children.push(node);
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack.pop().unwrap_or_else(|| Node::root(Vec::new()))
    }
}

fn open(tag: Tag<'_>) -> Node {
    match tag {
        Tag::Paragraph => Node::Paragraph {
            children: Vec::new(),
        },
        Tag::Heading { level, id, .. } => Node::Heading {
            depth: level as u8,
            id: id.map(|id| id.to_string()),
            children: Vec::new(),
        },
        Tag::BlockQuote(_) => Node::Blockquote {
            children: Vec::new(),
        },
        Tag::CodeBlock(kind) => Node::Code {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(|lang| lang.to_string()),
                CodeBlockKind::Indented => None,
            },
            value: String::new(),
        },
        Tag::HtmlBlock => Node::Html {
            value: String::new(),
        },
        Tag::List(start) => Node::List {
            ordered: start.is_some(),
            start,
            children: Vec::new(),
        },
        Tag::Item => Node::ListItem {
            checked: None,
            children: Vec::new(),
        },
        Tag::FootnoteDefinition(label) => Node::FootnoteDefinition {
            label: label.to_string(),
            children: Vec::new(),
        },
        Tag::Table(align) => Node::Table {
            align: align.into_iter().map(Align::from).collect(),
            children: Vec::new(),
        },
        Tag::TableHead => Node::TableHead {
            children: Vec::new(),
        },
        Tag::TableRow => Node::TableRow {
            children: Vec::new(),
        },
        Tag::TableCell => Node::TableCell {
            children: Vec::new(),
        },
        Tag::Emphasis => Node::Emphasis {
            children: Vec::new(),
        },
        Tag::Strong => Node::Strong {
            children: Vec::new(),
        },
        Tag::Strikethrough => Node::Delete {
            children: Vec::new(),
        },
        Tag::Link {
            dest_url, title, ..
        } => Node::Link {
            url: dest_url.to_string(),
            title: title.to_string(),
            children: Vec::new(),
        },
        Tag::Image {
            dest_url, title, ..
        } => Node::Image {
            url: dest_url.to_string(),
            title: title.to_string(),
            alt: String::new(),
        },
        Tag::MetadataBlock(MetadataBlockKind::YamlStyle) => Node::Yaml {
            value: String::new(),
        },
        Tag::MetadataBlock(MetadataBlockKind::PlusesStyle) => Node::Toml {
            value: String::new(),
        },
        _ => Node::Container {
            children: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn parse(markdown: &str) -> Node {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        options.insert(Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS);
        Node::from_events(Parser::new_ext(markdown, options))
    }

    #[test]
    fn test_heading_and_paragraph() {
        let root = parse("# Hello\n\nSome *emphasis* here.");
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], Node::Heading { depth: 1, .. }));
        assert_eq!(children[0].children(), &[Node::text("Hello")]);
        assert!(matches!(&children[1], Node::Paragraph { .. }));
        assert!(children[1]
            .children()
            .iter()
            .any(|n| matches!(n, Node::Emphasis { .. })));
    }

    #[test]
    fn test_image_alt_is_collected() {
        let root = parse("![a *fancy* cat](cat.png \"Cat\")");
        let image = root
            .find(&|n| matches!(n, Node::Image { .. }))
            .expect("image node");
        assert_eq!(
            image,
            &Node::Image {
                url: "cat.png".into(),
                title: "Cat".into(),
                alt: "a fancy cat".into(),
            }
        );
    }

    #[test]
    fn test_code_block_keeps_value_and_lang() {
        let root = parse("```rust extra\nfn main() {}\n```\n");
        assert_eq!(
            root.children()[0],
            Node::Code {
                lang: Some("rust".into()),
                value: "fn main() {}\n".into(),
            }
        );
    }

    #[test]
    fn test_yaml_and_toml_blocks() {
        let yaml = parse("---\ntitle: A\n---\n\n# Body\n");
        assert!(matches!(&yaml.children()[0], Node::Yaml { value } if value.contains("title: A")));

        let toml = parse("+++\ntitle = \"A\"\n+++\n\n# Body\n");
        assert!(matches!(&toml.children()[0], Node::Toml { value } if value.contains("title = \"A\"")));
    }

    #[test]
    fn test_soft_breaks_merge_into_text() {
        let root = parse("line one\nline two");
        assert_eq!(
            root.children()[0].children(),
            &[Node::text("line one\nline two")]
        );
    }

    #[test]
    fn test_task_list_marker() {
        let root = parse("- [x] done\n- [ ] todo\n");
        let list = &root.children()[0];
        let checked: Vec<_> = list
            .children()
            .iter()
            .map(|item| match item {
                Node::ListItem { checked, .. } => *checked,
                _ => None,
            })
            .collect();
        assert_eq!(checked, vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let root = parse("Use `cargo` here.");
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["type"], "root");
        assert_eq!(json["children"][0]["type"], "paragraph");
        assert_eq!(json["children"][0]["children"][1]["type"], "inlineCode");
        assert_eq!(json["children"][0]["children"][1]["value"], "cargo");
    }

    #[test]
    fn test_unfold_skips_frontmatter() {
        let root = parse("---\ntitle: A\n---\n\nText\n");
        let events = root.to_events();
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::Start(Tag::MetadataBlock(_)))));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Text(t) if t.as_ref() == "Text")));
    }
}
