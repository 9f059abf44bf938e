//! Text artifacts derived from a document tree: title, description, images.
//!
//! Nothing here touches the filesystem.

use crate::ast::Node;

/// Emitted in place of code blocks and images so their payload never ends
/// up in a summary.
pub const PLACEHOLDER: &str = "...";

pub const DEFAULT_DESCRIPTION_LENGTH: usize = 200;
pub const DEFAULT_ELLIPSIS: &str = "...";

/// Lazy depth-first walk over the text leaves of a tree.
///
/// Created by [`find_texts`] and [`find_texts_with`].
pub struct Texts<'a, F> {
    stack: Vec<&'a Node>,
    visitor: F,
}

impl<'a, F> Iterator for Texts<'a, F>
where
    F: FnMut(&Node) -> bool,
{
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(node) = self.stack.pop() {
            if !(self.visitor)(node) {
                continue;
            }
            match node {
                Node::Text { value } | Node::InlineCode { value } => return Some(value),
                Node::Code { .. } | Node::Image { .. } => return Some(PLACEHOLDER),
                _ => self.stack.extend(node.children().iter().rev()),
            }
        }
        None
    }
}

/// All text in document order.
pub fn find_texts(node: &Node) -> Texts<'_, fn(&Node) -> bool> {
    let everything: fn(&Node) -> bool = |_| true;
    find_texts_with(node, everything)
}

/// Text in document order, skipping every subtree for which `visitor`
/// returns `false`. The visitor sees each node before it is descended into.
pub fn find_texts_with<F>(node: &Node, visitor: F) -> Texts<'_, F>
where
    F: FnMut(&Node) -> bool,
{
    Texts {
        stack: vec![node],
        visitor,
    }
}

/// Text of the first heading, or `None` when the document has none.
pub fn extract_title(node: &Node) -> Option<String> {
    let heading = node.find(&Node::is_heading)?;
    Some(find_texts(heading).collect::<Vec<_>>().join(" "))
}

#[derive(Debug, Clone)]
pub struct DescriptionOptions {
    pub max_length: usize,
    pub ellipsis: String,
}

impl Default for DescriptionOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_DESCRIPTION_LENGTH,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
        }
    }
}

/// Body text without headings, whitespace-collapsed and cut to
/// `max_length` characters.
///
/// The cut is by character count and may split a word.
pub fn extract_description(node: &Node, options: &DescriptionOptions) -> String {
    let joined = find_texts_with(node, |n| !n.is_heading())
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= options.max_length {
        return collapsed;
    }

    let ellipsis_len = options.ellipsis.chars().count();
    if options.max_length <= ellipsis_len {
        return options.ellipsis.chars().take(options.max_length).collect();
    }

    let keep = options.max_length - ellipsis_len;
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.push_str(&options.ellipsis);
    truncated
}

/// Every image URL in document order, duplicates included.
pub fn extract_images(node: &Node) -> Vec<String> {
    let mut images = Vec::new();
    collect_images(node, &mut images);
    images
}

fn collect_images(node: &Node, out: &mut Vec<String>) {
    if let Node::Image { url, .. } = node {
        out.push(url.clone());
    }
    for child in node.children() {
        collect_images(child, out);
    }
}
