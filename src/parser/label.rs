use regex::Regex;
use scraper::{ElementRef, Html, Node};

use super::document::element_text;

/// Value printed next to a label such as "Subject:" in saved pages.
///
/// Looks for the first text node matching `label`, then, in document
/// order after the label's parent: a `dd`, a `td`, then any other text.
pub fn find_label_value(html: &Html, label: &Regex) -> Option<String> {
    // Document order, so "following" is a slice suffix.
    let nodes: Vec<_> = html.tree.root().descendants().collect();

    let label_pos = nodes
        .iter()
        .position(|n| matches!(n.value(), Node::Text(t) if label.is_match(t)))?;
    let label_text = nodes[label_pos].value().as_text().map(|t| t.trim())?;
    let parent = nodes[label_pos].parent().and_then(ElementRef::wrap)?;
    let parent_pos = nodes.iter().position(|n| n.id() == parent.id())?;

    let after_parent = || nodes[parent_pos + 1..].iter().copied().filter_map(ElementRef::wrap);

    first_named(after_parent(), "dd")
        .or_else(|| first_named(after_parent(), "td"))
        .or_else(|| {
            nodes[label_pos + 1..]
                .iter()
                .filter_map(|n| n.value().as_text().map(|t| t.trim()))
                .find(|t| !t.is_empty() && *t != label_text)
                .map(str::to_string)
        })
}

/// Text of the first `name` element; only that one element is considered.
fn first_named<'a>(mut elements: impl Iterator<Item = ElementRef<'a>>, name: &str) -> Option<String> {
    elements
        .find(|el| el.value().name() == name)
        .map(element_text)
        .filter(|t| !t.is_empty())
}
