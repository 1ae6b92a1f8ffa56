use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Read-only view over one parsed page. Every lookup answers `None` rather
/// than failing, so strategies can be chained freely.
pub struct PageView {
    html: Html,
}

impl PageView {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// First element matching a selector list, if it parses.
    pub fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = parse_selector(selector)?;
        self.html.select(&sel).next()
    }

    pub fn all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.html.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// Text of the first match; empty text counts as no match.
    pub fn text_of(&self, selector: &str) -> Option<String> {
        self.first(selector).map(element_text).filter(|t| !t.is_empty())
    }

    pub fn attr_of(&self, selector: &str, attr: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// `<title>` contents.
    pub fn title(&self) -> Option<String> {
        self.text_of("title")
    }

    /// All visible text of the body (or whole document when there is none).
    pub fn page_text(&self) -> String {
        match self.first("body") {
            Some(body) => element_text(body),
            None => element_text(self.html.root_element()),
        }
    }

    pub fn matches_any(&self, selectors: &[&str]) -> bool {
        selectors.iter().any(|s| self.first(s).is_some())
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("Bad selector {:?}: {}", selector, e);
            None
        }
    }
}

/// Descendant text nodes, each trimmed, empties dropped, joined by spaces.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw concatenated text content, whitespace untouched.
pub fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Next element sibling, skipping text and comment nodes.
pub fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Lower-case and collapse whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title> Catalog </title>
        <meta name="description" content="  A course page  "></head>
        <body><h1>  Algebra   <em>I</em> </h1><p></p><div class="x">t</div></body></html>"#;

    #[test]
    fn text_is_trimmed_and_joined() {
        let view = PageView::parse(PAGE);
        assert_eq!(view.text_of("h1").as_deref(), Some("Algebra I"));
        assert_eq!(view.title().as_deref(), Some("Catalog"));
    }

    #[test]
    fn empty_and_missing_are_none() {
        let view = PageView::parse(PAGE);
        assert_eq!(view.text_of("p"), None);
        assert_eq!(view.text_of("h2"), None);
    }

    #[test]
    fn bad_selector_is_a_miss() {
        let view = PageView::parse(PAGE);
        assert_eq!(view.text_of("div[[["), None);
        assert!(view.all(":::").is_empty());
    }

    #[test]
    fn attributes() {
        let view = PageView::parse(PAGE);
        assert_eq!(
            view.attr_of("meta[name=description]", "content").as_deref(),
            Some("A course page")
        );
    }

    #[test]
    fn normalize_folds_case_and_space() {
        assert_eq!(normalize("  Course \n\t PREREQUISITES: "), "course prerequisites:");
    }
}
