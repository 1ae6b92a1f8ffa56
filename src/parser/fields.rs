//! Strategies shared by the networked and saved-file extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::cascade::longer_than;
use super::document::{element_text, next_element_sibling, normalize, text_content, PageView};

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{1,4}\d{1,4}[A-Za-z]?)\b").unwrap());
static PREREQ_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[;,]\s*|\n").unwrap());

pub const COURSE_NUMBER_SELECTORS: &[&str] = &[
    ".field--name-field-course-number .field__item",
    ".field--name-field-course-number",
];

const PREREQ_KEYWORD: &str = "prerequisite";
const PREREQ_HEADINGS: &str = "h1, h2, h3, h4, strong, b";

/// Meta descriptions shorter than this are usually boilerplate.
pub const META_MIN_LEN: usize = 10;
/// Minimum length for a bare paragraph to pass as a description.
pub const PARAGRAPH_MIN_LEN: usize = 40;

/// Course-code looking token (`ABC123`, `MA1A`) anywhere in the page text.
/// Matched against raw text so split markup like `<b>CS</b>101` still
/// reads as one token.
pub fn code_in_text(view: &PageView) -> Option<String> {
    let text = view
        .first("body")
        .map(text_content)
        .unwrap_or_else(|| text_content(view.html().root_element()));
    CODE_RE.captures(&text).map(|caps| caps[1].to_string())
}

pub fn meta_description(view: &PageView) -> Option<String> {
    view.attr_of("meta[name=description]", "content")
        .filter(|c| longer_than(c, META_MIN_LEN))
}

/// First paragraph long enough to be prose rather than a label.
pub fn long_paragraph(view: &PageView) -> Option<String> {
    view.all("p")
        .into_iter()
        .map(element_text)
        .find(|t| longer_than(t, PARAGRAPH_MIN_LEN))
}

/// Items listed after a "Prerequisites" heading, or empty when the page
/// has none.
pub fn prerequisites(view: &PageView) -> Vec<String> {
    let anchor = view
        .all(PREREQ_HEADINGS)
        .into_iter()
        .find(|el| mentions_prereq(*el))
        .or_else(|| first_mention(view));

    anchor
        .and_then(next_element_sibling)
        .map(|sib| split_prerequisites(&text_content(sib)))
        .unwrap_or_default()
}

pub fn split_prerequisites(text: &str) -> Vec<String> {
    PREREQ_SPLIT_RE
        .split(text.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn mentions_prereq(el: ElementRef<'_>) -> bool {
    normalize(&text_content(el)).contains(PREREQ_KEYWORD)
}

/// First element in document order mentioning the keyword. On a full
/// document that is the root, which has no sibling, so a passing mention
/// in prose never picks up the next paragraph.
fn first_mention(view: &PageView) -> Option<ElementRef<'_>> {
    view.html()
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| mentions_prereq(*el))
}
