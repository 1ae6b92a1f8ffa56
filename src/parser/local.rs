use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::cascade::Cascade;
use super::document::PageView;
use super::fields::{self, COURSE_NUMBER_SELECTORS};
use super::label::find_label_value;
use crate::record::{self, Course};

static PAREN_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Za-z0-9\-_/]+)\)").unwrap());
static PAREN_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([A-Za-z0-9\-_/]+\)\s*$").unwrap());

static CODE_LABEL: LazyLock<Regex> = LazyLock::new(|| label(r"Course\s*(Number|Code)"));
static SUBJECT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| label(r"\bSubject\b|Department|Discipline"));
static LEVEL_LABEL: LazyLock<Regex> = LazyLock::new(|| label(r"\bLevel\b|Grade Level|Audience"));
static SEMESTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| label(r"\bSemester\b|Term\b|Year-?long|Year long"));

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".course-description",
    ".description",
    ".lead",
    ".summary",
    ".field--name-body",
    "main p",
    "article p",
];

/// Subject names the catalog uses, checked in this order when no label is
/// present.
const KNOWN_SUBJECTS: &[&str] = &[
    "Humanities",
    "Core",
    "English",
    "Science",
    "Mathematics",
    "Computer Science",
    "Languages",
    "History",
    "Wellness",
    "Homeroom",
];

fn label(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

/// Build a course from a saved page. No rendering happened, so labels
/// printed next to values stand in for the catalog's field classes.
pub fn extract(view: &PageView, url: &str) -> Course {
    let mut name = Cascade::new(view, "name")
        .then(|v| v.text_of("h1"))
        .then(PageView::title)
        .value();

    let code = match split_code_suffix(&name) {
        Some((code, bare)) => {
            name = bare;
            code
        }
        None => Cascade::new(view, "code")
            .then(|v| find_label_value(v.html(), &CODE_LABEL))
            .selectors(COURSE_NUMBER_SELECTORS, 0)
            .value(),
    };

    let description = Cascade::new(view, "description")
        .selectors(DESCRIPTION_SELECTORS, 0)
        .then(fields::meta_description)
        .then(fields::long_paragraph)
        .value();

    let subject = Cascade::new(view, "subject")
        .then(|v| find_label_value(v.html(), &SUBJECT_LABEL))
        .then(known_subject)
        .value();
    let level = Cascade::new(view, "level")
        .then(|v| find_label_value(v.html(), &LEVEL_LABEL))
        .value();
    let semester = Cascade::new(view, "semester")
        .then(|v| find_label_value(v.html(), &SEMESTER_LABEL))
        .value();

    let slug = record::slug(&code, &name);

    Course {
        source_url: url.to_string(),
        code,
        name,
        description,
        subject,
        level,
        semester,
        prerequisites: fields::prerequisites(view),
        slug,
        source_file: None,
    }
}

/// `"Journalism (JLCD1)"` -> `("JLCD1", "Journalism")`.
pub fn split_code_suffix(name: &str) -> Option<(String, String)> {
    let code = PAREN_CODE_RE.captures(name)?[1].to_string();
    let bare = PAREN_SUFFIX_RE.replace(name, "").trim().to_string();
    Some((code, bare))
}

fn known_subject(view: &PageView) -> Option<String> {
    let text = view.page_text().to_lowercase();
    KNOWN_SUBJECTS
        .iter()
        .find(|s| text.contains(&s.to_lowercase()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "file:///saved/journalism.html";

    fn fixture(name: &str) -> PageView {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        PageView::parse(&html)
    }

    #[test]
    fn saved_page_with_labels() {
        let c = extract(&fixture("local_course"), URL);
        assert_eq!(c.name, "Journalism");
        assert_eq!(c.code, "JLCD1");
        assert_eq!(c.slug, "jlcd1");
        assert_eq!(c.subject, "English");
        assert_eq!(c.level, "Advanced");
        assert_eq!(c.semester, "Year-long");
        assert!(c.description.starts_with("Report, write and edit"));
        assert_eq!(c.prerequisites, vec!["English 9", "Instructor consent"]);
    }

    #[test]
    fn code_from_label_when_name_has_none() {
        let c = extract(&fixture("local_table"), URL);
        assert_eq!(c.name, "Discrete Mathematics");
        assert_eq!(c.code, "MATH310");
        assert_eq!(c.subject, "Mathematics");
        assert_eq!(c.level, "Upper school");
        assert_eq!(c.semester, "Spring");
    }

    #[test]
    fn subject_keyword_fallback() {
        let v = PageView::parse(
            "<html><body><h1>Lab Skills</h1><p>A hands-on science elective.</p></body></html>",
        );
        let c = extract(&v, URL);
        assert_eq!(c.subject, "Science");
        assert_eq!(c.code, "");
        assert_eq!(c.slug, "lab-skills");
    }

    #[test]
    fn suffix_split() {
        assert_eq!(
            split_code_suffix("Journalism (JLCD1)"),
            Some(("JLCD1".to_string(), "Journalism".to_string()))
        );
        assert_eq!(split_code_suffix("No code here"), None);
    }

    #[test]
    fn title_when_no_heading() {
        let v = PageView::parse("<html><head><title>Art Studio (ART-2)</title></head></html>");
        let c = extract(&v, URL);
        assert_eq!(c.name, "Art Studio");
        assert_eq!(c.code, "ART-2");
    }
}
