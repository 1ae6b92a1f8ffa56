use super::cascade::Cascade;
use super::document::PageView;
use super::fields::{self, COURSE_NUMBER_SELECTORS};
use crate::record::{self, Course};

const NAME_SELECTORS: &[&str] = &["h1.article__title", "h1"];
const DESCRIPTION_SELECTORS: &[&str] = &[
    ".article__body .field__item",
    ".field--name-body .field__item",
];
const SUBJECT_SELECTORS: &[&str] = &[
    ".field--name-field-subject-ref .field__item",
    ".field--name-field-subject-ref",
];
const LEVEL_SELECTORS: &[&str] = &[
    ".field--name-field-level-ref .field__item",
    ".field--name-field-level-ref",
];
const SEMESTER_SELECTORS: &[&str] = &[
    ".field--name-field-semester-ref .field__item",
    ".field--name-field-semester-ref",
];

/// Build a course from a page rendered by the live catalog.
pub fn extract(view: &PageView, url: &str) -> Course {
    let name = Cascade::new(view, "name")
        .selectors(NAME_SELECTORS, 0)
        .then(PageView::title)
        .value();

    let code = Cascade::new(view, "code")
        .selectors(COURSE_NUMBER_SELECTORS, 0)
        .then(fields::code_in_text)
        .value();

    let description = Cascade::new(view, "description")
        .selectors(DESCRIPTION_SELECTORS, fields::META_MIN_LEN)
        .then(fields::meta_description)
        .then(fields::long_paragraph)
        .value();

    let subject = Cascade::new(view, "subject").selectors(SUBJECT_SELECTORS, 0).value();
    let level = Cascade::new(view, "level").selectors(LEVEL_SELECTORS, 0).value();
    let semester = Cascade::new(view, "semester").selectors(SEMESTER_SELECTORS, 0).value();

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

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://catalog.example.org/courses/cs101";

    fn fixture(name: &str) -> PageView {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        PageView::parse(&html)
    }

    #[test]
    fn full_catalog_page() {
        let c = extract(&fixture("live_course"), URL);
        assert_eq!(c.source_url, URL);
        assert_eq!(c.name, "Introduction to Computing");
        assert_eq!(c.code, "CS101");
        assert!(c.description.starts_with("Students explore"));
        assert_eq!(c.subject, "Computer Science");
        assert_eq!(c.level, "Honors");
        assert_eq!(c.semester, "Fall");
        assert_eq!(c.prerequisites, vec!["Algebra I", "Geometry", "Teacher approval"]);
        assert_eq!(c.slug, "cs101");
        assert_eq!(c.source_file, None);
    }

    #[test]
    fn sparse_page_uses_fallbacks() {
        let c = extract(&fixture("live_sparse"), URL);
        // title instead of h1, code sniffed from text, meta description
        assert_eq!(c.name, "Marine Biology | Online School");
        assert_eq!(c.code, "SCI240");
        assert_eq!(c.description, "A survey of ocean ecosystems and the life within them.");
        assert_eq!(c.subject, "");
        assert!(c.prerequisites.is_empty());
    }

    #[test]
    fn description_falls_back_to_meta() {
        let v = PageView::parse(
            r#"<html><head><meta name="description" content="Meta description text"></head>
               <body><h1>X</h1><p>A paragraph that is definitely longer than forty characters.</p></body></html>"#,
        );
        assert_eq!(extract(&v, URL).description, "Meta description text");
    }

    #[test]
    fn description_falls_back_to_paragraph() {
        let para = "p".repeat(45);
        let html = format!(
            r#"<html><head><meta name="description" content="short"></head>
               <body><p>tiny</p><p>{}</p></body></html>"#,
            para
        );
        assert_eq!(extract(&PageView::parse(&html), URL).description, para);
    }

    #[test]
    fn empty_document_yields_empty_fields() {
        let c = extract(&PageView::parse(""), URL);
        assert_eq!(c.name, "");
        assert_eq!(c.code, "");
        assert_eq!(c.description, "");
        assert_eq!(c.slug, "course");
    }
}
