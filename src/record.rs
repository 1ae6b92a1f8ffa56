use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Slug source used when neither a code nor a name was found.
const SLUG_FALLBACK: &str = "course";

/// One line of the durable log.
///
/// The error stub is listed first so that `{"source_url", "error"}` lines
/// never deserialize as an empty course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Failed { source_url: String, error: bool },
    Course(Course),
}

impl Record {
    /// Completion marker for a locator whose fetch or extraction failed.
    pub fn failed(source_url: impl Into<String>) -> Self {
        Record::Failed {
            source_url: source_url.into(),
            error: true,
        }
    }

    pub fn source_url(&self) -> &str {
        match self {
            Record::Failed { source_url, .. } => source_url,
            Record::Course(c) => &c.source_url,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Record::Failed { .. })
    }
}

impl From<Course> for Record {
    fn from(course: Course) -> Self {
        Record::Course(course)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub source_url: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub slug: String,
    /// Provenance of records built from saved files.
    #[serde(
        rename = "_source_file",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_file: Option<String>,
}

/// Derive a URL-safe identifier from the course code, else the name.
pub fn slug(code: &str, name: &str) -> String {
    let source = [code.trim(), name.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(SLUG_FALLBACK)
        .to_lowercase();
    NON_ALNUM_RE
        .replace_all(&source, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_prefers_code() {
        assert_eq!(slug("CS101", "Intro to Computing"), "cs101");
    }

    #[test]
    fn slug_falls_back_to_name() {
        assert_eq!(slug("", "AP U.S. History!"), "ap-u-s-history");
        assert_eq!(slug("   ", "Biology"), "biology");
    }

    #[test]
    fn slug_literal_fallback() {
        assert_eq!(slug("", ""), "course");
    }

    #[test]
    fn slug_is_deterministic() {
        let a = slug("ENG-201 (H)", "x");
        let b = slug("ENG-201 (H)", "x");
        assert_eq!(a, b);
        assert_eq!(a, "eng-201-h");
    }

    #[test]
    fn error_stub_shape() {
        let json = serde_json::to_string(&Record::failed("https://x/y")).unwrap();
        assert_eq!(json, r#"{"source_url":"https://x/y","error":true}"#);
    }

    #[test]
    fn course_line_keeps_all_fields() {
        let course = Course {
            source_url: "https://x/c".into(),
            code: "MA100".into(),
            slug: "ma100".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(Record::from(course)).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "source_url",
            "code",
            "name",
            "description",
            "subject",
            "level",
            "semester",
            "prerequisites",
            "slug",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(!obj.contains_key("error"));
        assert!(!obj.contains_key("_source_file"));
    }

    #[test]
    fn lines_parse_back_to_the_right_variant() {
        let stub: Record =
            serde_json::from_str(r#"{"source_url":"u","error":true}"#).unwrap();
        assert!(stub.is_error());

        let course: Record = serde_json::from_str(
            r#"{"source_url":"u","code":"A1","name":"N","description":"","subject":"",
                "level":"","semester":"","prerequisites":["B2"],"slug":"a1"}"#,
        )
        .unwrap();
        assert!(!course.is_error());
        assert_eq!(course.source_url(), "u");
    }
}
