use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::SessionError;

/// Saved browser session state: cookies plus per-origin storage. Only the
/// cookies matter to a backend that does not run scripts.
#[derive(Debug, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn root_path() -> String {
    "/".to_string()
}

impl StorageState {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Cookie jar pre-filled with every session cookie.
    pub fn into_jar(self) -> Result<Arc<Jar>, SessionError> {
        let jar = Jar::default();
        for cookie in &self.cookies {
            let (header, origin) = cookie.to_set_cookie()?;
            jar.add_cookie_str(&header, &origin);
        }
        info!(
            "Loaded {} session cookies ({} origins with storage ignored)",
            self.cookies.len(),
            self.origins.len()
        );
        Ok(Arc::new(jar))
    }
}

impl SessionCookie {
    /// `Set-Cookie` header and the URL it would have been received from.
    fn to_set_cookie(&self) -> Result<(String, Url), SessionError> {
        let host = self.domain.trim_start_matches('.');
        let scheme = if self.secure { "https" } else { "http" };
        let origin = Url::parse(&format!("{}://{}{}", scheme, host, self.path))
            .map_err(|_| SessionError::Cookie {
                name: self.name.clone(),
            })?;

        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.domain.starts_with('.') {
            header.push_str(&format!("; Domain={}", host));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        debug!("Session cookie {} for {}", self.name, origin);
        Ok((header, origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    const STATE: &str = r#"{
        "cookies": [
            {"name": "SSESS1", "value": "abc", "domain": ".catalog.example.org",
             "path": "/", "expires": -1, "httpOnly": true, "secure": true, "sameSite": "Lax"},
            {"name": "pref", "value": "dark", "domain": "catalog.example.org", "path": "/courses"}
        ],
        "origins": [{"origin": "https://catalog.example.org", "localStorage": []}]
    }"#;

    #[test]
    fn parses_storage_state() {
        let state = StorageState::parse(STATE).unwrap();
        assert_eq!(state.cookies.len(), 2);
        assert!(state.cookies[0].http_only);
        assert_eq!(state.cookies[1].path, "/courses");
        assert_eq!(state.origins.len(), 1);
    }

    #[test]
    fn cookies_are_sent_to_matching_urls() {
        let jar = StorageState::parse(STATE).unwrap().into_jar().unwrap();
        let url = Url::parse("https://catalog.example.org/courses/cs101").unwrap();
        let header = jar.cookies(&url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("SSESS1=abc"));
        assert!(header.contains("pref=dark"));

        let other = Url::parse("https://elsewhere.example.com/").unwrap();
        assert!(jar.cookies(&other).is_none());
    }

    #[test]
    fn malformed_state_is_an_error() {
        assert!(matches!(
            StorageState::parse("{not json"),
            Err(SessionError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StorageState::load(&dir.path().join("state.json")),
            Err(SessionError::Read { .. })
        ));
    }
}
