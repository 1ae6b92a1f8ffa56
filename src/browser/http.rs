use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use tracing::{debug, warn};
use url::Url;

use super::session::StorageState;
use super::{Browser, Page, ResourceFilter, ResourceKind};
use crate::error::PageError;
use crate::parser::PageView;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    /// Saved session to authenticate with; ignored when unusable.
    pub storage_state: Option<PathBuf>,
}

/// Browsing context backed by plain HTTP document requests. Pages are not
/// scripted, so the markup read back is what the server sent.
pub struct HttpBrowser {
    client: reqwest::Client,
    authenticated: bool,
}

impl HttpBrowser {
    pub fn launch(options: &HttpOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut builder = reqwest::Client::builder()
            .user_agent(&options.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        let mut authenticated = false;
        if let Some(path) = &options.storage_state {
            match StorageState::load(path).and_then(StorageState::into_jar) {
                Ok(jar) => {
                    builder = builder.cookie_provider(jar);
                    authenticated = true;
                }
                Err(e) => warn!(
                    "Session state {} unusable, continuing unauthenticated: {}",
                    path.display(),
                    e
                ),
            }
        }
        if !authenticated {
            builder = builder.cookie_store(true);
        }

        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            authenticated,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    type Page = HttpPage;

    async fn new_page(&self) -> Result<HttpPage, PageError> {
        Ok(HttpPage {
            client: self.client.clone(),
            filter: ResourceFilter::allow_all(),
            document: None,
        })
    }
}

pub struct HttpPage {
    client: reqwest::Client,
    filter: ResourceFilter,
    document: Option<String>,
}

enum Target {
    Remote(Url),
    File(PathBuf),
}

impl HttpPage {
    fn request_allowed(&self, kind: ResourceKind, locator: &str) -> bool {
        let allowed = self.filter.allows(kind);
        if !allowed {
            debug!("Aborted {:?} request for {}", kind, locator);
        }
        allowed
    }

    async fn load(&self, target: Target, locator: &str) -> Result<String, PageError> {
        match target {
            Target::File(path) => Ok(read_lossy(&path).await?),
            Target::Remote(url) => {
                let nav_err = |source| PageError::Navigation {
                    locator: locator.to_string(),
                    source,
                };
                let response = self.client.get(url).send().await.map_err(nav_err)?;
                let status = response.status();
                if !status.is_success() {
                    // A browser still renders error pages; so do we.
                    warn!("HTTP {} for {}", status, locator);
                }
                response.text().await.map_err(nav_err)
            }
        }
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn block_resources(&mut self, filter: &ResourceFilter) -> Result<(), PageError> {
        if !filter.allows(ResourceKind::Document) {
            return Err(PageError::Filter(
                "refusing a filter that blocks documents".into(),
            ));
        }
        self.filter = filter.clone();
        Ok(())
    }

    async fn navigate(&mut self, locator: &str, timeout: Duration) -> Result<(), PageError> {
        let target = resolve(locator)?;
        self.document = None;
        if !self.request_allowed(ResourceKind::Document, locator) {
            return Err(PageError::Filter(format!("document request blocked: {}", locator)));
        }

        let body = tokio::time::timeout(timeout, self.load(target, locator))
            .await
            .map_err(|_| PageError::Timeout {
                locator: locator.to_string(),
                timeout,
            })??;
        self.document = Some(body);
        Ok(())
    }

    /// The fetched document never changes, so one check answers for the
    /// whole timeout.
    async fn wait_for_any(&mut self, selectors: &[&str], _timeout: Duration) -> bool {
        let found = self
            .document
            .as_deref()
            .is_some_and(|markup| PageView::parse(markup).matches_any(selectors));
        if !found {
            debug!("No content marker among {:?}", selectors);
        }
        found
    }

    async fn content(&self) -> Result<String, PageError> {
        self.document.clone().ok_or(PageError::NoDocument)
    }

    async fn close(self) {}
}

/// `http(s)://` and `file://` URLs, or a bare filesystem path.
fn resolve(locator: &str) -> Result<Target, PageError> {
    match Url::parse(locator) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Target::Remote(url)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Target::File)
            .map_err(|_| PageError::Locator(locator.to_string())),
        Ok(url) if url.scheme().len() > 1 => Err(PageError::Locator(locator.to_string())),
        // Relative paths and Windows drive letters ("C:\...") land here.
        _ => Ok(Target::File(PathBuf::from(locator))),
    }
}

pub async fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
