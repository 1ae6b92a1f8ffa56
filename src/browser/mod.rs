//! Rendering capability the fetch pipeline depends on.
//!
//! The pipeline only needs to open a page, keep heavy sub-resources from
//! loading, navigate, wait briefly for content, and read the resulting
//! markup. Backends implement [`Browser`] and [`Page`].

pub mod http;
pub mod session;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PageError;

pub use http::{HttpBrowser, HttpOptions};

/// Markers whose presence means the course content has rendered.
pub const CONTENT_MARKERS: &[&str] = &["h1", "article", ".article__title"];

/// Kind of request a page issues while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Document,
    Script,
    Xhr,
    Fetch,
    Image,
    Font,
    Stylesheet,
    Media,
    Other,
}

/// Which sub-requests to abort while a page loads.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    blocked: HashSet<ResourceKind>,
}

impl ResourceFilter {
    pub fn blocking(kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        Self {
            blocked: kinds.into_iter().collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self::blocking([])
    }

    pub fn allows(&self, kind: ResourceKind) -> bool {
        !self.blocked.contains(&kind)
    }
}

impl Default for ResourceFilter {
    /// Images, fonts, styles and media only slow the render down.
    fn default() -> Self {
        Self::blocking([
            ResourceKind::Image,
            ResourceKind::Font,
            ResourceKind::Stylesheet,
            ResourceKind::Media,
        ])
    }
}

/// A browsing context shared by all tasks.
#[async_trait]
pub trait Browser: Send + Sync + 'static {
    type Page: Page;

    /// Open a fresh page owned by one task.
    async fn new_page(&self) -> Result<Self::Page, PageError>;
}

#[async_trait]
pub trait Page: Send + Sync + 'static {
    /// Install a request filter for subsequent navigations.
    async fn block_resources(&mut self, filter: &ResourceFilter) -> Result<(), PageError>;

    async fn navigate(&mut self, locator: &str, timeout: Duration) -> Result<(), PageError>;

    /// Wait until any marker matches; `false` once `timeout` passes.
    /// Backends whose document cannot change may answer immediately.
    async fn wait_for_any(&mut self, selectors: &[&str], timeout: Duration) -> bool;

    /// Current document markup.
    async fn content(&self) -> Result<String, PageError>;

    async fn close(self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_blocks_heavy_resources() {
        let f = ResourceFilter::default();
        for kind in [
            ResourceKind::Image,
            ResourceKind::Font,
            ResourceKind::Stylesheet,
            ResourceKind::Media,
        ] {
            assert!(!f.allows(kind), "{kind:?} should be blocked");
        }
        for kind in [
            ResourceKind::Document,
            ResourceKind::Script,
            ResourceKind::Xhr,
            ResourceKind::Fetch,
        ] {
            assert!(f.allows(kind), "{kind:?} should load");
        }
    }

    #[test]
    fn allow_all_blocks_nothing() {
        assert!(ResourceFilter::allow_all().allows(ResourceKind::Image));
    }
}
