use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a single page-level task. These become error stubs, never
/// run failures.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {locator} failed: {source}")]
    Navigation {
        locator: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("navigation to {locator} timed out after {timeout:?}")]
    Timeout { locator: String, timeout: Duration },
    #[error("unsupported locator: {0}")]
    Locator(String),
    #[error("no document loaded")]
    NoDocument,
    #[error("request filtering unavailable: {0}")]
    Filter(String),
    #[error("page backend panicked while loading {locator}")]
    Crashed { locator: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Problems with the optional authenticated session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot read session state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed session state: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("session cookie {name} has no usable domain")]
    Cookie { name: String },
}

#[derive(Debug, Error)]
pub enum LinkSourceError {
    #[error("cannot read link list {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
