use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::browser::{HttpOptions, CONTENT_MARKERS};
use crate::fetch::FetchConfig;

pub const ENV_PREFIX: &str = "COURSES";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Run settings: built-in defaults, then an optional TOML file, then
/// `COURSES_*` environment variables. CLI flags are applied on top by the
/// caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub links_path: PathBuf,
    pub log_path: PathBuf,
    /// Empty disables the combined snapshot.
    pub snapshot_path: Option<PathBuf>,
    pub concurrency: usize,
    pub delay_ms: u64,
    pub timeout_ms: u64,
    pub wait_ms: u64,
    pub flush_every: usize,
    pub storage_state: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            links_path: "links.txt".into(),
            log_path: "live_courses.jsonl".into(),
            snapshot_path: Some("live_courses.json".into()),
            concurrency: 2,
            delay_ms: 500,
            timeout_ms: 30_000,
            wait_ms: 3_000,
            flush_every: 1,
            storage_state: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with(file, Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load_with(file: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings.normalized())
    }

    fn normalized(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.snapshot_path = self.snapshot_path.filter(|p| !p.as_os_str().is_empty());
        self.storage_state = self.storage_state.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            concurrency: self.concurrency.max(1),
            delay: Duration::from_millis(self.delay_ms),
            nav_timeout: Duration::from_millis(self.timeout_ms),
            wait_timeout: Duration::from_millis(self.wait_ms),
            markers: CONTENT_MARKERS.iter().map(|s| s.to_string()).collect(),
            flush_every: self.flush_every,
            log_path: self.log_path.clone(),
            snapshot_path: self.snapshot_path.clone(),
        }
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            user_agent: self.user_agent.clone(),
            storage_state: self.storage_state.clone(),
        }
    }
}
