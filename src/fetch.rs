use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{Browser, HttpBrowser, Page, ResourceFilter};
use crate::config::Settings;
use crate::error::PageError;
use crate::links;
use crate::parser::{self, Flavor};
use crate::record::Record;
use crate::store::{DurableLog, SnapshotRebuilder};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Most tasks allowed past the admission gate at once.
    pub concurrency: usize,
    /// Pause between scheduling consecutive tasks.
    pub delay: Duration,
    pub nav_timeout: Duration,
    /// How long to wait for a content marker before extracting anyway.
    pub wait_timeout: Duration,
    pub markers: Vec<String>,
    pub flush_every: usize,
    pub log_path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
}

/// Run stats returned after completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Everything a task needs, shared read-only across all tasks.
struct TaskContext<B: Browser> {
    browser: Arc<B>,
    filter: ResourceFilter,
    log: DurableLog,
    snapshot: Option<SnapshotRebuilder>,
    nav_timeout: Duration,
    wait_timeout: Duration,
    markers: Vec<String>,
}

/// Load the link list, open the HTTP browsing context and fetch every
/// locator. Only those two setup steps can fail the run.
pub async fn run_live(settings: &Settings) -> Result<RunStats> {
    let locators = links::load_links(&settings.links_path)?;
    info!(
        "Will scrape {} URLs from {}",
        locators.len(),
        settings.links_path.display()
    );
    let browser = HttpBrowser::launch(&settings.http_options())
        .context("Failed to open browsing context")?;
    fetch_all(Arc::new(browser), locators, &settings.fetch_config()).await
}

/// Fetch each locator in its own task, appending exactly one record per
/// locator to the durable log.
pub async fn fetch_all<B: Browser>(
    browser: Arc<B>,
    locators: Vec<String>,
    config: &FetchConfig,
) -> Result<RunStats> {
    let total = locators.len();
    let gate = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let ctx = Arc::new(TaskContext {
        browser,
        filter: ResourceFilter::default(),
        log: DurableLog::new(&config.log_path),
        snapshot: config
            .snapshot_path
            .as_ref()
            .map(|target| SnapshotRebuilder::new(&config.log_path, target, config.flush_every)),
        nav_timeout: config.nav_timeout,
        wait_timeout: config.wait_timeout,
        markers: config.markers.clone(),
    });

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut tasks: Vec<(String, JoinHandle<Record>)> = Vec::with_capacity(total);
    for (i, locator) in locators.into_iter().enumerate() {
        if i > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        let ctx = Arc::clone(&ctx);
        let gate = Arc::clone(&gate);
        let pb = pb.clone();
        let task_locator = locator.clone();
        let handle = tokio::spawn(async move {
            let record = ctx.process(&gate, task_locator).await;
            pb.inc(1);
            record
        });
        tasks.push((locator, handle));
    }

    let mut stats = RunStats {
        total,
        ..Default::default()
    };
    for (locator, handle) in tasks {
        match handle.await {
            Ok(record) if record.is_error() => stats.errors += 1,
            Ok(_) => stats.ok += 1,
            Err(e) => {
                // The task died before it could log anything.
                warn!("Task for {} aborted: {}", locator, e);
                stats.errors += 1;
                ctx.persist(&Record::failed(&locator)).await;
                pb.inc(1);
            }
        }
    }
    pb.finish_and_clear();

    if let Some(snapshot) = &ctx.snapshot {
        if snapshot.rebuild().await {
            info!("Wrote {}", snapshot.target().display());
        }
    }
    info!(
        "Scraped {} pages ({} ok, {} errors)",
        stats.total, stats.ok, stats.errors
    );
    Ok(stats)
}

impl<B: Browser> TaskContext<B> {
    async fn process(&self, gate: &Semaphore, locator: String) -> Record {
        // The gate is never closed, so this only ever waits.
        let _permit = gate.acquire().await;

        info!("Visiting {}", locator);
        let record = match self.render(&locator).await {
            Ok(markup) => extract_isolated(&markup, &locator),
            Err(e) => {
                warn!("Error fetching {}: {}", locator, e);
                Record::failed(&locator)
            }
        };
        self.persist(&record).await;
        record
    }

    /// Open a page, load the locator and hand back its markup. The page is
    /// closed whatever happens.
    async fn render(&self, locator: &str) -> Result<String, PageError> {
        let mut page = self.browser.new_page().await?;
        if let Err(e) = page.block_resources(&self.filter).await {
            warn!("Loading {} unfiltered: {}", locator, e);
        }
        let result = AssertUnwindSafe(self.load(&mut page, locator))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(PageError::Crashed {
                    locator: locator.to_string(),
                })
            });
        page.close().await;
        result
    }

    async fn load(&self, page: &mut B::Page, locator: &str) -> Result<String, PageError> {
        page.navigate(locator, self.nav_timeout).await?;
        let markers: Vec<&str> = self.markers.iter().map(String::as_str).collect();
        if !page.wait_for_any(&markers, self.wait_timeout).await {
            debug!("No content marker on {}, extracting anyway", locator);
        }
        page.content().await
    }

    async fn persist(&self, record: &Record) {
        if let Err(e) = self.log.append(record).await {
            warn!("Failed to write result for {}: {:#}", record.source_url(), e);
        }
        if let Some(snapshot) = &self.snapshot {
            snapshot.task_completed().await;
        }
    }
}

fn extract_isolated(markup: &str, locator: &str) -> Record {
    match catch_unwind(AssertUnwindSafe(|| {
        parser::extract_course(markup, locator, Flavor::Live)
    })) {
        Ok(course) => course.into(),
        Err(_) => {
            warn!("Extraction failed for {}", locator);
            Record::failed(locator)
        }
    }
}
