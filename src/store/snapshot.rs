use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::log::read_records;

/// Regenerates the combined JSON document from the durable log.
///
/// One lock guards both the completion counter and the rebuild itself, so
/// rebuilds never overlap and the counter never skips.
pub struct SnapshotRebuilder {
    log: PathBuf,
    target: PathBuf,
    flush_every: usize,
    completed: Mutex<u64>,
}

impl SnapshotRebuilder {
    pub fn new(log: impl Into<PathBuf>, target: impl Into<PathBuf>, flush_every: usize) -> Self {
        Self {
            log: log.into(),
            target: target.into(),
            flush_every,
            completed: Mutex::new(0),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Count one finished task and rebuild if the flush interval says so.
    /// Returns whether a rebuild succeeded.
    pub async fn task_completed(&self) -> bool {
        let mut completed = self.completed.lock().await;
        *completed += 1;
        if !is_due(*completed, self.flush_every) {
            return false;
        }
        self.rebuild_locked().await
    }

    /// Unconditional rebuild, e.g. once every task has finished.
    pub async fn rebuild(&self) -> bool {
        let _guard = self.completed.lock().await;
        self.rebuild_locked().await
    }

    async fn rebuild_locked(&self) -> bool {
        let log = self.log.clone();
        let target = self.target.clone();
        match tokio::task::spawn_blocking(move || rebuild_snapshot(&log, &target)).await {
            Ok(Ok(count)) => {
                debug!("Snapshot {} rebuilt with {} records", self.target.display(), count);
                true
            }
            Ok(Err(e)) => {
                warn!("Failed to update combined JSON: {:#}", e);
                false
            }
            Err(e) => {
                warn!("Snapshot rebuild task failed: {}", e);
                false
            }
        }
    }
}

fn is_due(completed: u64, flush_every: usize) -> bool {
    flush_every <= 1 || completed % flush_every as u64 == 0
}

/// Parse the whole log and atomically replace `target` with it as one
/// pretty-printed array. Returns the number of records written.
pub fn rebuild_snapshot(log: &Path, target: &Path) -> Result<usize> {
    let records =
        read_records(log).with_context(|| format!("Failed to read log {}", log.display()))?;
    write_json_atomic(target, &records)?;
    Ok(records.len())
}

/// Write pretty JSON to a sibling temp file, then rename over `target`.
pub fn write_json_atomic<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut tmp_name = target.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = target.with_file_name(tmp_name);

    let file =
        File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    fs::rename(&tmp, target)
        .with_context(|| format!("Failed to replace {}", target.display()))?;
    Ok(())
}
