use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::record::Record;

/// Append-only JSON-lines file holding one record per finished locator.
#[derive(Debug, Clone)]
pub struct DurableLog {
    path: PathBuf,
}

impl DurableLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single complete line.
    pub async fn append(&self, record: &Record) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to serialize record")?;
        line.push('\n');
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .context("Log writer task panicked")?
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }
}

/// One `write_all` on an O_APPEND handle, so concurrent appends never
/// interleave within a line.
fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

/// Every parseable record in the log, in file order. A missing log reads
/// as empty; unparseable lines are skipped.
pub fn read_records(path: &Path) -> io::Result<Vec<Record>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(line) {
            Ok(rec) => records.push(rec),
            Err(e) => warn!("Skipping bad line {} in {}: {}", i + 1, path.display(), e),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Course;

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = DurableLog::new(dir.path().join("nested/out.jsonl"));
        log.append(&Record::failed("a")).await.unwrap();
        log.append(
            &Course {
                source_url: "b".into(),
                name: "Café ✓".into(),
                ..Default::default()
            }
            .into(),
        )
        .await
        .unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
        assert!(raw.contains("Café ✓"));

        let records = read_records(log.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_error());
        assert_eq!(records[1].source_url(), "b");
    }

    #[tokio::test]
    async fn concurrent_appends_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let log = DurableLog::new(dir.path().join("out.jsonl"));
        let mut handles = Vec::new();
        for i in 0..50 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(&Record::failed(format!("https://x/{i}"))).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let records = read_records(log.path()).unwrap();
        assert_eq!(records.len(), 50);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_records(&dir.path().join("none.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn bad_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(
            &path,
            "{\"source_url\":\"a\",\"error\":true}\n{\"source_url\":\n\n[1,2]\n{\"source_url\":\"b\",\"error\":true}\n",
        )
        .unwrap();
        let urls: Vec<_> = read_records(&path)
            .unwrap()
            .iter()
            .map(|r| r.source_url().to_string())
            .collect();
        assert_eq!(urls, vec!["a", "b"]);
    }
}
