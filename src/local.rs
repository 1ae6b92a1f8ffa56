use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use crate::parser::{self, Flavor};
use crate::record::Course;
use crate::store::write_json_atomic;

/// Expand glob patterns (or plain paths) into a sorted, de-duplicated file
/// list.
pub fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let mut matched = false;
        match glob::glob(pattern) {
            Ok(paths) => {
                for entry in paths {
                    match entry {
                        Ok(path) if path.is_file() => {
                            files.insert(path);
                            matched = true;
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Cannot read {}: {}", e.path().display(), e.error()),
                    }
                }
            }
            Err(e) => warn!("Bad pattern {:?}: {}", pattern, e),
        }
        // Names with glob metacharacters, e.g. "Course [2024].html"
        if !matched && Path::new(pattern).is_file() {
            files.insert(PathBuf::from(pattern));
        }
    }
    files.into_iter().collect()
}

/// Parse each saved page in turn. Unreadable files are reported and
/// skipped; every readable file yields a record, however sparse.
pub fn extract_files(files: &[PathBuf]) -> Result<Vec<Course>> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut courses = Vec::with_capacity(files.len());
    for path in files {
        match extract_file(path) {
            Ok(course) => {
                info!("Parsed {} -> {}", path.display(), course.slug);
                courses.push(course);
            }
            Err(e) => warn!("Failed {}: {:#}", path.display(), e),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(courses)
}

pub fn extract_file(path: &Path) -> Result<Course> {
    let bytes = std::fs::read(path)?;
    let markup = String::from_utf8_lossy(&bytes);
    let mut course = parser::extract_course(&markup, &file_url(path), Flavor::Saved);
    course.source_file = Some(path.display().to_string());
    Ok(course)
}

/// `file://` URL of the absolute path, or the path as given when it cannot
/// be made absolute.
fn file_url(path: &Path) -> String {
    std::path::absolute(path)
        .ok()
        .and_then(|abs| Url::from_file_path(abs).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("file://{}", path.display()))
}

/// Resolve, extract and write one aggregate document. Returns the record
/// count.
pub fn run_local(patterns: &[String], output: &Path) -> Result<usize> {
    let files = resolve_inputs(patterns);
    info!("Parsing {} saved pages", files.len());
    let courses = extract_files(&files)?;
    write_json_atomic(output, &courses)?;
    info!("Wrote {}", output.display());
    Ok(courses.len())
}
