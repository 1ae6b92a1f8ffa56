use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::LinkSourceError;

/// Read a locator list: one per line, trimmed, blanks dropped, first
/// occurrence wins.
pub fn load_links(path: &Path) -> Result<Vec<String>, LinkSourceError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LinkSourceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let links = dedup_lines(&raw);
    info!("Loaded {} unique locators from {}", links.len(), path.display());
    Ok(links)
}

pub fn dedup_lines(raw: &str) -> Vec<String> {
    dedup(raw.lines().map(str::trim).filter(|l| !l.is_empty()))
}

/// Order-preserving de-duplication.
pub fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let item = item.as_ref();
            seen.insert(item.to_string()).then(|| item.to_string())
        })
        .collect()
}
