//! Known file enumeration for a workspace root
//!
//! Walks the root with the `ignore` crate and returns every regular file that
//! is not under an ignored directory. Hidden files are included and VCS
//! ignore rules are not applied: the ignore filter is the only exclusion.

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{MonitorError, Result};
use crate::paths::IgnoreFilter;

/// Collect the files under `root` that a session should treat as known
pub fn collect_known_files(root: &Path, filter: &IgnoreFilter) -> Result<Vec<PathBuf>> {
    let entry_filter = filter.clone();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .parents(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .filter_entry(move |entry| {
            entry.depth() == 0 || !entry_filter.is_ignored_name(&entry.file_name().to_string_lossy())
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            MonitorError::Io(io::Error::new(io::ErrorKind::Other, e.to_string()))
        })?;
        if entry.file_type().map_or(false, |t| t.is_file()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(
        "[LOADER] Collected {} known files under {}",
        files.len(),
        root.display()
    );
    Ok(files)
}
