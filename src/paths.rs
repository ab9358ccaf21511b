//! Path identity and the ignored-directory filter
//!
//! Paths reported by the OS watcher and paths handed in by the owner are
//! compared through [`PathKey`], so the case policy of the host filesystem
//! is applied in exactly one place.

use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

/// Separators recognised when splitting paths on this platform
#[cfg(windows)]
pub const PLATFORM_SEPARATORS: &[char] = &['\\', '/'];
#[cfg(not(windows))]
pub const PLATFORM_SEPARATORS: &[char] = &['/'];

/// How two paths are compared for equality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    CaseSensitive,
    CaseInsensitive,
}

impl PathPolicy {
    /// Case-insensitive where the default filesystem is (Windows, macOS)
    pub fn platform_default() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::CaseInsensitive
        } else {
            Self::CaseSensitive
        }
    }

    /// Build the comparison key for `path` under this policy
    pub fn key(self, path: &Path) -> PathKey {
        let raw = path.to_string_lossy();
        #[cfg(windows)]
        let raw = raw.replace('/', "\\");
        let text = match self {
            Self::CaseSensitive => raw.to_string(),
            Self::CaseInsensitive => raw.to_lowercase(),
        };
        PathKey(text)
    }
}

/// Normalized path used as a set/map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` lies strictly below `ancestor`, split on a separator boundary.
    ///
    /// `/repo/bar/a.txt` is nested under `/repo/bar` but not under `/repo/ba`.
    pub fn is_nested_under(&self, ancestor: &PathKey) -> bool {
        let ancestor = ancestor.0.trim_end_matches(PLATFORM_SEPARATORS);
        match self.0.strip_prefix(ancestor) {
            Some(rest) => rest.starts_with(PLATFORM_SEPARATORS) && rest.len() > 1,
            None => false,
        }
    }
}

/// Returns true if `candidate`, taken relative to `root`, has a segment that
/// case-insensitively equals one of `ignored_names`.
///
/// The root prefix itself is never inspected, so a root living under e.g.
/// `/usr/bin` does not ignore everything below it. A candidate outside the
/// root is inspected in full.
pub fn is_ignored_path(
    root: &str,
    candidate: &str,
    separators: &[char],
    ignored_names: &[impl AsRef<str>],
) -> bool {
    let relative = strip_root(root, candidate, separators).unwrap_or(candidate);

    relative
        .split(separators)
        .filter(|segment| !segment.is_empty())
        .any(|segment| {
            ignored_names
                .iter()
                .any(|name| segment.eq_ignore_ascii_case(name.as_ref()))
        })
}

/// Strip `root` from the front of `candidate`, matching case-insensitively
/// and only on a separator boundary.
fn strip_root<'a>(root: &str, candidate: &'a str, separators: &[char]) -> Option<&'a str> {
    let root = root.trim_end_matches(separators);
    let head = candidate.get(..root.len())?;
    if !head.eq_ignore_ascii_case(root) {
        return None;
    }
    let rest = &candidate[root.len()..];
    if rest.is_empty() || rest.starts_with(separators) {
        Some(rest)
    } else {
        None
    }
}

/// Ignore filter bound to a configured list of directory names
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    names: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Check a watcher path against the filter using the platform separators
    pub fn is_ignored(&self, root: &Path, candidate: &Path) -> bool {
        is_ignored_path(
            &root.to_string_lossy(),
            &candidate.to_string_lossy(),
            PLATFORM_SEPARATORS,
            &self.names,
        )
    }

    /// Check a single directory entry name (used when walking a tree)
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| name.eq_ignore_ascii_case(n))
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_IGNORED_DIRS)
    }
}

/// Resolve a monitoring root to an absolute, existing directory.
///
/// Relative paths are joined with the current working directory.
pub fn resolve_root(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if !absolute.is_dir() {
        return Err(MonitorError::DirectoryNotFound {
            path: absolute.display().to_string(),
        });
    }
    Ok(absolute)
}
