//! Scratch workspace builder for monitoring tests

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use workspace_monitor::MonitoringService;

/// How long to wait for the OS watcher before failing a test
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Temporary workspace root for exercising a real watcher
pub struct TestRepo {
    _dir: TempDir,
    root: PathBuf,
}

impl TestRepo {
    /// Create a new empty workspace
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        // Watchers report canonical paths (e.g. /private/var on macOS)
        let root = dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");
        Self { _dir: dir, root }
    }

    /// Get the path to the workspace root
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a file relative to the root
    pub fn file(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Write a file, creating parent directories
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.file(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    pub fn remove_file(&self, relative_path: &str) -> &Self {
        fs::remove_file(self.file(relative_path)).expect("Failed to remove file");
        self
    }

    pub fn remove_dir(&self, relative_path: &str) -> &Self {
        fs::remove_dir_all(self.file(relative_path)).expect("Failed to remove dir");
        self
    }

    pub fn rename(&self, from: &str, to: &str) -> &Self {
        fs::rename(self.file(from), self.file(to)).expect("Failed to rename");
        self
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Block until the service has observed more than `baseline` change events.
///
/// Returns false if the watcher stays silent for `WATCH_TIMEOUT`.
pub fn wait_for_changes(service: &MonitoringService, baseline: usize) -> bool {
    let deadline = Instant::now() + WATCH_TIMEOUT;
    while Instant::now() < deadline {
        if service.change_count() > baseline {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
