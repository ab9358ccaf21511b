//! Error types and exit codes for workspace-monitor

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for workspace-monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// `set_known_file_paths` was called a second time on the same session
    #[error("Known file paths were already assigned for session rooted at {root}")]
    KnownFilesAlreadySet { root: String },

    #[error("Failed to start watcher for {path}: {message}")]
    WatcherStart { path: String, message: String },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Convert error to a process exit code:
    /// - 0: Success
    /// - 1: Directory not found / IO error
    /// - 2: Configuration error (including a repeated known-file assignment)
    /// - 3: Watcher failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::DirectoryNotFound { .. } => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(1),
            Self::Config { .. } => ExitCode::from(2),
            Self::KnownFilesAlreadySet { .. } => ExitCode::from(2),
            Self::WatcherStart { .. } => ExitCode::from(3),
        }
    }

    pub(crate) fn watcher_start(path: &std::path::Path, err: notify::Error) -> Self {
        Self::WatcherStart {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for workspace-monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
