//! workspace-monitor: keeps an in-memory workspace model honest
//!
//! Watches a workspace root, separates the changes the owning process made
//! itself from external ones, and answers one question on demand: must the
//! cached model be reloaded?
//!
//! # Example
//!
//! ```no_run
//! use workspace_monitor::{MonitorConfig, MonitoringService};
//!
//! let service = MonitoringService::new(MonitorConfig::default());
//! service.start_monitoring("/path/to/workspace")?;
//!
//! // ... enumerate the workspace, then hand over what it contains
//! service.set_known_file_paths(["/path/to/workspace/App.csproj"])?;
//!
//! // Writers announce their own edits before making them
//! service.register_expected_change("/path/to/workspace/App.csproj", "<Project />");
//!
//! if service.assess_if_reload_necessary() {
//!     // reload the model, then start a fresh session
//! }
//! # Ok::<(), workspace_monitor::MonitorError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod monitor;
pub mod paths;

pub use cli::Cli;
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use loader::collect_known_files;
pub use monitor::{write_expected, ChangeSession, MonitoringService};
pub use paths::{is_ignored_path, resolve_root, IgnoreFilter, PathKey, PathPolicy};
