//! Lifecycle wrapper owning at most one [`ChangeSession`]
//!
//! # Locking Order
//!
//! The service lock only guards which session is current. It is held to
//! copy out or swap the `Arc<ChangeSession>` and released before any call
//! into the session, since a session may block on its own lock or on disk
//! reads. Never call into a session while holding the service lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::MonitorConfig;
use crate::error::Result;

use super::session::ChangeSession;

/// Owns the current change session and proxies queries to it
pub struct MonitoringService {
    config: MonitorConfig,
    /// LOCKING ORDER: never held while calling into the session
    current: Mutex<Option<Arc<ChangeSession>>>,
}

impl MonitoringService {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Replace any current session with a fresh one watching `directory`.
    ///
    /// The previous session is shut down first. If the new watcher cannot be
    /// started the error is returned and no session is left active.
    pub fn start_monitoring(&self, directory: impl AsRef<Path>) -> Result<()> {
        let directory = directory.as_ref();

        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            shutdown(previous);
        }

        let session = Arc::new(ChangeSession::start(directory, &self.config)?);

        // A concurrent start may have installed its own session meanwhile
        let replaced = self.current.lock().replace(session);
        if let Some(replaced) = replaced {
            shutdown(replaced);
        }

        tracing::info!("[MONITOR] Started monitoring {}", directory.display());
        Ok(())
    }

    /// Shut down the current session, if any
    pub fn stop_monitoring(&self) {
        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            tracing::info!("[MONITOR] Stopped monitoring {}", previous.root().display());
            shutdown(previous);
        }
    }

    /// Forward the known file set to the current session.
    ///
    /// Silently does nothing without a session; assessment already answers
    /// `true` in that case.
    pub fn set_known_file_paths<I, P>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        match self.session() {
            Some(session) => session.set_known_file_paths(paths),
            None => Ok(()),
        }
    }

    /// Forward an expected change to the current session, if any
    pub fn register_expected_change(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        if let Some(session) = self.session() {
            session.register_expected_change(path, content);
        }
    }

    /// `true` when no session is active, otherwise the session's verdict
    pub fn assess_if_reload_necessary(&self) -> bool {
        match self.session() {
            Some(session) => session.assess_if_reload_necessary(),
            None => true,
        }
    }

    /// Change events observed by the current session (0 without one)
    pub fn change_count(&self) -> usize {
        self.session().map_or(0, |session| session.change_count())
    }

    pub fn is_monitoring(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Root of the current session
    pub fn current_root(&self) -> Option<PathBuf> {
        self.session().map(|session| session.root().to_path_buf())
    }

    fn session(&self) -> Option<Arc<ChangeSession>> {
        self.current.lock().clone()
    }
}

impl Default for MonitoringService {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl Drop for MonitoringService {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

fn shutdown(session: Arc<ChangeSession>) {
    session.disable();
    session.dispose();
}
