//! One watch-and-reconcile episode rooted at a directory
//!
//! A [`ChangeSession`] owns a recursive `notify` watcher and remembers every
//! non-ignored path it reports. The owner then walks through three phases:
//!
//! 1. **Backlog**: before the known file set exists, changes are only recorded.
//! 2. **Reconcile**: [`ChangeSession::set_known_file_paths`] checks the backlog
//!    against the new set and clears it.
//! 3. **Track**: changes to known files are validated against registered
//!    expected content when [`ChangeSession::assess_if_reload_necessary`] runs.
//!
//! # Locking
//!
//! All bookkeeping lives behind a single `parking_lot::Mutex`. Watcher
//! callbacks take it on the notify thread. File reads during assessment
//! happen after the snapshot is taken and the lock is released.
//!
//! Once a reload is required the session disables itself and stays that way.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::paths::{IgnoreFilter, PathKey, PathPolicy};

/// Mutable bookkeeping guarded by the session lock
#[derive(Debug, Default)]
struct SessionState {
    /// Whether incoming watcher events are still applied
    enabled: bool,
    /// Sticky reload verdict, never reset once set
    reload_required: bool,
    /// Assigned exactly once; shared read-only afterwards
    known_files: Option<Arc<HashSet<PathKey>>>,
    /// Non-ignored changed paths in delivery order
    change_log: Vec<PathBuf>,
    /// Old sides of renames seen before the known set was assigned
    renamed_from: Vec<PathBuf>,
    /// Latest content each writer expects to find at a path
    expected_changes: HashMap<PathKey, String>,
}

impl SessionState {
    fn latch_reload(&mut self) {
        self.reload_required = true;
        self.enabled = false;
    }
}

/// State shared between the session handle and the watcher callback
struct SessionShared {
    root: PathBuf,
    policy: PathPolicy,
    filter: IgnoreFilter,
    state: Mutex<SessionState>,
    /// Change events accepted since the session started
    change_count: AtomicUsize,
}

impl SessionShared {
    fn handle_event(&self, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                self.handle_error(&e.to_string());
                return;
            }
        };

        if event.need_rescan() {
            self.handle_error("watcher dropped events and requested a rescan");
            return;
        }

        tracing::debug!(
            "[SESSION] Event kind: {:?}, paths: {:?}",
            event.kind,
            event.paths
        );

        match event.kind {
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
                self.record_changes(&event.paths)
            }
            EventKind::Access(_) => {}
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                self.record_rename(&event.paths[0], Some(event.paths[1].as_path()))
            }
            // Backends that cannot pair rename halves report each side on its own
            EventKind::Modify(ModifyKind::Name(
                RenameMode::From | RenameMode::Any | RenameMode::Other,
            )) => {
                for path in &event.paths {
                    self.record_rename(path, None);
                }
            }
            _ => self.record_changes(&event.paths),
        }
    }

    fn handle_error(&self, message: &str) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        tracing::warn!(
            "[SESSION] Watcher error under {}: {}; reload required",
            self.root.display(),
            message
        );
        state.latch_reload();
    }

    fn record_changes(&self, paths: &[PathBuf]) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        for path in paths {
            self.record_change(&mut state, path);
        }
    }

    fn record_rename(&self, from: &Path, to: Option<&Path>) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }

        let from_ignored = self.filter.is_ignored(&self.root, from);
        let renames_known = match state.known_files.clone() {
            Some(known) => !from_ignored && contains_nested(&known, &self.policy.key(from)),
            None => {
                if !from_ignored {
                    state.renamed_from.push(from.to_path_buf());
                }
                false
            }
        };
        if renames_known {
            tracing::info!(
                "[SESSION] Directory containing known files renamed: {}",
                from.display()
            );
            self.change_count.fetch_add(1, Ordering::SeqCst);
            state.latch_reload();
            return;
        }

        self.record_change(&mut state, from);
        if let Some(to) = to {
            self.record_change(&mut state, to);
        }
    }

    fn record_change(&self, state: &mut SessionState, path: &Path) {
        if self.filter.is_ignored(&self.root, path) {
            tracing::debug!("[SESSION] Filtered out: {:?}", path);
            return;
        }
        self.change_count.fetch_add(1, Ordering::SeqCst);

        // Once the known set is fixed, unknown paths can never matter
        if let Some(known) = &state.known_files {
            if !known.contains(&self.policy.key(path)) {
                return;
            }
        }
        state.change_log.push(path.to_path_buf());
    }
}

/// True if any known path lies below `ancestor`
fn contains_nested(known: &HashSet<PathKey>, ancestor: &PathKey) -> bool {
    known.iter().any(|path| path.is_nested_under(ancestor))
}

/// Why an assessment decided a reload is necessary
#[derive(Debug)]
enum ReloadReason {
    Deleted,
    Unexpected,
    ContentMismatch,
    Unreadable(io::Error),
}

impl fmt::Display for ReloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "known file was deleted"),
            Self::Unexpected => write!(f, "known file changed without a registered expectation"),
            Self::ContentMismatch => write!(f, "content differs from the expected change"),
            Self::Unreadable(e) => write!(f, "could not read file: {}", e),
        }
    }
}

/// A changed known path captured under the lock, checked after it is released
struct PendingCheck {
    path: PathBuf,
    expected: Option<String>,
}

impl PendingCheck {
    fn reload_reason(&self) -> Option<ReloadReason> {
        match self.path.try_exists() {
            Ok(true) => {}
            Ok(false) => return Some(ReloadReason::Deleted),
            Err(e) => return Some(ReloadReason::Unreadable(e)),
        }

        let expected = match &self.expected {
            Some(expected) => expected,
            None => return Some(ReloadReason::Unexpected),
        };

        match std::fs::read_to_string(&self.path) {
            Ok(content) if content == *expected => None,
            Ok(_) => Some(ReloadReason::ContentMismatch),
            Err(e) => Some(ReloadReason::Unreadable(e)),
        }
    }
}

/// Watches one root directory and decides whether the owner must reload
pub struct ChangeSession {
    shared: Arc<SessionShared>,
    /// Released by `dispose`; `None` afterwards
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl ChangeSession {
    /// Start a recursive watch on `root`.
    ///
    /// Fails if `root` is not a directory or the OS watcher cannot be created.
    pub fn start(root: &Path, config: &MonitorConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(MonitorError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }

        let shared = Arc::new(SessionShared {
            root: root.to_path_buf(),
            policy: config.path_policy(),
            filter: IgnoreFilter::new(config.ignored_dirs.iter().cloned()),
            state: Mutex::new(SessionState {
                enabled: true,
                ..SessionState::default()
            }),
            change_count: AtomicUsize::new(0),
        });

        let callback_shared = Arc::clone(&shared);
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| {
                callback_shared.handle_event(result)
            })
            .map_err(|e| MonitorError::watcher_start(root, e))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| MonitorError::watcher_start(root, e))?;

        tracing::info!("[SESSION] Watching {}", root.display());

        Ok(Self {
            shared,
            watcher: Mutex::new(Some(watcher)),
        })
    }

    /// Root directory being watched
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    /// Whether watcher events are still applied
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    /// Whether a reload verdict has already been latched
    pub fn is_reload_required(&self) -> bool {
        self.shared.state.lock().reload_required
    }

    /// Whether the known file set has been assigned
    pub fn has_known_files(&self) -> bool {
        self.shared.state.lock().known_files.is_some()
    }

    /// Number of change events accepted so far
    pub fn change_count(&self) -> usize {
        self.shared.change_count.load(Ordering::SeqCst)
    }

    /// Assign the definitive known file set and reconcile the backlog.
    ///
    /// A backlog entry that is in the new set, or a backlog rename whose old
    /// path held known files, latches the reload verdict. The backlog is
    /// cleared either way. A second call on the same session is a
    /// caller error and leaves the first set in place.
    pub fn set_known_file_paths<I, P>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let policy = self.shared.policy;
        let known: HashSet<PathKey> = paths
            .into_iter()
            .map(|path| policy.key(path.as_ref()))
            .collect();

        let mut state = self.shared.state.lock();
        if state.known_files.is_some() {
            return Err(MonitorError::KnownFilesAlreadySet {
                root: self.shared.root.display().to_string(),
            });
        }

        let backlog = std::mem::take(&mut state.change_log);
        let renamed_from = std::mem::take(&mut state.renamed_from);
        if let Some(path) = backlog.iter().find(|path| known.contains(&policy.key(path))) {
            tracing::info!(
                "[SESSION] Known file changed before the known set was assigned: {}",
                path.display()
            );
            state.latch_reload();
        } else if let Some(path) = renamed_from
            .iter()
            .find(|path| contains_nested(&known, &policy.key(path)))
        {
            tracing::info!(
                "[SESSION] Directory containing known files renamed before the known set was assigned: {}",
                path.display()
            );
            state.latch_reload();
        }

        tracing::info!(
            "[SESSION] Known set assigned: {} files, {} backlog entries reconciled",
            known.len(),
            backlog.len()
        );
        state.known_files = Some(Arc::new(known));
        Ok(())
    }

    /// Record the content a writer expects `path` to hold after its own write.
    ///
    /// Later registrations for the same path replace earlier ones.
    pub fn register_expected_change(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let key = self.shared.policy.key(path.as_ref());
        self.shared
            .state
            .lock()
            .expected_changes
            .insert(key, content.into());
    }

    /// Decide whether the owner must reload its model.
    ///
    /// Drains the change log, then checks each distinct changed known path on
    /// disk. A deleted file, an unreadable file, a content mismatch or a change
    /// with no registered expectation all answer `true`, which is sticky and
    /// disables the session. Before the known set is assigned the backlog is
    /// left untouched and the answer is `false`.
    pub fn assess_if_reload_necessary(&self) -> bool {
        let policy = self.shared.policy;

        let pending = {
            let mut state = self.shared.state.lock();
            if state.reload_required {
                return true;
            }
            let known = match &state.known_files {
                Some(known) => Arc::clone(known),
                None => {
                    tracing::debug!("[SESSION] Assessment before known set assigned");
                    return false;
                }
            };

            let changes = std::mem::take(&mut state.change_log);
            let mut seen = HashSet::new();
            let mut pending = Vec::new();
            for path in changes {
                let key = policy.key(&path);
                if !seen.insert(key.clone()) || !known.contains(&key) {
                    continue;
                }
                let expected = state.expected_changes.get(&key).cloned();
                pending.push(PendingCheck { path, expected });
            }
            pending
        };

        for check in &pending {
            if let Some(reason) = check.reload_reason() {
                tracing::info!(
                    "[SESSION] Reload required for {}: {}",
                    check.path.display(),
                    reason
                );
                self.shared.state.lock().latch_reload();
                return true;
            }
        }

        tracing::debug!(
            "[SESSION] {} changed known files matched expectations",
            pending.len()
        );
        false
    }

    /// Stop applying watcher events. Idempotent.
    pub fn disable(&self) {
        let mut state = self.shared.state.lock();
        if state.enabled {
            state.enabled = false;
            tracing::debug!("[SESSION] Disabled {}", self.shared.root.display());
        }
    }

    /// Release the OS watcher. Safe to call more than once and after `disable`.
    pub fn dispose(&self) {
        if let Some(watcher) = self.watcher.lock().take() {
            drop(watcher);
            tracing::debug!("[SESSION] Disposed watcher for {}", self.shared.root.display());
        }
    }

    #[cfg(test)]
    fn inject(&self, result: notify::Result<Event>) {
        self.shared.handle_event(result);
    }
}

impl Drop for ChangeSession {
    fn drop(&mut self) {
        self.disable();
        self.dispose();
    }
}

// ============================================================================
// Tests
// ============================================================================
