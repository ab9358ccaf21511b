//! Writes that the monitor should not mistake for external edits

use std::path::Path;

use crate::error::Result;

use super::service::MonitoringService;

/// Register `content` as the expected result for `path`, then write it.
///
/// Registration happens first so the watcher event raised by the write is
/// matched against it at the next assessment.
pub fn write_expected(service: &MonitoringService, path: &Path, content: &str) -> Result<()> {
    service.register_expected_change(path, content);
    std::fs::write(path, content)?;
    tracing::debug!("[MONITOR] Wrote expected content to {}", path.display());
    Ok(())
}
