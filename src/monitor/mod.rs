//! Workspace change monitoring
//!
//! - `session` - one recursive watch with backlog reconciliation and reload assessment
//! - `service` - owns at most one session; start/stop/replace and query proxying
//! - `writer` - register-then-write helper for components that modify files

pub mod service;
pub mod session;
pub mod writer;

pub use service::MonitoringService;
pub use session::ChangeSession;
pub use writer::write_expected;
