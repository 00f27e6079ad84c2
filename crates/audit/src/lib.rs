//! `fieldops-audit` — best-effort, append-only activity logging.
//!
//! Audit writes are decoupled from the request path: entries go through a
//! channel to a background consumer, and no failure in this crate may fail
//! or roll back the operation it accompanies.

pub mod entry;
pub mod logger;

pub use entry::{AuditAction, AuditEntry};
pub use logger::{AuditLogger, AuditSink, InMemoryAuditSink, SinkError};
