//! Fire-and-forget audit delivery.
//!
//! `AuditLogger::record` hands the entry to a background consumer over a
//! channel and returns immediately. A full or closed channel, or a sink that
//! rejects the append, is logged and absorbed; the mutation that produced the
//! entry has already succeeded and must stay succeeded.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use thiserror::Error;

use crate::entry::AuditEntry;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit entries. Appends must be durable in order; the
/// logger serializes all writes through a single consumer.
pub trait AuditSink: Send + 'static {
    fn append(&self, entry: &AuditEntry) -> Result<(), SinkError>;
}

/// Sink backed by a shared vector, for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: &AuditEntry) -> Result<(), SinkError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| SinkError::Unavailable("sink lock poisoned".to_string()))?;
        guard.push(entry.clone());
        Ok(())
    }
}

enum Message {
    Entry(Box<AuditEntry>),
    Flush(Sender<()>),
}

/// Handle to the background audit consumer. Cloneable and cheap; all clones
/// feed the same consumer thread.
#[derive(Clone)]
pub struct AuditLogger {
    tx: Sender<Message>,
}

impl AuditLogger {
    /// Spawn the consumer thread draining into `sink`.
    pub fn spawn<S: AuditSink>(sink: S) -> Self {
        let (tx, rx) = mpsc::channel::<Message>();

        thread::Builder::new()
            .name("audit-consumer".to_string())
            .spawn(move || {
                for message in rx {
                    match message {
                        Message::Entry(entry) => {
                            if let Err(e) = sink.append(&entry) {
                                tracing::warn!(
                                    action = %entry.action,
                                    error = %e,
                                    "audit append failed; entry dropped"
                                );
                            }
                        }
                        Message::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .ok();

        Self { tx }
    }

    /// Queue an entry for appending. Never fails and never blocks on the
    /// sink; a closed channel only produces a warning.
    pub fn record(&self, entry: AuditEntry) {
        if self.tx.send(Message::Entry(Box::new(entry))).is_err() {
            tracing::warn!("audit consumer gone; entry dropped");
        }
    }

    /// Wait until every entry queued before this call has been consumed.
    /// Used by tests to observe the sink deterministically.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditAction;
    use fieldops_core::UserId;

    struct RejectingSink;

    impl AuditSink for RejectingSink {
        fn append(&self, _entry: &AuditEntry) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("disk full".to_string()))
        }
    }

    #[test]
    fn entries_reach_the_sink_in_order() {
        let sink = InMemoryAuditSink::new();
        let logger = AuditLogger::spawn(sink.clone());

        let user = UserId::new();
        logger.record(AuditEntry::new(Some(user), AuditAction::Login, "user"));
        logger.record(AuditEntry::new(Some(user), AuditAction::Logout, "user"));
        logger.flush();

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Login);
        assert_eq!(entries[1].action, AuditAction::Logout);
        assert_eq!(entries[0].user_id, Some(user));
    }

    #[test]
    fn failing_sink_never_surfaces_to_the_caller() {
        let logger = AuditLogger::spawn(RejectingSink);
        logger.record(AuditEntry::new(None, AuditAction::PublicQuoteRequest, "lead"));
        logger.flush();
        // No panic, no error; the entry is simply gone.
    }

    #[test]
    fn anonymous_entries_carry_no_user() {
        let sink = InMemoryAuditSink::new();
        let logger = AuditLogger::spawn(sink.clone());

        logger.record(
            AuditEntry::new(None, AuditAction::QuoteApprove, "quote")
                .details(serde_json::json!({ "via": "share_link" })),
        );
        logger.flush();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].user_id.is_none());
        assert!(entries[0].details.is_some());
    }
}
