use std::sync::Arc;

use fieldops_audit::{AuditEntry, AuditLogger, AuditSink, InMemoryAuditSink};
use fieldops_auth::{CredentialStore, OwnedRecords, Role, UserRecord};
use fieldops_auth::user::UserStore;
use fieldops_core::UserId;
use fieldops_crm::{resolve_owned, CrmStore};

use crate::session::SessionStore;

/// Shared application state, one instance per process.
pub struct AppServices {
    pub store: Arc<CrmStore>,
    pub credentials: CredentialStore,
    pub sessions: SessionStore,
    pub audit: AuditLogger,
}

impl AppServices {
    /// In-memory wiring (dev/test) with an in-memory audit sink.
    pub fn in_memory() -> Self {
        Self::with_audit_sink(InMemoryAuditSink::new())
    }

    pub fn with_audit_sink<S: AuditSink>(sink: S) -> Self {
        Self {
            store: Arc::new(CrmStore::new()),
            credentials: CredentialStore::new(),
            sessions: SessionStore::new(),
            audit: AuditLogger::spawn(sink),
        }
    }

    /// Resolve the CRM records owned by `user_id`, freshly per request.
    pub fn owned_for(&self, user_id: UserId) -> OwnedRecords {
        resolve_owned(&*self.store, user_id)
    }

    /// Queue an audit entry; never fails the caller.
    pub fn record_audit(&self, entry: AuditEntry) {
        self.audit.record(entry);
    }

    /// Create the bootstrap admin account if no user holds that email yet.
    pub fn seed_admin(&self, email: &str, password: &str) -> anyhow::Result<()> {
        if self.store.find_by_email(email)?.is_some() {
            return Ok(());
        }

        let hash = self.credentials.hash_password(password)?;
        let admin = UserRecord::new(email, "Administrator", Role::Admin, hash);
        self.store.insert(admin)?;

        tracing::info!(email, "seeded bootstrap admin account");
        Ok(())
    }
}
