//! User identity records and their storage contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fieldops_core::{StoreError, UserId};

use crate::principal::Principal;
use crate::roles::Role;

/// A stored user account.
///
/// `password_hash` and `reset_token_hash` hold Argon2id hash strings; raw
/// credentials are never stored or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub password_hash: String,
    pub reset_token_hash: Option<String>,
    pub reset_requested_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        password_hash: String,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into().trim().to_lowercase(),
            display_name: display_name.into(),
            role,
            active: true,
            password_hash,
            reset_token_hash: None,
            reset_requested_at: None,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
            active: self.active,
        }
    }
}

/// Storage contract for user accounts.
///
/// Implementations are shared across request handlers and must be safe to
/// call concurrently.
pub trait UserStore: Send + Sync {
    fn find(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    fn insert(&self, user: UserRecord) -> Result<(), StoreError>;

    /// Replace the stored record for `user.id`.
    fn update(&self, user: UserRecord) -> Result<(), StoreError>;

    fn remove(&self, id: UserId) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
}
