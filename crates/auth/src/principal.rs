//! The authenticated identity making a request.

use serde::{Deserialize, Serialize};

use fieldops_core::UserId;

use crate::roles::Role;

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the session
/// resolver loads the backing user record and derives this. An inactive
/// principal must be rejected at authentication and never reach the guard;
/// the guard still re-checks `active` as a belt-and-braces invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
    pub active: bool,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            active: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
