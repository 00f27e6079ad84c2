//! Role identifiers used for RBAC.
//!
//! Roles are a **closed enumeration**: adding a role is a compile-time-visible
//! change at every site that branches on it (the permission table, the
//! sanitizer, route guards). Do not model roles as strings.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use fieldops_core::DomainError;

/// Role of an authenticated principal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// External customer; sees only records traceable to their own
    /// Client/Lead links.
    Client,
    /// Staff technician; scoped to assigned work.
    Employee,
    /// Sales staff; owns the CRM surface and quoting.
    Sales,
    /// Project manager; full project/ticket visibility.
    ProjectManager,
    /// Business manager; broad operational access.
    Manager,
    /// Full administrator.
    Admin,
}

impl Role {
    /// Every role, for exhaustive table checks in tests.
    pub const ALL: [Role; 6] = [
        Role::Client,
        Role::Employee,
        Role::Sales,
        Role::ProjectManager,
        Role::Manager,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Employee => "employee",
            Role::Sales => "sales",
            Role::ProjectManager => "project_manager",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Whether this role is staff (anything but an external client).
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Client)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "employee" => Ok(Role::Employee),
            "sales" => Ok(Role::Sales),
            "project_manager" => Ok(Role::ProjectManager),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn only_client_is_external() {
        for role in Role::ALL {
            assert_eq!(role.is_staff(), role != Role::Client);
        }
    }
}
