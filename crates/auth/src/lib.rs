//! `fieldops-auth` — role-based access control and credential primitives.
//!
//! This crate is the policy core: role/capability data, the authorization
//! guard, password and reset-token hashing, and share-token validation.
//! It performs no IO; storage and transport live in other crates.

pub mod capability;
pub mod credentials;
pub mod guard;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod share_token;
pub mod user;

pub use capability::Capability;
pub use credentials::{CredentialError, CredentialStore};
pub use guard::{
    AccessError, AccessScope, CapabilityPair, OwnedRecords, ResourceOwnership, Visibility,
    check, check_capability, check_resource, ensure_not_self, require_active, visibility,
};
pub use permissions::{has_capability, role_capabilities};
pub use principal::Principal;
pub use roles::Role;
pub use share_token::{ShareGrant, ShareTokenError, SHARE_TOKEN_VALIDITY_DAYS};
pub use user::{UserRecord, UserStore};
