//! Password and reset-token hashing using Argon2id.
//!
//! The store owns a single configured hasher; bulk flows (imports, seeding)
//! hash through it sequentially rather than fanning out concurrent hashing
//! work, since each hash pins 64 MiB.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;
use thiserror::Error;

/// Argon2id work factor: 64 MiB memory, 3 iterations, 1 lane.
const MEMORY_KIB: u32 = 64 * 1024;
const ITERATIONS: u32 = 3;
const PARALLELISM: u32 = 1;

/// Reset tokens carry 256 bits of entropy, hex-encoded.
const RESET_TOKEN_BYTES: usize = 32;

/// Credential-store internal failure.
///
/// Surfaced to callers as a generic server error; the message is for
/// operational logs only and never reaches a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password hashing failed")]
    Hashing,
}

/// Memory-hard password hashing and verification.
pub struct CredentialStore {
    argon2: Argon2<'static>,
}

impl CredentialStore {
    pub fn new() -> Self {
        let params =
            Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None).expect("Invalid Argon2 params");

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a plaintext password. Fails only on underlying resource
    /// exhaustion; never returns or logs the plaintext.
    pub fn hash_password(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "argon2 hashing failed");
                CredentialError::Hashing
            })?;

        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// A malformed stored hash verifies as `false` rather than erroring, so
    /// callers cannot distinguish account-exists from bad-password by error
    /// type.
    pub fn verify_password(&self, stored: &str, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!(error = %e, "stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Generate an opaque password-reset token (256 bits, hex-encoded).
    ///
    /// Tokens are hashed with [`Self::hash_reset_token`] before storage and
    /// verified like passwords; the raw token is only ever sent to the user.
    pub fn generate_reset_token() -> String {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn hash_reset_token(&self, token: &str) -> Result<String, CredentialError> {
        self.hash_password(token)
    }

    pub fn verify_reset_token(&self, stored: &str, token: &str) -> bool {
        self.verify_password(stored, token)
    }

    /// Minimal password policy shared by registration and password change.
    pub fn check_password_policy(plaintext: &str) -> Result<(), String> {
        if plaintext.len() < 8 {
            return Err("password must be at least 8 characters".to_string());
        }
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let store = CredentialStore::new();
        let hash = store.hash_password("correct horse battery staple").unwrap();

        assert!(store.verify_password(&hash, "correct horse battery staple"));
        assert!(!store.verify_password(&hash, "correct horse battery stapler"));
    }

    #[test]
    fn hash_never_contains_the_plaintext() {
        let store = CredentialStore::new();
        let hash = store.hash_password("hunter2hunter2").unwrap();
        assert!(!hash.contains("hunter2"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let store = CredentialStore::new();
        let a = store.hash_password("same password").unwrap();
        let b = store.hash_password("same password").unwrap();
        assert_ne!(a, b);
        assert!(store.verify_password(&a, "same password"));
        assert!(store.verify_password(&b, "same password"));
    }

    #[test]
    fn malformed_stored_hash_verifies_false_not_error() {
        let store = CredentialStore::new();
        assert!(!store.verify_password("not-a-phc-string", "anything"));
        assert!(!store.verify_password("", "anything"));
    }

    #[test]
    fn hash_uses_configured_work_factor() {
        let store = CredentialStore::new();
        let hash = store.hash_password("pw-for-params").unwrap();
        // PHC string encodes the parameters it was produced with.
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=65536,t=3,p=1"));
    }

    #[test]
    fn reset_tokens_are_long_random_hex() {
        let a = CredentialStore::generate_reset_token();
        let b = CredentialStore::generate_reset_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn reset_token_verifies_through_the_same_primitive() {
        let store = CredentialStore::new();
        let token = CredentialStore::generate_reset_token();
        let stored = store.hash_reset_token(&token).unwrap();

        assert!(store.verify_reset_token(&stored, &token));
        assert!(!store.verify_reset_token(&stored, "wrong-token"));
    }

    #[test]
    fn password_policy_rejects_short_passwords() {
        assert!(CredentialStore::check_password_policy("short").is_err());
        assert!(CredentialStore::check_password_policy("long enough").is_ok());
    }
}
