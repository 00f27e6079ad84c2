//! Share tokens: time-limited public access to one specific record.
//!
//! Possession of the token substitutes for the authorization guard on a
//! dedicated public route. Validation is deliberately strict: the token must
//! match byte-for-byte, the record's human-readable number must match the one
//! in the URL, and the grant must be inside its validity window.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Grants expire 30 days after issuance.
pub const SHARE_TOKEN_VALIDITY_DAYS: i64 = 30;

/// Token entropy: 128 bits, hex-encoded.
const TOKEN_BYTES: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareTokenError {
    #[error("share token does not match")]
    TokenMismatch,

    /// The token resolves to a real grant, but for a different record number
    /// than the one requested.
    #[error("share token belongs to a different record")]
    RecordMismatch,

    #[error("share token expired")]
    Expired,
}

/// A share grant stored against one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub token: String,
    /// Human-readable business identifier of the owning record
    /// (e.g. "Q-1001").
    pub record_number: String,
    pub issued_at: DateTime<Utc>,
}

impl ShareGrant {
    pub fn issue(record_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        Self {
            token: hex::encode(bytes),
            record_number: record_number.into(),
            issued_at: now,
        }
    }

    /// Validate a presented token against this grant.
    ///
    /// `requested_number` is the business identifier from the URL; it must
    /// match the grant's owning record even when the token itself resolves.
    pub fn validate(
        &self,
        presented: &str,
        requested_number: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ShareTokenError> {
        // Bearer secret: compare without short-circuiting.
        if !bool::from(presented.as_bytes().ct_eq(self.token.as_bytes())) {
            return Err(ShareTokenError::TokenMismatch);
        }

        if requested_number != self.record_number {
            return Err(ShareTokenError::RecordMismatch);
        }

        if now - self.issued_at > Duration::days(SHARE_TOKEN_VALIDITY_DAYS) {
            return Err(ShareTokenError::Expired);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_token_passes() {
        let now = Utc::now();
        let grant = ShareGrant::issue("Q-1001", now);
        assert!(grant.validate(&grant.token.clone(), "Q-1001", now).is_ok());
    }

    #[test]
    fn tokens_are_unguessable_hex() {
        let a = ShareGrant::issue("Q-1001", Utc::now());
        let b = ShareGrant::issue("Q-1001", Utc::now());
        assert_eq!(a.token.len(), 32);
        assert!(a.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn wrong_token_is_rejected() {
        let now = Utc::now();
        let grant = ShareGrant::issue("Q-1001", now);
        assert_eq!(
            grant.validate("deadbeefdeadbeefdeadbeefdeadbeef", "Q-1001", now),
            Err(ShareTokenError::TokenMismatch)
        );
    }

    #[test]
    fn wrong_length_token_is_rejected_like_any_mismatch() {
        let now = Utc::now();
        let grant = ShareGrant::issue("Q-1001", now);
        assert_eq!(
            grant.validate("abc", "Q-1001", now),
            Err(ShareTokenError::TokenMismatch)
        );
        assert_eq!(
            grant.validate("", "Q-1001", now),
            Err(ShareTokenError::TokenMismatch)
        );
    }

    #[test]
    fn cross_record_number_is_rejected_even_with_a_real_token() {
        // Token was issued for Q-1002; presenting it against Q-1001 must fail.
        let now = Utc::now();
        let grant = ShareGrant::issue("Q-1002", now);
        assert_eq!(
            grant.validate(&grant.token.clone(), "Q-1001", now),
            Err(ShareTokenError::RecordMismatch)
        );
    }

    #[test]
    fn expired_grant_is_rejected() {
        let issued = Utc::now();
        let grant = ShareGrant::issue("INV-2040", issued);

        let just_inside = issued + Duration::days(SHARE_TOKEN_VALIDITY_DAYS);
        assert!(grant.validate(&grant.token.clone(), "INV-2040", just_inside).is_ok());

        let just_past = issued + Duration::days(SHARE_TOKEN_VALIDITY_DAYS) + Duration::seconds(1);
        assert_eq!(
            grant.validate(&grant.token.clone(), "INV-2040", just_past),
            Err(ShareTokenError::Expired)
        );
    }
}
