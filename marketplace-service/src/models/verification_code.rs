//! Email verification code - at most one active row per user.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Active one-time code for a user.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub user_id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(user_id: i64, email: String, code: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email,
            code,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(now, self.expires_at)
    }

    /// Exact string comparison; codes are zero-padded so "012345" != "12345".
    pub fn matches(&self, candidate: &str) -> bool {
        self.code == candidate
    }
}

/// A code is usable only strictly before its expiry instant.
pub fn is_expired(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now >= expires_at
}
