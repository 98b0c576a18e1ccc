//! Server-side session rows. Only the SHA-256 of the opaque token is persisted.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: &str, user_id: i64) -> Self {
        Self {
            token_hash: Self::hash_token(token),
            user_id,
            created_at: Utc::now(),
        }
    }

    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
