//! User model - marketplace accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// User entity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh, unverified user. The id is assigned by the store.
    pub fn new(id: i64, name: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            verified: false,
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Public view of a user (no password hash). Missing contact fields render as "".
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
    #[schema(example = "+13525550100")]
    pub phone: String,
    #[schema(example = "1 Gator Way, Gainesville")]
    pub address: String,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone().unwrap_or_default(),
            address: u.address.clone().unwrap_or_default(),
        }
    }
}
