//! Storage capabilities consumed by the account core, the session gate and
//! the listing service. Each is object-safe and shared as `Arc<dyn _>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Listing, ListingPatch, NewImage, NewListing, User, VerificationCode};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;

    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, anyhow::Error>;

    /// Inserts an unverified user. `None` means the email was taken by a
    /// concurrent insert.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<i64>, anyhow::Error>;

    async fn update_password(&self, user_id: i64, password_hash: &str)
        -> Result<(), anyhow::Error>;

    async fn mark_verified(&self, user_id: i64) -> Result<(), anyhow::Error>;

    /// `None` leaves the column unchanged.
    async fn update_contact(
        &self,
        user_id: i64,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), anyhow::Error>;

    /// Removes the user and everything it owns. Returns false if no row matched.
    async fn delete_user(&self, user_id: i64) -> Result<bool, anyhow::Error>;
}

#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn get_code(&self, user_id: i64) -> Result<Option<VerificationCode>, anyhow::Error>;

    /// Upsert: replaces any code already held for the user.
    async fn store_code(
        &self,
        user_id: i64,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error>;

    async fn delete_code(&self, user_id: i64) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Mints a fresh opaque token bound to `user_id`.
    async fn create_session(&self, user_id: i64) -> Result<String, anyhow::Error>;

    async fn validate_session(&self, token: &str, user_id: i64) -> Result<bool, anyhow::Error>;

    async fn delete_all_sessions(&self, user_id: i64) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn list_excluding_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error>;

    async fn create_listing(
        &self,
        user_id: i64,
        listing: NewListing,
        images: Vec<NewImage>,
    ) -> Result<i64, anyhow::Error>;

    async fn find_owner(&self, listing_id: i64) -> Result<Option<i64>, anyhow::Error>;

    /// Applies the set fields and bumps `updated_at`.
    async fn update_listing(&self, listing_id: i64, patch: ListingPatch)
        -> Result<(), anyhow::Error>;

    async fn replace_images(
        &self,
        listing_id: i64,
        images: Vec<NewImage>,
    ) -> Result<(), anyhow::Error>;

    async fn delete_listing(&self, listing_id: i64) -> Result<bool, anyhow::Error>;
}
