//! Process-local store backing every capability, used by the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    Listing, ListingImageRow, ListingPatch, ListingRow, NewImage, NewListing, Session, User,
    VerificationCode,
};
use crate::services::stores::{CredentialStore, ListingStore, SessionStore, VerificationCodeStore};
use crate::utils::generate_session_token;

struct StoredListing {
    user_id: i64,
    fields: NewListing,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    next_user_id: i64,
    next_listing_id: i64,
    next_image_id: i64,
    users: BTreeMap<i64, User>,
    codes: HashMap<i64, VerificationCode>,
    sessions: HashMap<String, Session>,
    listings: BTreeMap<i64, StoredListing>,
    images: BTreeMap<i64, ListingImageRow>,
}

impl Inner {
    fn add_images(&mut self, listing_id: i64, images: Vec<NewImage>) {
        for image in images {
            self.next_image_id += 1;
            self.images.insert(
                self.next_image_id,
                ListingImageRow {
                    id: self.next_image_id,
                    listing_id,
                    image_data: image.data,
                    content_type: image.content_type,
                },
            );
        }
    }

    fn remove_images(&mut self, listing_id: i64) {
        self.images.retain(|_, img| img.listing_id != listing_id);
    }

    fn render(&self, filter: impl Fn(&StoredListing) -> bool) -> Vec<Listing> {
        let mut out: Vec<Listing> = self
            .listings
            .iter()
            .filter(|(_, l)| filter(l))
            .filter_map(|(id, l)| {
                let owner = self.users.get(&l.user_id)?;
                let row = ListingRow {
                    id: *id,
                    user_id: l.user_id,
                    user_name: owner.name.clone(),
                    user_email: owner.email.clone(),
                    product_name: l.fields.product_name.clone(),
                    product_description: l.fields.product_description.clone(),
                    price: l.fields.price,
                    category: l.fields.category.clone(),
                    created_at: l.created_at,
                    updated_at: l.updated_at,
                };
                let images = self
                    .images
                    .values()
                    .filter(|img| img.listing_id == *id)
                    .cloned()
                    .collect();
                Some(Listing::from_parts(row, images))
            })
            .collect();
        out.reverse();
        out
    }
}

/// Mutex-guarded maps. `set_unavailable(true)` makes every call fail, which
/// is how tests reach the 500 branches. `set_code_delete_failing(true)`
/// fails only `delete_code`, for the best-effort cleanup paths.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
    code_delete_failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_code_delete_failing(&self, failing: bool) {
        self.code_delete_failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_verified(&self, user_id: i64) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.users.get(&user_id).is_some_and(|u| u.verified))
            .unwrap_or(false)
    }

    /// Snapshot of the code currently held for a user.
    pub fn code_for(&self, user_id: i64) -> Option<VerificationCode> {
        self.inner.lock().ok()?.codes.get(&user_id).cloned()
    }

    pub fn session_count(&self, user_id: i64) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.sessions.values().filter(|s| s.user_id == user_id).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, anyhow::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.lock().map(|_| ())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error> {
        Ok(self.lock()?.users.values().any(|u| u.email == email))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, anyhow::Error> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<i64>, anyhow::Error> {
        let mut inner = self.lock()?;
        if inner.users.values().any(|u| u.email == email) {
            return Ok(None);
        }
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.insert(
            id,
            User::new(id, name.to_string(), email.to_string(), password_hash.to_string()),
        );
        Ok(Some(id))
    }

    async fn update_password(
        &self,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), anyhow::Error> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn mark_verified(&self, user_id: i64) -> Result<(), anyhow::Error> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            user.verified = true;
        }
        Ok(())
    }

    async fn update_contact(
        &self,
        user_id: i64,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), anyhow::Error> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            if let Some(phone) = phone {
                user.phone = Some(phone.to_string());
            }
            if let Some(address) = address {
                user.address = Some(address.to_string());
            }
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        if inner.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        inner.codes.remove(&user_id);
        inner.sessions.retain(|_, s| s.user_id != user_id);

        let owned: Vec<i64> = inner
            .listings
            .iter()
            .filter(|(_, l)| l.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for id in owned {
            inner.listings.remove(&id);
            inner.remove_images(id);
        }
        Ok(true)
    }
}

#[async_trait]
impl VerificationCodeStore for InMemoryStore {
    async fn get_code(&self, user_id: i64) -> Result<Option<VerificationCode>, anyhow::Error> {
        Ok(self.lock()?.codes.get(&user_id).cloned())
    }

    async fn store_code(
        &self,
        user_id: i64,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        self.lock()?.codes.insert(
            user_id,
            VerificationCode::new(user_id, email.to_string(), code.to_string(), expires_at),
        );
        Ok(())
    }

    async fn delete_code(&self, user_id: i64) -> Result<(), anyhow::Error> {
        if self.code_delete_failing.load(Ordering::SeqCst) {
            anyhow::bail!("verification code delete failed");
        }
        self.lock()?.codes.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, user_id: i64) -> Result<String, anyhow::Error> {
        let token = generate_session_token();
        let session = Session::new(&token, user_id);
        self.lock()?.sessions.insert(session.token_hash.clone(), session);
        Ok(token)
    }

    async fn validate_session(&self, token: &str, user_id: i64) -> Result<bool, anyhow::Error> {
        Ok(self
            .lock()?
            .sessions
            .get(&Session::hash_token(token))
            .is_some_and(|s| s.user_id == user_id))
    }

    async fn delete_all_sessions(&self, user_id: i64) -> Result<(), anyhow::Error> {
        self.lock()?.sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl ListingStore for InMemoryStore {
    async fn list_excluding_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error> {
        Ok(self.lock()?.render(|l| l.user_id != user_id))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Listing>, anyhow::Error> {
        Ok(self.lock()?.render(|l| l.user_id == user_id))
    }

    async fn create_listing(
        &self,
        user_id: i64,
        listing: NewListing,
        images: Vec<NewImage>,
    ) -> Result<i64, anyhow::Error> {
        let mut inner = self.lock()?;
        inner.next_listing_id += 1;
        let id = inner.next_listing_id;
        let now = Utc::now();
        inner.listings.insert(
            id,
            StoredListing {
                user_id,
                fields: listing,
                created_at: now,
                updated_at: now,
            },
        );
        inner.add_images(id, images);
        Ok(id)
    }

    async fn find_owner(&self, listing_id: i64) -> Result<Option<i64>, anyhow::Error> {
        Ok(self.lock()?.listings.get(&listing_id).map(|l| l.user_id))
    }

    async fn update_listing(
        &self,
        listing_id: i64,
        patch: ListingPatch,
    ) -> Result<(), anyhow::Error> {
        if let Some(listing) = self.lock()?.listings.get_mut(&listing_id) {
            if let Some(name) = patch.product_name {
                listing.fields.product_name = name;
            }
            if let Some(description) = patch.product_description {
                listing.fields.product_description = description;
            }
            if let Some(price) = patch.price {
                listing.fields.price = price;
            }
            if let Some(category) = patch.category {
                listing.fields.category = category;
            }
            listing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn replace_images(
        &self,
        listing_id: i64,
        images: Vec<NewImage>,
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner.remove_images(listing_id);
        inner.add_images(listing_id, images);
        Ok(())
    }

    async fn delete_listing(&self, listing_id: i64) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        inner.remove_images(listing_id);
        Ok(inner.listings.remove(&listing_id).is_some())
    }
}
