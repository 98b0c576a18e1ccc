//! Listing CRUD on behalf of an already-authenticated user.

use std::sync::Arc;

use crate::models::{Listing, ListingPatch, NewImage, NewListing};
use crate::services::error::ListingError;
use crate::services::stores::ListingStore;

/// Parses a form price. Blank, non-numeric, negative and non-finite values
/// are rejected.
pub fn parse_price(raw: &str) -> Result<f64, ListingError> {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ListingError::InvalidPrice),
    }
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ListingStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    async fn ensure_owner(&self, listing_id: i64, user_id: i64) -> Result<(), ListingError> {
        match self
            .store
            .find_owner(listing_id)
            .await
            .map_err(ListingError::Store)?
        {
            None => Err(ListingError::NotFound),
            Some(owner) if owner != user_id => {
                tracing::warn!(listing_id, user_id, owner, "Listing change by non-owner refused");
                Err(ListingError::NotOwner)
            }
            Some(_) => Ok(()),
        }
    }

    /// Everything on the marketplace except the caller's own listings.
    pub async fn browse(&self, user_id: i64) -> Result<Vec<Listing>, ListingError> {
        self.store
            .list_excluding_user(user_id)
            .await
            .map_err(ListingError::Store)
    }

    pub async fn mine(&self, user_id: i64) -> Result<Vec<Listing>, ListingError> {
        self.store
            .list_for_user(user_id)
            .await
            .map_err(ListingError::Store)
    }

    /// Creates the listing and returns the caller's refreshed listings.
    pub async fn create(
        &self,
        user_id: i64,
        listing: NewListing,
        images: Vec<NewImage>,
    ) -> Result<Vec<Listing>, ListingError> {
        if listing.product_name.trim().is_empty() {
            return Err(ListingError::MissingName);
        }

        let image_count = images.len();
        let listing_id = self
            .store
            .create_listing(user_id, listing, images)
            .await
            .map_err(ListingError::Store)?;
        tracing::info!(listing_id, user_id, image_count, "Listing created");

        self.mine(user_id).await
    }

    /// Applies `patch`; a non-empty `images` replaces all existing images.
    pub async fn update(
        &self,
        user_id: i64,
        listing_id: i64,
        patch: ListingPatch,
        images: Vec<NewImage>,
    ) -> Result<(), ListingError> {
        self.ensure_owner(listing_id, user_id).await?;

        self.store
            .update_listing(listing_id, patch)
            .await
            .map_err(ListingError::Store)?;

        if !images.is_empty() {
            self.store
                .replace_images(listing_id, images)
                .await
                .map_err(ListingError::Store)?;
        }

        tracing::info!(listing_id, user_id, "Listing updated");
        Ok(())
    }

    pub async fn delete(&self, user_id: i64, listing_id: i64) -> Result<(), ListingError> {
        self.ensure_owner(listing_id, user_id).await?;

        if !self
            .store
            .delete_listing(listing_id)
            .await
            .map_err(ListingError::Store)?
        {
            return Err(ListingError::NotFound);
        }

        tracing::info!(listing_id, user_id, "Listing deleted");
        Ok(())
    }
}
