//! Product listings and their attached images.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Listing joined with its owner's name and email.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub product_name: String,
    pub product_description: String,
    pub price: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ListingImageRow {
    pub id: i64,
    pub listing_id: i64,
    pub image_data: Vec<u8>,
    pub content_type: String,
}

/// Image as returned to clients: raw bytes base64-encoded.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingImage {
    pub id: i64,
    #[schema(example = "image/png")]
    pub content_type: String,
    pub data: String,
}

impl From<ListingImageRow> for ListingImage {
    fn from(row: ListingImageRow) -> Self {
        Self {
            id: row.id,
            content_type: row.content_type,
            data: STANDARD.encode(row.image_data),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    #[schema(example = "Desk lamp")]
    pub product_name: String,
    pub product_description: String,
    #[schema(example = 12.5)]
    pub price: f64,
    #[schema(example = "Furniture")]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ListingImage>,
}

impl Listing {
    pub fn from_parts(row: ListingRow, images: Vec<ListingImageRow>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            product_name: row.product_name,
            product_description: row.product_description,
            price: row.price,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
            images: images.into_iter().map(ListingImage::from).collect(),
        }
    }
}

/// Fields for a listing being created.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub product_name: String,
    pub product_description: String,
    pub price: f64,
    pub category: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub content_type: String,
}
