use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

use crate::{
    dtos::{
        listing::{CreateListingForm, DeleteListingQuery, UpdateListingForm},
        ErrorResponse, MessageResponse,
    },
    middleware::SessionUser,
    models::{Listing, ListingPatch, NewImage, NewListing},
    services::listing::parse_price,
    AppState,
};

const IMAGES_FIELD: &str = "images";

/// Text fields and accepted images of a listing form.
#[derive(Default)]
struct ListingForm {
    fields: HashMap<String, String>,
    images: Vec<NewImage>,
}

impl ListingForm {
    fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// `None` when the field is absent or blank.
    fn non_empty(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

fn form_error(e: impl std::fmt::Display) -> AppError {
    tracing::debug!(error = %e, "Rejected multipart body");
    AppError::BadRequest(anyhow::anyhow!("Unable to parse form data"))
}

async fn read_form(mut multipart: Multipart, max_image_bytes: usize) -> Result<ListingForm, AppError> {
    let mut form = ListingForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGES_FIELD {
            let file_name = field.file_name().unwrap_or("unnamed").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(form_error)?;

            if data.len() > max_image_bytes {
                tracing::warn!(
                    file_name = %file_name,
                    size = data.len(),
                    limit = max_image_bytes,
                    "Image too large, skipped"
                );
                continue;
            }
            form.images.push(NewImage {
                data: data.to_vec(),
                content_type,
            });
        } else {
            let value = field.text().await.map_err(form_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn parse_listing_id(raw: Option<&str>) -> Result<i64, AppError> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid listingId")))
}

/// Listings from every other user
#[utoipa::path(
    get,
    path = "/listings",
    responses(
        (status = 200, description = "Listings not owned by the caller", body = [Listing]),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "Listings",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn browse_listings(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.listings.browse(user_id).await?))
}

/// The caller's own listings
#[utoipa::path(
    get,
    path = "/listings/user",
    responses(
        (status = 200, description = "Listings owned by the caller", body = [Listing]),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "Listings",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn user_listings(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.listings.mine(user_id).await?))
}

/// Create a listing with optional images
#[utoipa::path(
    post,
    path = "/listings",
    request_body(content = CreateListingForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Created; returns the caller's listings", body = [Listing]),
        (status = 400, description = "Unreadable form, missing name or invalid price", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "Listings",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn create_listing(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    multipart: Multipart,
) -> Result<Json<Vec<Listing>>, AppError> {
    let form = read_form(multipart, state.config.listings.max_image_bytes).await?;
    let price = parse_price(form.text("price"))?;

    let listing = NewListing {
        product_name: form.text("productName").to_string(),
        product_description: form.text("productDescription").to_string(),
        price,
        category: form.text("category").to_string(),
    };

    Ok(Json(
        state.listings.create(user_id, listing, form.images).await?,
    ))
}

/// Edit a listing owned by the caller
#[utoipa::path(
    put,
    path = "/listing/updateListing",
    request_body(content = UpdateListingForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Listing updated", body = MessageResponse),
        (status = 400, description = "Unreadable form, bad listingId or invalid price", body = ErrorResponse),
        (status = 401, description = "Invalid session or not the owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    ),
    tag = "Listings",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn update_listing(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let form = read_form(multipart, state.config.listings.max_image_bytes).await?;
    let listing_id = parse_listing_id(form.fields.get("listingId").map(String::as_str))?;

    let price = form
        .non_empty("price")
        .map(|raw| parse_price(&raw))
        .transpose()?;

    let patch = ListingPatch {
        product_name: form.non_empty("productName"),
        product_description: form.non_empty("productDescription"),
        price,
        category: form.non_empty("category"),
    };

    state
        .listings
        .update(user_id, listing_id, patch, form.images)
        .await?;

    Ok(Json(MessageResponse::new("Listing updated successfully")))
}

/// Delete a listing owned by the caller, with its images
#[utoipa::path(
    delete,
    path = "/listing/deleteListing",
    params(DeleteListingQuery),
    responses(
        (status = 200, description = "Listing deleted", body = MessageResponse),
        (status = 400, description = "Bad listingId", body = ErrorResponse),
        (status = 401, description = "Invalid session or not the owner", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse)
    ),
    tag = "Listings",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Query(query): Query<DeleteListingQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let listing_id = parse_listing_id(query.listing_id.as_deref())?;
    state.listings.delete(user_id, listing_id).await?;
    Ok(Json(MessageResponse::new("Listing deleted successfully")))
}
