//! Multipart form layouts for the listing endpoints. These types only
//! document the forms; handlers read the parts directly.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingForm {
    #[schema(example = "Desk lamp")]
    pub product_name: String,
    pub product_description: String,
    #[schema(example = "12.50")]
    pub price: String,
    #[schema(example = "Furniture")]
    pub category: String,
    /// Repeatable; each part up to the configured image size.
    #[schema(value_type = Vec<String>)]
    pub images: Vec<Vec<u8>>,
}

#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingForm {
    #[schema(example = "7")]
    pub listing_id: String,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    /// When present, replaces every existing image.
    #[schema(value_type = Vec<String>)]
    pub images: Vec<Vec<u8>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteListingQuery {
    /// Raw value; validated as an integer by the handler.
    #[param(example = "7")]
    pub listing_id: Option<String>,
}
