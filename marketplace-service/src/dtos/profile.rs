use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "+3525550100")]
    pub phone: Option<String>,
    #[schema(example = "1 Gator Way, Gainesville")]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateProfileResponse {
    #[schema(example = "Profile updated successfully")]
    pub message: String,
    pub phone: String,
    pub address: String,
}
