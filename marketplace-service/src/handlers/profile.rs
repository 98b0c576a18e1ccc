use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        profile::{UpdateProfileRequest, UpdateProfileResponse},
        ErrorResponse, MessageResponse,
    },
    middleware::SessionUser,
    models::UserProfile,
    utils::JsonBody,
    AppState,
};

/// Current user's profile
#[utoipa::path(
    get,
    path = "/user/profile",
    responses(
        (status = 200, description = "Profile; missing contact fields are empty strings", body = UserProfile),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    tag = "User",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.accounts.get_profile(user_id).await?))
}

/// Update phone and/or address
#[utoipa::path(
    post,
    path = "/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UpdateProfileResponse),
        (status = 400, description = "Nothing to update or invalid phone", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "User",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let profile = state
        .accounts
        .update_profile(user_id, req.phone.as_deref(), req.address.as_deref())
        .await?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        phone: profile.phone,
        address: profile.address,
    }))
}

/// Delete the current user with its sessions, codes and listings
#[utoipa::path(
    delete,
    path = "/user/deleteUser",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    tag = "User",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.delete_account(user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
