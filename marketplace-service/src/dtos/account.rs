//! Bodies of the public account endpoints. Absent fields deserialize as
//! empty strings so the account core reports which ones are required.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignupRequest {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
    #[schema(example = "pw1")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[schema(example = "User registered successfully")]
    pub message: String,
    #[schema(example = 1)]
    pub user_id: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
    #[schema(example = "pw1")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub user_id: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SendCodeRequest {
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyCodeRequest {
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
    #[schema(example = "012345")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    #[schema(example = "Email alice@ufl.edu successfully verified")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[schema(example = "alice@ufl.edu")]
    pub email: String,
    #[schema(example = "012345")]
    pub otp: String,
    #[schema(example = "pw2")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[schema(example = "pw3")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    #[schema(example = "Password reset successfully. All sessions logged out.")]
    pub message: String,
    pub session_id: String,
    pub user_id: i64,
}
