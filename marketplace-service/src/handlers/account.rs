use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        account::{
            ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse,
            ResetPasswordRequest, SendCodeRequest, SignupRequest, SignupResponse,
            VerifyCodeRequest, VerifyCodeResponse,
        },
        ErrorResponse, MessageResponse,
    },
    middleware::SessionUser,
    services::{account::ttl_label, metrics::record_account_event, VerifyOutcome},
    utils::{JsonBody, Password},
    AppState,
};

/// Register a new, unverified account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered", body = SignupResponse),
        (status = 400, description = "Missing fields, malformed body or email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let user_id = state
        .accounts
        .signup(&req.name, &req.email, &Password::new(req.password))
        .await?;
    record_account_event("signup");

    Ok(Json(SignupResponse {
        message: "User registered successfully".to_string(),
        user_id,
    }))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 400, description = "Missing fields or malformed body", body = ErrorResponse),
        (status = 401, description = "Invalid credentials or email not verified", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = state
        .accounts
        .login(&req.email, &Password::new(req.password))
        .await?;
    record_account_event("login");

    Ok(Json(LoginResponse {
        session_id: outcome.session_id,
        name: outcome.name,
        email: outcome.email,
        user_id: outcome.user_id,
    }))
}

/// Email a fresh six-digit verification code
#[utoipa::path(
    post,
    path = "/sendEmailVerificationCode",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code issued and sent", body = MessageResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse),
        (status = 500, description = "Store or mail failure", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn send_verification_code(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SendCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.send_verification_code(&req.email).await?;
    record_account_event("code_issued");

    Ok(Json(MessageResponse::new(format!(
        "Verification code sent successfully. Code will be active for {}.",
        ttl_label(state.accounts.code_ttl())
    ))))
}

/// Verify the account email with the issued code
#[utoipa::path(
    post,
    path = "/verifyEmailVerificationCode",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Verified, or already verified", body = VerifyCodeResponse),
        (status = 400, description = "Missing fields or no active code", body = ErrorResponse),
        (status = 401, description = "Code mismatch", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse),
        (status = 410, description = "Code expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let response = match state.accounts.verify_code(&req.email, &req.code).await? {
        VerifyOutcome::Verified { user_id } => {
            record_account_event("verified");
            VerifyCodeResponse {
                message: format!("Email {} successfully verified", req.email),
                user_id: Some(user_id),
            }
        }
        VerifyOutcome::AlreadyVerified => VerifyCodeResponse {
            message: "Email associated with account is already verified".to_string(),
            user_id: None,
        },
    };

    Ok(Json(response))
}

/// Reset a forgotten password with an emailed code
#[utoipa::path(
    post,
    path = "/resetPassword",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced and all sessions revoked", body = MessageResponse),
        (status = 400, description = "Missing fields or no active code", body = ErrorResponse),
        (status = 401, description = "Code mismatch", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse),
        (status = 410, description = "Code expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .reset_forgotten_password(&req.email, &req.otp, &Password::new(req.password))
        .await?;
    record_account_event("password_reset");

    Ok(Json(MessageResponse::new(
        "Password reset successfully. All active session logged Out.",
    )))
}

/// Change the password of the signed-in user
#[utoipa::path(
    post,
    path = "/changePassword",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed; the returned session is the only live one", body = ChangePasswordResponse),
        (status = 400, description = "Missing password or bad userId header", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Account",
    security(("session_id" = []), ("user_id" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AppError> {
    let changed = state
        .accounts
        .change_password(user_id, &Password::new(req.password))
        .await?;
    record_account_event("password_changed");

    Ok(Json(ChangePasswordResponse {
        message: "Password reset successfully. All sessions logged out.".to_string(),
        session_id: changed.session_id,
        user_id: changed.user_id,
    }))
}
