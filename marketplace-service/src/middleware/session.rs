use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::AppState;

/// Header names are matched case-insensitively.
pub const SESSION_HEADER: &str = "x-session-id";
pub const USER_ID_HEADER: &str = "userid";

fn parse_user_id(headers: &HeaderMap) -> Result<i64, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid userId header")))
}

/// Admits a request only if `X-Session-ID` names a live session owned by the
/// user in the `userId` header. The request is forwarded untouched.
pub async fn session_validation_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Session-ID missing")))?;

    let user_id = parse_user_id(req.headers())?;

    match state.sessions.validate_session(token, user_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(user_id, "Rejected request with unknown session");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid session: no active session for this user"
            )));
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "Session lookup failed");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid session: session could not be verified"
            )));
        }
    }

    Ok(next.run(req).await)
}

/// Caller identity for handlers behind the session gate. Extraction fills
/// the `user_id` field of the `http_request` span opened in `build_router`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parse_user_id(&parts.headers)?;
        tracing::Span::current().record("user_id", user_id);
        Ok(SessionUser(user_id))
    }
}
