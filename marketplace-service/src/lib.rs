pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, MarketplaceConfig};
use crate::dtos::ErrorResponse;
use crate::middleware::{
    metrics_middleware, session_validation_middleware, SESSION_HEADER, USER_ID_HEADER,
};
use crate::services::{AccountService, ListingService, SessionStore};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::account::signup,
        handlers::account::login,
        handlers::account::send_verification_code,
        handlers::account::verify_code,
        handlers::account::reset_password,
        handlers::account::change_password,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::profile::delete_user,
        handlers::listings::browse_listings,
        handlers::listings::user_listings,
        handlers::listings::create_listing,
        handlers::listings::update_listing,
        handlers::listings::delete_listing,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::account::SignupRequest,
            dtos::account::SignupResponse,
            dtos::account::LoginRequest,
            dtos::account::LoginResponse,
            dtos::account::SendCodeRequest,
            dtos::account::VerifyCodeRequest,
            dtos::account::VerifyCodeResponse,
            dtos::account::ResetPasswordRequest,
            dtos::account::ChangePasswordRequest,
            dtos::account::ChangePasswordResponse,
            dtos::profile::UpdateProfileRequest,
            dtos::profile::UpdateProfileResponse,
            dtos::listing::CreateListingForm,
            dtos::listing::UpdateListingForm,
            models::UserProfile,
            models::Listing,
            models::ListingImage,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Account", description = "Signup, login, email verification and passwords"),
        (name = "User", description = "Profile maintenance"),
        (name = "Listings", description = "Marketplace listings and images"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-ID"))),
            );
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("userId"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MarketplaceConfig>,
    pub accounts: AccountService,
    pub listings: ListingService,
    pub sessions: Arc<dyn SessionStore>,
}

fn cors_layer(config: &MarketplaceConfig) -> CorsLayer {
    let allow_origin = if config.security.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins(config))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn allowed_origins(config: &MarketplaceConfig) -> Vec<HeaderValue> {
    config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect()
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.listings.max_upload_bytes;

    let protected = Router::new()
        .route("/changePassword", post(handlers::account::change_password))
        .route(
            "/user/profile",
            get(handlers::profile::get_profile).post(handlers::profile::update_profile),
        )
        .route("/user/deleteUser", delete(handlers::profile::delete_user))
        .route(
            "/listings",
            get(handlers::listings::browse_listings).post(handlers::listings::create_listing),
        )
        .route("/listings/user", get(handlers::listings::user_listings))
        .route("/listing/updateListing", put(handlers::listings::update_listing))
        .route("/listing/deleteListing", delete(handlers::listings::delete_listing))
        .layer(from_fn_with_state(
            state.clone(),
            session_validation_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/signup", post(handlers::account::signup))
        .route("/login", post(handlers::account::login))
        .route(
            "/sendEmailVerificationCode",
            post(handlers::account::send_verification_code),
        )
        .route(
            "/verifyEmailVerificationCode",
            post(handlers::account::verify_code),
        )
        .route("/resetPassword", post(handlers::account::reset_password))
        .merge(protected);

    // Interactive docs only outside production; the JSON stays reachable.
    if state.config.environment == Environment::Dev {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = cors_layer(&state.config);

    app.with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                user_id = tracing::field::Empty,
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.accounts.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
