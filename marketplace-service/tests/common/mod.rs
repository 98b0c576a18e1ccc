//! Shared setup for the router-level integration tests: the real router
//! wired to `InMemoryStore` and `MockEmailService`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use marketplace_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, ListingConfig, MarketplaceConfig, OtpConfig, SecurityConfig,
        SmtpConfig,
    },
    services::{AccountService, InMemoryStore, ListingService, MockEmailService},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "marketplace-test-boundary";

pub fn test_config(code_ttl_seconds: i64) -> MarketplaceConfig {
    MarketplaceConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "marketplace-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            username: "test".to_string(),
            password: "test".to_string(),
            sender: "noreply@example.com".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        otp: OtpConfig {
            expiry_seconds: code_ttl_seconds,
        },
        listings: ListingConfig {
            max_upload_bytes: 1 << 20,
            max_image_bytes: 64,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub mail: Arc<MockEmailService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(180, MockEmailService::new())
    }

    /// A zero TTL makes every issued code expired on first use.
    pub fn with_code_ttl(seconds: i64) -> Self {
        Self::build(seconds, MockEmailService::new())
    }

    pub fn with_failing_mail() -> Self {
        Self::build(180, MockEmailService::failing())
    }

    fn build(code_ttl_seconds: i64, mail: MockEmailService) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();

        let store = Arc::new(InMemoryStore::new());
        let mail = Arc::new(mail);
        let config = Arc::new(test_config(code_ttl_seconds));

        let accounts = AccountService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            mail.clone(),
            chrono::Duration::seconds(code_ttl_seconds),
        );
        let state = AppState {
            config,
            accounts,
            listings: ListingService::new(store.clone()),
            sessions: store.clone(),
        };

        Self {
            router: build_router(state),
            store,
            mail,
        }
    }

    /// Sends a request; the body is parsed as JSON when possible, otherwise
    /// returned as a JSON string (or null when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Request carrying the session headers checked by the gate.
    pub async fn authed(
        &self,
        method: Method,
        path: &str,
        session_id: &str,
        user_id: i64,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header("X-Session-ID", session_id)
            .header("userId", user_id.to_string());

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn authed_multipart(
        &self,
        method: Method,
        path: &str,
        session_id: &str,
        user_id: i64,
        body: Vec<u8>,
    ) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(path)
                .header("X-Session-ID", session_id)
                .header("userId", user_id.to_string())
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/signup",
                json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["userId"].as_i64().expect("userId")
    }

    /// Issues a code through the API and returns what the mailer recorded.
    pub async fn issue_code(&self, email: &str) -> String {
        let (status, body) = self
            .post_json("/sendEmailVerificationCode", json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK, "code issue failed: {body}");
        self.mail.last_code_for(email).expect("code was mailed")
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json("/login", json!({ "email": email, "password": password }))
            .await
    }

    /// Signs up, verifies and logs in. Returns (user id, session id).
    pub async fn verified_user(&self, name: &str, email: &str, password: &str) -> (i64, String) {
        let user_id = self.signup(name, email, password).await;
        let code = self.issue_code(email).await;
        let (status, _) = self
            .post_json(
                "/verifyEmailVerificationCode",
                json!({ "email": email, "code": code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK);
        (
            user_id,
            body["sessionId"].as_str().expect("sessionId").to_string(),
        )
    }
}

/// Hand-built multipart body: text fields, then `images` file parts.
pub fn multipart_body(fields: &[(&str, &str)], images: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, data) in images {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
