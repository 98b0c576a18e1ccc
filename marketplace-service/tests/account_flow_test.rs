mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_signup_verify_login_flow() {
    let app = TestApp::new();

    let user_id = app.signup("Alice", "alice@ufl.edu", "pw1").await;
    assert!(user_id > 0);

    let (status, body) = app.login("alice@ufl.edu", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email is not verified");

    let code = app.issue_code("alice@ufl.edu").await;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email alice@ufl.edu successfully verified");
    assert_eq!(body["userId"], user_id);
    assert!(app.store.code_for(user_id).is_none());

    let (status, body) = app.login("alice@ufl.edu", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@ufl.edu");
    assert_eq!(body["sessionId"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email_look_alike() {
    let app = TestApp::new();
    app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    let (status, wrong_pw) = app.login("alice@ufl.edu", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = app.login("nobody@ufl.edu", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_pw, unknown);
}

#[tokio::test]
async fn test_send_code_message_names_the_lifetime() {
    let app = TestApp::new();
    app.signup("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .post_json(
            "/sendEmailVerificationCode",
            json!({ "email": "alice@ufl.edu" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Verification code sent successfully. Code will be active for 3 minutes."
    );
    assert_eq!(app.mail.sent_count(), 1);
}

#[tokio::test]
async fn test_send_code_to_unknown_email_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/sendEmailVerificationCode",
            json!({ "email": "ghost@ufl.edu" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User does not exist");
    assert_eq!(app.mail.sent_count(), 0);
}

#[tokio::test]
async fn test_mail_failure_is_500_but_code_stays_stored() {
    let app = TestApp::with_failing_mail();
    let user_id = app.signup("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .post_json(
            "/sendEmailVerificationCode",
            json!({ "email": "alice@ufl.edu" }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Email error");
    assert!(app.store.code_for(user_id).is_some());
}

#[tokio::test]
async fn test_expired_code_is_gone_then_removed() {
    let app = TestApp::with_code_ttl(0);
    app.signup("Alice", "alice@ufl.edu", "pw1").await;

    let code = app.issue_code("alice@ufl.edu").await;
    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "Verification code has expired");

    let (status, _) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reissued_code_replaces_the_previous_one() {
    let app = TestApp::new();
    let user_id = app.signup("Alice", "alice@ufl.edu", "pw1").await;

    app.issue_code("alice@ufl.edu").await;
    let first = app.store.code_for(user_id).unwrap();
    let second_code = app.issue_code("alice@ufl.edu").await;
    let second = app.store.code_for(user_id).unwrap();

    assert_eq!(second.code, second_code);
    assert!(second.expires_at >= first.expires_at);

    let (status, _) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": second_code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_without_code_and_with_wrong_code() {
    let app = TestApp::new();
    app.signup("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("No active verification code found"));

    let code = app.issue_code("alice@ufl.edu").await;
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": wrong }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid verification code");
}

#[tokio::test]
async fn test_verify_is_idempotent_once_verified() {
    let app = TestApp::new();
    app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": "999999" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Email associated with account is already verified"
    );
    assert!(body.get("userId").is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.signup("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .post_json(
            "/signup",
            json!({ "name": "Other", "email": "alice@ufl.edu", "password": "pw2" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_signup_requires_every_field() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/signup", json!({ "email": "alice@ufl.edu", "password": "pw1" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email, Name, and Password required");
}

#[tokio::test]
async fn test_malformed_json_is_invalid_payload() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request payload");
}

#[tokio::test]
async fn test_wrong_method_on_public_route_is_405() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            Request::builder()
                .method(Method::GET)
                .uri("/signup")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_store_outage_surfaces_as_500() {
    let app = TestApp::new();
    app.store.set_unavailable(true);

    let (status, body) = app
        .post_json(
            "/signup",
            json!({ "name": "Alice", "email": "alice@ufl.edu", "password": "pw1" }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn test_expired_code_is_gone_when_cleanup_fails() {
    let app = TestApp::with_code_ttl(0);
    let user_id = app.signup("Alice", "alice@ufl.edu", "pw1").await;
    let code = app.issue_code("alice@ufl.edu").await;
    app.store.set_code_delete_failing(true);

    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "Verification code has expired");
    assert!(app.store.code_for(user_id).is_some());
}

#[tokio::test]
async fn test_verify_is_ok_when_cleanup_fails() {
    let app = TestApp::new();
    let user_id = app.signup("Alice", "alice@ufl.edu", "pw1").await;
    let code = app.issue_code("alice@ufl.edu").await;
    app.store.set_code_delete_failing(true);

    let (status, body) = app
        .post_json(
            "/verifyEmailVerificationCode",
            json!({ "email": "alice@ufl.edu", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id);

    let (status, _) = app.login("alice@ufl.edu", "pw1").await;
    assert_eq!(status, StatusCode::OK);
}
