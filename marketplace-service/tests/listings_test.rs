mod common;

use axum::http::{Method, StatusCode};
use common::{multipart_body, TestApp};
use serde_json::Value;

async fn create_lamp(app: &TestApp, user_id: i64, session_id: &str) -> Value {
    let form = multipart_body(
        &[
            ("productName", "Desk lamp"),
            ("productDescription", "Warm light"),
            ("price", "12.5"),
            ("category", "Furniture"),
        ],
        &[("lamp.png", &b"png-bytes"[..])],
    );
    let (status, body) = app
        .authed_multipart(Method::POST, "/listings", session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body
}

#[tokio::test]
async fn test_create_returns_callers_listings_with_images() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    let body = create_lamp(&app, user_id, &session_id).await;
    let listings = body.as_array().unwrap();
    assert_eq!(listings.len(), 1);

    let lamp = &listings[0];
    assert_eq!(lamp["productName"], "Desk lamp");
    assert_eq!(lamp["productDescription"], "Warm light");
    assert_eq!(lamp["price"], 12.5);
    assert_eq!(lamp["category"], "Furniture");
    assert_eq!(lamp["userId"], user_id);
    assert_eq!(lamp["userName"], "Alice");
    assert_eq!(lamp["userEmail"], "alice@ufl.edu");

    let images = lamp["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["contentType"], "image/png");
    assert_eq!(images[0]["data"], "cG5nLWJ5dGVz");
}

#[tokio::test]
async fn test_browse_excludes_own_listings() {
    let app = TestApp::new();
    let (alice_id, alice_session) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;
    let (bob_id, bob_session) = app.verified_user("Bob", "bob@ufl.edu", "pw2").await;
    create_lamp(&app, alice_id, &alice_session).await;

    let (status, body) = app
        .authed(Method::GET, "/listings", &alice_session, alice_id, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, body) = app
        .authed(Method::GET, "/listings", &bob_session, bob_id, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["userName"], "Alice");
}

#[tokio::test]
async fn test_oversized_image_is_skipped() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    let big = vec![7u8; 65];
    let form = multipart_body(
        &[("productName", "Poster"), ("price", "3")],
        &[("big.png", big.as_slice()), ("small.png", &b"ok"[..])],
    );
    let (status, body) = app
        .authed_multipart(Method::POST, "/listings", &session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["images"].as_array().unwrap().len(), 1);
    assert_eq!(body[0]["images"][0]["data"], "b2s=");
}

#[tokio::test]
async fn test_create_rejects_bad_price_and_missing_name() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    for price in ["free", "-1", ""] {
        let form = multipart_body(&[("productName", "Lamp"), ("price", price)], &[]);
        let (status, body) = app
            .authed_multipart(Method::POST, "/listings", &session_id, user_id, form)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price:?}");
        assert_eq!(body["error"], "Invalid price");
    }

    let form = multipart_body(&[("price", "5")], &[]);
    let (status, body) = app
        .authed_multipart(Method::POST, "/listings", &session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product name is required");
}

#[tokio::test]
async fn test_update_patches_fields_and_replaces_images() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;
    let created = create_lamp(&app, user_id, &session_id).await;
    let listing_id = created[0]["id"].as_i64().unwrap().to_string();

    let form = multipart_body(
        &[("listingId", listing_id.as_str()), ("price", "9"), ("category", "")],
        &[],
    );
    let (status, body) = app
        .authed_multipart(Method::PUT, "/listing/updateListing", &session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Listing updated successfully");

    let (_, mine) = app
        .authed(Method::GET, "/listings/user", &session_id, user_id, None)
        .await;
    assert_eq!(mine[0]["price"], 9.0);
    assert_eq!(mine[0]["category"], "Furniture");
    assert_eq!(mine[0]["productName"], "Desk lamp");
    assert_eq!(mine[0]["images"].as_array().unwrap().len(), 1);

    let form = multipart_body(
        &[("listingId", listing_id.as_str())],
        &[("a.png", &b"one"[..]), ("b.png", &b"two"[..])],
    );
    let (status, _) = app
        .authed_multipart(Method::PUT, "/listing/updateListing", &session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, mine) = app
        .authed(Method::GET, "/listings/user", &session_id, user_id, None)
        .await;
    let images = mine[0]["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["data"], "b25l");
}

#[tokio::test]
async fn test_only_the_owner_may_change_a_listing() {
    let app = TestApp::new();
    let (alice_id, alice_session) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;
    let (bob_id, bob_session) = app.verified_user("Bob", "bob@ufl.edu", "pw2").await;
    let created = create_lamp(&app, alice_id, &alice_session).await;
    let listing_id = created[0]["id"].as_i64().unwrap();

    let id_field = listing_id.to_string();
    let form = multipart_body(&[("listingId", id_field.as_str()), ("price", "1")], &[]);
    let (status, body) = app
        .authed_multipart(Method::PUT, "/listing/updateListing", &bob_session, bob_id, form)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = app
        .authed(
            Method::DELETE,
            &format!("/listing/deleteListing?listingId={listing_id}"),
            &bob_session,
            bob_id,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, mine) = app
        .authed(Method::GET, "/listings/user", &alice_session, alice_id, None)
        .await;
    assert_eq!(mine[0]["price"], 12.5);
}

#[tokio::test]
async fn test_delete_listing() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;
    let created = create_lamp(&app, user_id, &session_id).await;
    let listing_id = created[0]["id"].as_i64().unwrap();
    let path = format!("/listing/deleteListing?listingId={listing_id}");

    let (status, body) = app
        .authed(Method::DELETE, &path, &session_id, user_id, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Listing deleted successfully");

    let (status, body) = app
        .authed(Method::DELETE, &path, &session_id, user_id, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Listing not found");
}

#[tokio::test]
async fn test_bad_listing_id_is_400() {
    let app = TestApp::new();
    let (user_id, session_id) = app.verified_user("Alice", "alice@ufl.edu", "pw1").await;

    let (status, body) = app
        .authed(
            Method::DELETE,
            "/listing/deleteListing?listingId=abc",
            &session_id,
            user_id,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid listingId");

    let form = multipart_body(&[("price", "1")], &[]);
    let (status, _) = app
        .authed_multipart(Method::PUT, "/listing/updateListing", &session_id, user_id, form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
