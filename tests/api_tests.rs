//! HTTP tests for login, refresh and protected-resource access.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tollgate::{
    ServerConfig,
    auth::TokenPair,
    clock::ManualClock,
    create_app,
    db::Database,
    jwt::TokenSettings,
    password::MIN_BCRYPT_COST,
    secrets::SigningSecrets,
};
use tower::ServiceExt;

const NOW: u64 = 1_700_000_000;

/// Create a test app backed by an in-memory database seeded with testuser/password123.
async fn create_test_app() -> (axum::Router, Arc<ManualClock>) {
    let db = Database::open(":memory:", MIN_BCRYPT_COST)
        .await
        .expect("Failed to open test database");
    db.users()
        .create("testuser", "password123")
        .await
        .expect("Failed to create test user");

    let clock = Arc::new(ManualClock::new(NOW));
    let config = ServerConfig {
        store: Arc::new(db),
        secrets: SigningSecrets::new(
            "test-access-secret-that-is-long-enough",
            "test-refresh-secret-that-is-long-enough",
        )
        .expect("Invalid test secrets"),
        token_settings: TokenSettings::default(),
        clock: clock.clone(),
    };
    (create_app(&config), clock)
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

fn refresh_request_query(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/refresh?refresh_token={}", refresh_token))
        .body(Body::empty())
        .unwrap()
}

fn refresh_request_json(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/refresh")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "refresh_token": refresh_token }).to_string(),
        ))
        .unwrap()
}

fn protected_request(access_token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/protected")
        .header("authorization", format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &axum::Router) -> TokenPair {
    let response = app
        .clone()
        .oneshot(login_request("testuser", "password123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(body_json(response).await).unwrap()
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(login_request("testuser", "password123"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert!(json["access_token"].as_str().is_some());
    assert!(json["refresh_token"].as_str().is_some());
    assert_ne!(json["access_token"], json["refresh_token"]);
}

#[tokio::test]
async fn test_login_username_is_case_insensitive() {
    let (app, _) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(login_request("TestUser", "password123"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let pair: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
    let response = app
        .oneshot(protected_request(&pair.access_token))
        .await
        .unwrap();

    // Subject is the stored username
    assert_eq!(body_json(response).await["message"], "Welcome, testuser!");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = create_test_app().await;

    let wrong_password = app
        .clone()
        .oneshot(login_request("testuser", "wrongpass"))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(login_request("nouser", "anything"))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.headers()[header::WWW_AUTHENTICATE],
        unknown_user.headers()[header::WWW_AUTHENTICATE]
    );

    let wrong_password = body_json(wrong_password).await;
    let unknown_user = body_json(unknown_user).await;
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["error"], "Incorrect username or password");
}

#[tokio::test]
async fn test_login_malformed_body_rejected() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"username": "testuser"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::OK);
}

// =============================================================================
// Protected resource
// =============================================================================

#[tokio::test]
async fn test_protected_with_access_token() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    let response = app
        .oneshot(protected_request(&pair.access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Welcome, testuser!");
}

#[tokio::test]
async fn test_protected_with_refresh_token_rejected() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    let response = app
        .oneshot(protected_request(&pair.refresh_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body_json(response).await["error"], "Invalid access token");
}

#[tokio::test]
async fn test_protected_with_invalid_token_rejected() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(protected_request("invalid-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid access token");
}

#[tokio::test]
async fn test_protected_without_token_rejected() {
    let (app, _) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Not authenticated");
}

#[tokio::test]
async fn test_protected_with_expired_access_token_rejected() {
    let (app, clock) = create_test_app().await;
    let pair = login(&app).await;

    clock.advance(15 * 60);

    let response = app
        .oneshot(protected_request(&pair.access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid access token");
}

#[tokio::test]
async fn test_protected_access_token_reusable() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(protected_request(&pair.access_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_via_query_parameter() {
    let (app, clock) = create_test_app().await;
    let pair = login(&app).await;

    clock.advance(60);

    let response = app
        .clone()
        .oneshot(refresh_request_query(&pair.refresh_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let refreshed: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(refreshed.token_type, "bearer");
    assert_ne!(refreshed.access_token, pair.access_token);
    assert_ne!(refreshed.refresh_token, pair.refresh_token);

    let response = app
        .oneshot(protected_request(&refreshed.access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Welcome, testuser!");
}

#[tokio::test]
async fn test_refresh_via_json_body() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    let response = app
        .oneshot(refresh_request_json(&pair.refresh_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_after_access_token_expired() {
    let (app, clock) = create_test_app().await;
    let pair = login(&app).await;

    clock.advance(60 * 60);

    let response = app
        .oneshot(refresh_request_query(&pair.refresh_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    let response = app
        .oneshot(refresh_request_query(&pair.access_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_with_expired_token_rejected() {
    let (app, clock) = create_test_app().await;
    let pair = login(&app).await;

    clock.advance(7 * 24 * 60 * 60);

    let response = app
        .oneshot(refresh_request_query(&pair.refresh_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_failures_are_indistinguishable() {
    let (app, clock) = create_test_app().await;
    let pair = login(&app).await;

    let wrong_context = app
        .clone()
        .oneshot(refresh_request_query(&pair.access_token))
        .await
        .unwrap();
    let garbage = app
        .clone()
        .oneshot(refresh_request_query("not-a-token"))
        .await
        .unwrap();
    let missing = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    clock.advance(7 * 24 * 60 * 60);
    let expired = app
        .oneshot(refresh_request_query(&pair.refresh_token))
        .await
        .unwrap();

    let mut bodies = Vec::new();
    for response in [wrong_context, garbage, missing, expired] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_json(response).await);
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

// =============================================================================
// Config
// =============================================================================

#[tokio::test]
async fn test_config_reports_token_settings() {
    let (app, _) = create_test_app().await;
    let pair = login(&app).await;

    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::OK);

    let json = body_json(anonymous).await;
    assert_eq!(json["authenticated"], false);
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["access_token_ttl"], 15 * 60);
    assert_eq!(json["refresh_token_ttl"], 7 * 24 * 60 * 60);

    let authenticated = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/config")
                .header("authorization", format!("Bearer {}", pair.access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(authenticated).await["authenticated"], true);
}
