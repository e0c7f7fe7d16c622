mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn login_with_username_returns_token_and_user() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "admin", "password": "admin123"})),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["role"], "admin");
    // Logging in stamps the account's last login
    assert!(body["data"]["user"]["last_login"].is_string());
    // Password hash must never leak through the response
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_with_email_works_too() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales1@test.local", "password": "sales123"})),
            None,
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["user"]["username"], "sales1");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "admin", "password": "wrong"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_for_unknown_account_matches_wrong_password_error() {
    let app = TestApp::new().await;

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "ghost", "password": "whatever"})),
            None,
        )
        .await;
    let unknown_body = json_body(unknown, StatusCode::UNAUTHORIZED).await;

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "admin", "password": "wrong"})),
            None,
        )
        .await;
    let wrong_body = json_body(wrong, StatusCode::UNAUTHORIZED).await;

    assert_eq!(unknown_body["message"], wrong_body["message"]);
}

#[tokio::test]
async fn profile_requires_token() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/auth/profile", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_as_sales(Method::GET, "/api/v1/auth/profile", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["username"], "sales1");
}

#[tokio::test]
async fn profile_update_cannot_touch_role() {
    let app = TestApp::new().await;

    let response = app
        .request_as_sales(
            Method::PUT,
            "/api/v1/auth/profile",
            Some(json!({"full_name": "Renamed Rep", "role": "admin"})),
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["full_name"], "Renamed Rep");
    // Unknown fields are ignored and the role stays put
    assert_eq!(body["data"]["role"], "sales");
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let app = TestApp::new().await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({"current_password": "nope", "new_password": "fresh-pass-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({"current_password": "sales123", "new_password": "fresh-pass-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The new password now authenticates
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales1", "password": "fresh-pass-1"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new().await;

    let response = app
        .request_as_sales(Method::POST, "/api/v1/auth/logout", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The same token is rejected from now on
    let response = app
        .request_as_sales(Method::GET, "/api/v1/auth/profile", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Other sessions are unaffected
    let response = app
        .request(
            Method::GET,
            "/api/v1/auth/profile",
            None,
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/auth/profile",
            None,
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
