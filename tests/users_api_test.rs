mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn user_administration_is_admin_only() {
    let app = TestApp::new().await;

    let response = app.request_as_sales(Method::GET, "/api/v1/users", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.request_as_admin(Method::GET, "/api/v1/users", None).await;
    let body = json_body(response, StatusCode::OK).await;
    // admin, sales1 and sales2 from the harness
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn create_user_enforces_role_and_uniqueness() {
    let app = TestApp::new().await;

    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "username": "newrep",
                "email": "newrep@test.local",
                "password": "rep-pass-1",
                "full_name": "New Rep",
                "role": "sales"
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    assert_eq!(body["data"]["username"], "newrep");
    assert_eq!(body["data"]["is_active"], true);

    // Duplicate username
    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "username": "newrep",
                "email": "other@test.local",
                "password": "rep-pass-1",
                "full_name": "Other Rep",
                "role": "sales"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Unknown role
    let response = app
        .request_as_admin(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "username": "oddball",
                "email": "oddball@test.local",
                "password": "odd-pass-1",
                "full_name": "Odd Ball",
                "role": "superuser"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The new account can log in right away
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "newrep", "password": "rep-pass-1"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_disables_instead_of_removing() {
    let app = TestApp::new().await;

    // Self-deletion is refused
    let response = app
        .request_as_admin(Method::DELETE, &format!("/api/v1/users/{}", app.admin_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_admin(Method::DELETE, &format!("/api/v1/users/{}", app.sales_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The row survives as a disabled account
    let response = app
        .request_as_admin(Method::GET, &format!("/api/v1/users/{}", app.sales_id), None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["is_active"], false);

    // The default listing hides it, include_inactive brings it back
    let response = app.request_as_admin(Method::GET, "/api/v1/users", None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 2);
    let response = app
        .request_as_admin(Method::GET, "/api/v1/users?include_inactive=true", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 3);

    // Disabled accounts cannot log in, and the message is the same one
    // a wrong password produces
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales1", "password": "sales123"})),
            None,
        )
        .await;
    let disabled_body = json_body(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales2", "password": "not-the-password"})),
            None,
        )
        .await;
    let wrong_password_body = json_body(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(disabled_body["message"], wrong_password_body["message"]);
}

#[tokio::test]
async fn admin_resets_passwords_without_the_old_one() {
    let app = TestApp::new().await;

    let response = app
        .request_as_admin(
            Method::POST,
            &format!("/api/v1/users/{}/reset-password", app.sales_id),
            Some(json!({"new_password": "issued-by-admin-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales1", "password": "issued-by-admin-1"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"identifier": "sales1", "password": "sales123"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_updates_apply_partially_and_check_conflicts() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/users/{}", app.sales_id);

    let response = app
        .request_as_admin(Method::PUT, &uri, Some(json!({"full_name": "Promoted Rep", "role": "admin"})))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["full_name"], "Promoted Rep");
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["username"], "sales1");

    // Email collisions with another account are rejected
    let response = app
        .request_as_admin(Method::PUT, &uri, Some(json!({"email": "sales2@test.local"})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stats_and_sales_listing_reflect_accounts() {
    let app = TestApp::new().await;

    let response = app.request_as_admin(Method::GET, "/api/v1/users/stats", None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_users"], 3);
    assert_eq!(body["data"]["active_users"], 3);
    assert_eq!(body["data"]["admin_count"], 1);
    assert_eq!(body["data"]["sales_count"], 2);

    let response = app
        .request_as_admin(Method::GET, "/api/v1/users?role=sales", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 2);

    let response = app
        .request_as_admin(Method::GET, "/api/v1/users?role=superuser", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.request_as_admin(Method::GET, "/api/v1/users/sales", None).await;
    let body = json_body(response, StatusCode::OK).await;
    let sales = body["data"].as_array().expect("sales list");
    assert_eq!(sales.len(), 2);
    assert!(sales.iter().all(|u| u["role"] == "sales"));

    // Not an admin-only listing, sales accounts use it for assignment pickers
    let response = app.request_as_sales(Method::GET, "/api/v1/users/sales", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
