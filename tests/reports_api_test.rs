mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, json_body, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

async fn place_order(app: &TestApp, token: &str, product: uuid::Uuid, quantity: i32, price: &str) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Report Shop",
                "items": [{"product_id": product, "quantity": quantity, "unit_price": price}]
            })),
            Some(token),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    body["data"]["id"].as_str().expect("order id").to_string()
}

#[tokio::test]
async fn sales_report_totals_and_rankings() {
    let app = TestApp::new().await;
    let tea = app.seed_product("Report Tea", dec!(50.00), Some(1000)).await;
    let soap = app.seed_product("Report Soap", dec!(20.00), Some(1000)).await;

    place_order(&app, app.sales_token(), tea, 4, "50.00").await; // 200
    place_order(&app, app.sales_token(), soap, 3, "20.00").await; // 60

    let response = app
        .request_as_sales(Method::GET, "/api/v1/reports/sales?period=month", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    let report = &body["data"];

    assert_eq!(report["period"], "month");
    assert_eq!(report["total_orders"], 2);
    assert_eq!(decimal_field(&report["total_value"]), dec!(260));
    assert_eq!(decimal_field(&report["average_order_value"]), dec!(130));

    // One bucket, since both orders landed in the current ISO week
    let buckets = report["weekly_breakdown"].as_array().expect("buckets");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0]["orders"], 2);
    assert_eq!(decimal_field(&buckets[0]["value"]), dec!(260));

    // Tea outsells soap by value and ranks first
    let top = report["top_products"].as_array().expect("top products");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["product_name"], "Report Tea");
    assert_eq!(top[0]["quantity_sold"], 4);
    assert_eq!(decimal_field(&top[0]["total_value"]), dec!(200));

    // Target progress covers the current calendar month
    assert_eq!(decimal_field(&report["target"]["achieved"]), dec!(260));
    assert!(report["target"]["monthly_target"].is_string() || report["target"]["monthly_target"].is_number());
}

#[tokio::test]
async fn cancelled_orders_never_count() {
    let app = TestApp::new().await;
    let product = app.seed_product("Cancelled Goods", dec!(100.00), Some(100)).await;

    let keep = place_order(&app, app.sales_token(), product, 1, "100.00").await;
    let cancel = place_order(&app, app.sales_token(), product, 9, "100.00").await;
    let _ = keep;

    let response = app
        .request_as_sales(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", cancel),
            Some(json!({"status": "cancelled"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_as_sales(Method::GET, "/api/v1/reports/sales", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 1);
    assert_eq!(decimal_field(&body["data"]["total_value"]), dec!(100));
    assert_eq!(decimal_field(&body["data"]["target"]["achieved"]), dec!(100));
}

#[tokio::test]
async fn report_is_scoped_per_sales_person() {
    let app = TestApp::new().await;
    let product = app.seed_product("Scoped Goods", dec!(10.00), Some(100)).await;

    place_order(&app, app.sales_token(), product, 1, "10.00").await;
    place_order(&app, app.sales2_token(), product, 2, "10.00").await;

    let response = app
        .request_as_sales(Method::GET, "/api/v1/reports/sales", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 1);
    assert_eq!(decimal_field(&body["data"]["total_value"]), dec!(10));

    // Admin aggregates across everyone
    let response = app
        .request_as_admin(Method::GET, "/api/v1/reports/sales", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 2);
    assert_eq!(decimal_field(&body["data"]["total_value"]), dec!(30));
}

#[tokio::test]
async fn unknown_period_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_as_sales(Method::GET, "/api/v1/reports/sales?period=fortnight", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, "/api/v1/reports/sales", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
