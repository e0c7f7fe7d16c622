mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, json_body, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn create_order_computes_totals_server_side() {
    let app = TestApp::new().await;
    let water = app.seed_product("Mineral Water 1.5L", dec!(25.00), Some(500)).await;
    let crisps = app.seed_product("Potato Crisps 150g", dec!(35.00), Some(200)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Corner Shop Alfa",
                "delivery_area": "Central",
                "items": [
                    {"product_id": water, "quantity": 10, "unit_price": "25.00"},
                    {"product_id": crisps, "quantity": 4, "unit_price": "35.00"}
                ]
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;

    let order = &body["data"];
    assert_eq!(order["status"], "pending");
    // 10 * 25 + 4 * 35 = 390
    assert_eq!(decimal_field(&order["total_value"]), dec!(390));
    assert!(order["order_number"]
        .as_str()
        .is_some_and(|n| n.starts_with("SO-")));

    let items = order["items"].as_array().expect("items in create response");
    assert_eq!(items.len(), 2);
    let water_line = items
        .iter()
        .find(|i| i["product_id"] == json!(water))
        .expect("water line");
    assert_eq!(decimal_field(&water_line["total_price"]), dec!(250));
    assert_eq!(water_line["product_name"], "Mineral Water 1.5L");
}

#[tokio::test]
async fn create_order_rejects_empty_items_and_bad_prices() {
    let app = TestApp::new().await;
    let product = app.seed_product("Notebook A5", dec!(28.00), Some(50)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({"customer_name": "Shop", "items": []})),
        )
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": product, "quantity": 2, "unit_price": "0"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_checks_stock_without_decrementing_it() {
    let app = TestApp::new().await;
    let scarce = app.seed_product("Laundry Powder 2kg", dec!(180.00), Some(3)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": scarce, "quantity": 5, "unit_price": "180.00"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Within stock succeeds and leaves the stock level untouched
    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": scarce, "quantity": 3, "unit_price": "180.00"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_as_admin(Method::GET, &format!("/api/v1/inventory/{}", scarce), None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["current_stock"], 3);
}

#[tokio::test]
async fn create_order_rejects_unknown_and_inactive_products() {
    let app = TestApp::new().await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": uuid::Uuid::new_v4(), "quantity": 1, "unit_price": "5.00"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let retired = app.seed_product("Retired Item", dec!(10.00), None).await;
    let response = app
        .request_as_admin(Method::DELETE, &format!("/api/v1/products/{}", retired), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": retired, "quantity": 1, "unit_price": "10.00"}]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_people_only_see_their_own_orders() {
    let app = TestApp::new().await;
    let product = app.seed_product("Dish Soap 750ml", dec!(65.00), Some(100)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Kiosk Gamma",
                "items": [{"product_id": product, "quantity": 2, "unit_price": "65.00"}]
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    let order_id = body["data"]["id"].as_str().expect("order id").to_string();

    // The other sales account gets a 403 on direct access
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order_id),
            None,
            Some(app.sales2_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And an empty list
    let response = app
        .request(Method::GET, "/api/v1/orders", None, Some(app.sales2_token()))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 0);

    // Admin sees everything
    let response = app
        .request_as_admin(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_status_follows_the_lifecycle_graph() {
    let app = TestApp::new().await;
    let product = app.seed_product("Orange Juice 1L", dec!(48.00), Some(100)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": product, "quantity": 1, "unit_price": "48.00"}]
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    let order_id = body["data"]["id"].as_str().expect("order id").to_string();
    let status_uri = format!("/api/v1/orders/{}/status", order_id);

    // pending -> delivered skips processing and is rejected
    let response = app
        .request_as_sales(Method::PUT, &status_uri, Some(json!({"status": "delivered"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_sales(Method::PUT, &status_uri, Some(json!({"status": "processing"})))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "processing");
    assert!(body["data"]["delivery_date"].is_null());

    let response = app
        .request_as_sales(Method::PUT, &status_uri, Some(json!({"status": "delivered"})))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "delivered");
    assert!(body["data"]["delivery_date"].is_string());

    // Delivered is terminal
    let response = app
        .request_as_sales(Method::PUT, &status_uri, Some(json!({"status": "cancelled"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown statuses are rejected outright
    let response = app
        .request_as_sales(Method::PUT, &status_uri, Some(json!({"status": "shipped"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_creation_bumps_customer_aggregates() {
    let app = TestApp::new().await;
    let product = app.seed_product("Salted Peanuts 200g", dec!(42.00), Some(100)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/customers",
            Some(json!({"name": "Mini Market Beta"})),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    let customer_id = body["data"]["id"].as_str().expect("customer id").to_string();
    assert_eq!(body["data"]["total_orders"], 0);

    for _ in 0..2 {
        let response = app
            .request_as_sales(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "customer_name": "Mini Market Beta",
                    "items": [{"product_id": product, "quantity": 5, "unit_price": "42.00"}]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_as_sales(Method::GET, &format!("/api/v1/customers/{}", customer_id), None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 2);
    assert_eq!(decimal_field(&body["data"]["total_spent"]), dec!(420));
    assert!(body["data"]["last_order_date"].is_string());
}

#[tokio::test]
async fn order_summaries_reflect_visible_orders() {
    let app = TestApp::new().await;
    let product = app.seed_product("Mineral Water 500ml", dec!(12.50), Some(1000)).await;

    for quantity in [2, 4] {
        let response = app
            .request_as_sales(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "customer_name": "Shop",
                    "items": [{"product_id": product, "quantity": quantity, "unit_price": "12.50"}]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_as_sales(Method::GET, "/api/v1/orders/summary", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 2);
    assert_eq!(body["data"]["pending_orders"], 2);
    assert_eq!(decimal_field(&body["data"]["total_value"]), dec!(75));

    let response = app
        .request_as_sales(Method::GET, "/api/v1/orders/daily-summary", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total_orders"], 2);
    assert_eq!(decimal_field(&body["data"]["total_value"]), dec!(75));
}

#[tokio::test]
async fn order_list_filters_by_status() {
    let app = TestApp::new().await;
    let product = app.seed_product("Filter Test Item", dec!(10.00), Some(100)).await;

    let response = app
        .request_as_sales(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Shop",
                "items": [{"product_id": product, "quantity": 1, "unit_price": "10.00"}]
            })),
        )
        .await;
    let body = json_body(response, StatusCode::CREATED).await;
    let order_id = body["data"]["id"].as_str().expect("order id").to_string();

    let response = app
        .request_as_sales(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({"status": "cancelled"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_as_sales(Method::GET, "/api/v1/orders?status=cancelled", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 1);

    let response = app
        .request_as_sales(Method::GET, "/api/v1/orders?status=pending", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 0);

    let response = app
        .request_as_sales(Method::GET, "/api/v1/orders?status=bogus", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
