//! SalesDesk API Library
//!
//! Core functionality for the SalesDesk order management API
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod request_id;
pub mod seed;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, 100)
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: request_id::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes, grouped by the role required to reach them
pub fn api_v1_routes() -> Router<AppState> {
    // Login is the only route reachable without a token
    let auth_public = Router::new().route("/auth/login", post(handlers::auth::login));

    let auth_routes = Router::new()
        .route("/auth/profile", get(handlers::auth::get_profile))
        .route("/auth/profile", put(handlers::auth::update_profile))
        .route(
            "/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .with_auth();

    // Sales-person listing backs customer/order assignment dropdowns,
    // so it is open to every authenticated account
    let users_shared = Router::new()
        .route("/users/sales", get(handlers::users::list_sales_users))
        .with_auth();

    // Account administration is admin-only end to end
    let users_admin = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users", post(handlers::users::create_user))
        .route("/users/stats", get(handlers::users::user_stats))
        .route("/users/:id", get(handlers::users::get_user))
        .route("/users/:id", put(handlers::users::update_user))
        .route("/users/:id", delete(handlers::users::delete_user))
        .route(
            "/users/:id/reset-password",
            post(handlers::users::reset_password),
        )
        .with_role(auth::ROLE_ADMIN);

    let products_read = Router::new()
        .route("/products", get(handlers::products::list_products))
        .route(
            "/products/categories",
            get(handlers::products::list_categories),
        )
        .route("/products/:id", get(handlers::products::get_product))
        .with_auth();

    let products_admin = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route("/products/all", get(handlers::products::list_all_products))
        .route("/products/:id", put(handlers::products::update_product))
        .route("/products/:id", delete(handlers::products::delete_product))
        .with_role(auth::ROLE_ADMIN);

    let customers_routes = Router::new()
        .route("/customers", get(handlers::customers::list_customers))
        .route("/customers", post(handlers::customers::create_customer))
        .route("/customers/:id", get(handlers::customers::get_customer))
        .route("/customers/:id", put(handlers::customers::update_customer))
        .route(
            "/customers/:id/refresh-stats",
            post(handlers::customers::refresh_customer_stats),
        )
        .with_auth();

    let customers_admin = Router::new()
        .route(
            "/customers/:id",
            delete(handlers::customers::delete_customer),
        )
        .with_role(auth::ROLE_ADMIN);

    let orders_routes = Router::new()
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/summary", get(handlers::orders::order_summary))
        .route(
            "/orders/daily-summary",
            get(handlers::orders::daily_summary),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .with_auth();

    let inventory_read = Router::new()
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route("/inventory/low-stock", get(handlers::inventory::low_stock))
        .route(
            "/inventory/:product_id",
            get(handlers::inventory::get_inventory),
        )
        .with_auth();

    let inventory_admin = Router::new()
        .route(
            "/inventory/:product_id",
            put(handlers::inventory::upsert_inventory),
        )
        .with_role(auth::ROLE_ADMIN);

    let reports_routes = Router::new()
        .route("/reports/sales", get(handlers::reports::sales_report))
        .with_auth();

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(auth_public)
        .merge(auth_routes)
        .merge(users_shared)
        .merge(users_admin)
        .merge(products_read)
        .merge(products_admin)
        .merge(customers_routes)
        .merge(customers_admin)
        .merge(orders_routes)
        .merge(inventory_read)
        .merge(inventory_admin)
        .merge(reports_routes)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "salesdesk-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response = crate::request_id::scope_request_id(
            crate::request_id::RequestId::new("meta-123"),
            async { ApiResponse::success("ok") },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn validation_errors_response_includes_metadata() {
        let response = crate::request_id::scope_request_id(
            crate::request_id::RequestId::new("meta-validation"),
            async { ApiResponse::<()>::validation_errors(vec!["missing".into()]) },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-validation"));
        assert_eq!(response.message.as_deref(), Some("Validation failed"));
    }

    #[test]
    fn paginated_response_computes_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 45, 1, 20);
        assert_eq!(page.total_pages, 3);
        let exact = PaginatedResponse::<i32>::new(vec![], 40, 2, 20);
        assert_eq!(exact.total_pages, 2);
        let empty = PaginatedResponse::<i32>::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn list_query_clamps_page_and_limit() {
        let query = ListQuery {
            page: 0,
            limit: 10_000,
            search: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 100);
    }
}
