use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SalesDesk API",
        version = "0.3.0",
        description = r#"
# SalesDesk Order Management API

REST API for a field-sales operation: product catalog, customer book,
sales orders, stock levels and sales reporting.

## Authentication

Log in at `POST /api/v1/auth/login` with a username or email plus
password, then send the returned token on every request:

```
Authorization: Bearer <your-jwt-token>
```

Two roles exist. `sales` accounts work their own customers and orders;
`admin` accounts additionally manage users, the catalog and inventory,
and see all data.

## Error Handling

Failed requests return a consistent envelope with the matching HTTP
status code:

```json
{
  "error": "Not Found",
  "message": "Order with ID ... not found",
  "request_id": "req-abc123",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20,
max 100) query parameters.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Login, profile and session endpoints"),
        (name = "Users", description = "Account administration (admin only)"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Customers", description = "Customer book endpoints"),
        (name = "Orders", description = "Sales order endpoints"),
        (name = "Inventory", description = "Stock level endpoints"),
        (name = "Reports", description = "Sales reporting endpoints")
    ),
    modifiers(&BearerAuth),
    paths(
        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::get_profile,
        crate::handlers::auth::update_profile,
        crate::handlers::auth::change_password,
        crate::handlers::auth::logout,

        // Users
        crate::handlers::users::list_users,
        crate::handlers::users::list_sales_users,
        crate::handlers::users::user_stats,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::reset_password,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::list_all_products,
        crate::handlers::products::list_categories,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::customers::refresh_customer_stats,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_summary,
        crate::handlers::orders::daily_summary,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order_status,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::upsert_inventory,

        // Reports
        crate::handlers::reports::sales_report,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Auth types
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::UpdateProfileRequest,

            // User types
            crate::services::users::UserResponse,
            crate::services::users::UserStatsResponse,
            crate::services::users::CreateUserRequest,
            crate::services::users::UpdateUserRequest,
            crate::services::users::ChangePasswordRequest,
            crate::services::users::ResetPasswordRequest,

            // Product types
            crate::services::products::ProductResponse,
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,

            // Customer types
            crate::services::customers::CustomerResponse,
            crate::services::customers::CreateCustomerRequest,
            crate::services::customers::UpdateCustomerRequest,

            // Order types
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderItemInput,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderSummaryResponse,
            crate::services::orders::DailySummaryResponse,

            // Inventory types
            crate::services::inventory::InventoryResponse,
            crate::services::inventory::UpsertInventoryRequest,

            // Report types
            crate::services::reports::SalesReportResponse,
            crate::services::reports::WeeklyBucket,
            crate::services::reports::TopProduct,
            crate::services::reports::TargetProgress,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_core_paths() {
        let doc = ApiDocV1::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/auth/login"));
        assert!(paths.contains_key("/api/v1/orders"));
        assert!(paths.contains_key("/api/v1/reports/sales"));
        assert!(paths.contains_key("/api/v1/inventory/{product_id}"));
    }
}
