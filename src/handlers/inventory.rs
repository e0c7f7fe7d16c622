use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::common;
use crate::services::inventory::{InventoryResponse, UpsertInventoryRequest};
use crate::{ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    summary = "List inventory",
    description = "All stock records joined with product names, most recently updated first",
    responses(
        (status = 200, description = "Inventory retrieved", body = ApiResponse<Vec<InventoryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryResponse>>>, ServiceError> {
    let records = state.services.inventory.list_inventory().await?;
    Ok(Json(ApiResponse::success(records)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    summary = "Low stock",
    description = "Stock records at or below their minimum threshold",
    responses(
        (status = 200, description = "Low-stock records retrieved", body = ApiResponse<Vec<InventoryResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryResponse>>>, ServiceError> {
    let records = state.services.inventory.low_stock().await?;
    Ok(Json(ApiResponse::success(records)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{product_id}",
    summary = "Get inventory",
    description = "Stock record for one product",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Record retrieved", body = ApiResponse<InventoryResponse>),
        (status = 404, description = "No inventory record for product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InventoryResponse>>, ServiceError> {
    let record = state.services.inventory.get_by_product(product_id).await?;
    Ok(Json(ApiResponse::success(record)))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{product_id}",
    summary = "Upsert inventory",
    description = "Create or replace the stock record for a product (admin only). Idempotent per product.",
    params(("product_id" = Uuid, Path, description = "Product id")),
    request_body = UpsertInventoryRequest,
    responses(
        (status = 200, description = "Record saved", body = ApiResponse<InventoryResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn upsert_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpsertInventoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let record = state
        .services
        .inventory
        .upsert_inventory(product_id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(record))))
}
