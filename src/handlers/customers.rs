use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::common;
use crate::services::customers::{
    CreateCustomerRequest, CustomerListQuery, CustomerResponse, UpdateCustomerRequest,
};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    description = "Get a paginated list of customers. Sales accounts only see their own book.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Match against customer name"),
        ("created_by" = Option<Uuid>, Query, description = "Filter by owning sales person (admins only, ignored otherwise)"),
    ),
    responses(
        (status = 200, description = "Customers retrieved", body = ApiResponse<PaginatedResponse<CustomerResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<CustomerResponse>>>, ServiceError> {
    let customers = state
        .services
        .customers
        .list_customers(&auth_user, query)
        .await?;
    Ok(Json(ApiResponse::success(customers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    summary = "Get customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer retrieved", body = ApiResponse<CustomerResponse>),
        (status = 403, description = "Customer belongs to another sales person", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.get_customer(id, &auth_user).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Create customer",
    description = "Add a customer owned by the calling account",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<CustomerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "You already have a customer with that name", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_customer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let customer = state
        .services
        .customers
        .create_customer(&auth_user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    summary = "Update customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResponse>),
        (status = 403, description = "Customer belongs to another sales person", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "You already have a customer with that name", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let customer = state
        .services
        .customers
        .update_customer(id, &auth_user, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(customer))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    summary = "Delete customer",
    description = "Permanently remove a customer (admin only). Orders are unaffected since they reference customers by name.",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({}),
        "Customer deleted".to_string(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/refresh-stats",
    summary = "Refresh customer stats",
    description = "Recompute the customer's order aggregates from their owner's orders",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Stats refreshed", body = ApiResponse<CustomerResponse>),
        (status = 403, description = "Customer belongs to another sales person", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn refresh_customer_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CustomerResponse>>, ServiceError> {
    let customer = state.services.customers.refresh_stats(id, &auth_user).await?;
    Ok(Json(ApiResponse::success(customer)))
}
