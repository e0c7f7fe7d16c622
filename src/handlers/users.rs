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
use crate::services::users::{
    CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserListQuery, UserResponse,
    UserStatsResponse,
};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/users",
    summary = "List users",
    description = "Get a paginated list of all user accounts (admin only)",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("role" = Option<String>, Query, description = "Restrict to one role (admin or sales)"),
        ("include_inactive" = Option<bool>, Query, description = "Also list disabled accounts (default: false)"),
    ),
    responses(
        (status = 200, description = "Users retrieved", body = ApiResponse<PaginatedResponse<UserResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserResponse>>>, ServiceError> {
    let users = state.services.users.list_users(query).await?;
    Ok(Json(ApiResponse::success(users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/sales",
    summary = "List sales users",
    description = "Get the active sales accounts, for assignment dropdowns",
    responses(
        (status = 200, description = "Sales users retrieved", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_sales_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ServiceError> {
    let users = state.services.users.list_sales_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/stats",
    summary = "User statistics",
    description = "Account counts by role and status (admin only)",
    responses(
        (status = 200, description = "Stats retrieved", body = ApiResponse<UserStatsResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn user_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserStatsResponse>>, ServiceError> {
    let stats = state.services.users.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    summary = "Get user",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User retrieved", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    summary = "Create user",
    description = "Create a new account (admin only)",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let user = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    summary = "Update user",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let user = state.services.users.update_user(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(user))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    summary = "Deactivate user",
    description = "Soft-deletes an account by disabling it. Admins cannot remove themselves.",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Cannot delete own account", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    state
        .services
        .users
        .delete_user(id, auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({}),
        "User deactivated".to_string(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/reset-password",
    summary = "Reset password",
    description = "Set a new password for an account without knowing the old one (admin only)",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    state
        .services
        .users
        .reset_password(id, &request.new_password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_message(
            serde_json::json!({}),
            "Password reset".to_string(),
        )),
    ))
}
