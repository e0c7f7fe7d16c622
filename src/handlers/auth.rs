use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::common;
use crate::services::users::{ChangePasswordRequest, UpdateUserRequest, UserResponse, UserService};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 120, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Log in",
    description = "Authenticate with username or email plus password and receive an access token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<LoginResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    let user = state
        .services
        .users
        .authenticate(&request.identifier, &request.password)
        .await?;

    let (token, _claims) = state
        .services
        .auth
        .generate_token(&user)
        .map_err(|e| ServiceError::JwtError(e.to_string()))?;

    let response = LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.services.auth.token_expiration_seconds(),
        user: UserService::model_to_response(user),
    };
    Ok((StatusCode::OK, Json(ApiResponse::success(response))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    summary = "Get profile",
    description = "Return the authenticated user's account",
    responses(
        (status = 200, description = "Profile retrieved", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    let user = state.services.users.get_user(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    summary = "Update profile",
    description = "Update the authenticated user's contact details",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    if let Err(validation_errors) = request.validate() {
        let errors = common::validation_messages(&validation_errors);
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(errors)),
        ));
    }

    // Profile updates never touch role or active status
    let update = UpdateUserRequest {
        email: request.email,
        full_name: request.full_name,
        role: None,
        phone: request.phone,
        is_active: None,
    };
    let user = state
        .services
        .users
        .update_user(auth_user.user_id, update)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    summary = "Change password",
    description = "Change the authenticated user's password after verifying the current one",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
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
        .change_password(
            auth_user.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_message(
            serde_json::json!({}),
            "Password changed".to_string(),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    summary = "Log out",
    description = "Revoke the presented access token",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    // The exact expiry is not carried on AuthUser, so blacklist for the
    // full token lifetime from now. Entries are pruned once stale.
    let expires_at = Utc::now().timestamp() + state.services.auth.token_expiration_seconds();
    state
        .services
        .auth
        .revoke_token(&auth_user.token_id, expires_at);
    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({}),
        "Logged out".to_string(),
    )))
}
