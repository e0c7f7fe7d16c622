use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{self, ROLE_ADMIN, ROLE_SALES};
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;
use crate::PaginatedResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120, message = "Full name is required"))]
    pub full_name: String,
    pub role: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 120, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Restrict to one role ("admin" or "sales")
    pub role: Option<String>,
    /// Also list disabled accounts (default false)
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatsResponse {
    pub total_users: u64,
    pub active_users: u64,
    pub admin_count: u64,
    pub sales_count: u64,
}

fn validate_role(role: &str) -> Result<(), ServiceError> {
    if role == ROLE_ADMIN || role == ROLE_SALES {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "Role must be '{}' or '{}'",
            ROLE_ADMIN, ROLE_SALES
        )))
    }
}

/// Service for account management and credential checks
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    default_page_size: u64,
    max_page_size: u64,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, default_page_size: u64, max_page_size: u64) -> Self {
        Self {
            db_pool,
            default_page_size,
            max_page_size,
        }
    }

    /// Authenticates by username or email plus password.
    ///
    /// Deliberately returns the same error for unknown accounts and
    /// wrong passwords so callers cannot probe for valid usernames.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        let found = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier)),
            )
            .one(db)
            .await?;

        let user = match found {
            Some(user) => user,
            None => {
                warn!(identifier, "login attempt for unknown account");
                return Err(ServiceError::Unauthorized("Invalid credentials".into()));
            }
        };

        if !auth::verify_password(password, &user.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?
        {
            warn!(identifier, "login attempt with wrong password");
            return Err(ServiceError::Unauthorized("Invalid credentials".into()));
        }

        if !user.is_active {
            // Same message as a wrong password; the log carries the real cause
            warn!(identifier, "login attempt for disabled account");
            return Err(ServiceError::Unauthorized("Invalid credentials".into()));
        }

        let mut model: user::ActiveModel = user.into();
        model.last_login = Set(Some(chrono::Utc::now()));
        let user = model.update(db).await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        query: UserListQuery,
    ) -> Result<PaginatedResponse<UserResponse>, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        let mut finder = user::Entity::find();
        if let Some(role) = query.role.as_deref().filter(|r| !r.is_empty()) {
            validate_role(role)?;
            finder = finder.filter(user::Column::Role.eq(role));
        }
        if !query.include_inactive.unwrap_or(false) {
            finder = finder.filter(user::Column::IsActive.eq(true));
        }

        let paginator = finder
            .order_by_asc(user::Column::Username)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(
            users.into_iter().map(Self::model_to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    /// Lists active sales accounts, used to populate assignment dropdowns.
    #[instrument(skip(self))]
    pub async fn list_sales_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let db = &*self.db_pool;
        let users = user::Entity::find()
            .filter(user::Column::Role.eq(ROLE_SALES))
            .filter(user::Column::IsActive.eq(true))
            .order_by_asc(user::Column::FullName)
            .all(db)
            .await?;
        Ok(users.into_iter().map(Self::model_to_response).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = self.find_required(user_id).await?;
        Ok(Self::model_to_response(user))
    }

    pub async fn find_required(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        validate_role(&request.role)?;
        let db = &*self.db_pool;

        let conflict = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(request.username.as_str()))
                    .add(user::Column::Email.eq(request.email.as_str())),
            )
            .one(db)
            .await?;
        if conflict.is_some() {
            return Err(ServiceError::Conflict(
                "Username or email already in use".into(),
            ));
        }

        let password_hash =
            auth::hash_password(&request.password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(request.username),
            email: Set(request.email),
            password_hash: Set(password_hash),
            full_name: Set(request.full_name),
            role: Set(request.role),
            phone: Set(request.phone),
            is_active: Set(true),
            ..Default::default()
        };

        let created = model.insert(db).await?;
        info!(user_id = %created.id, "created user account");
        Ok(Self::model_to_response(created))
    }

    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(user_id).await?;

        if let Some(role) = &request.role {
            validate_role(role)?;
        }
        if let Some(email) = &request.email {
            let conflict = user::Entity::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .filter(user::Column::Id.ne(user_id))
                .one(db)
                .await?;
            if conflict.is_some() {
                return Err(ServiceError::Conflict("Email already in use".into()));
            }
        }

        let mut model: user::ActiveModel = existing.into();
        if let Some(email) = request.email {
            model.email = Set(email);
        }
        if let Some(full_name) = request.full_name {
            model.full_name = Set(full_name);
        }
        if let Some(role) = request.role {
            model.role = Set(role);
        }
        if let Some(phone) = request.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }

        let updated = model.update(db).await?;
        Ok(Self::model_to_response(updated))
    }

    /// Soft-deletes an account by disabling it. Admins cannot disable
    /// their own account.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid, requester_id: Uuid) -> Result<(), ServiceError> {
        if user_id == requester_id {
            return Err(ServiceError::BadRequest(
                "Cannot delete your own account".into(),
            ));
        }
        let db = &*self.db_pool;
        let existing = self.find_required(user_id).await?;

        let mut model: user::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.update(db).await?;
        info!(%user_id, "disabled user account");
        Ok(())
    }

    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(user_id).await?;

        let password_hash =
            auth::hash_password(new_password).map_err(|e| ServiceError::HashError(e.to_string()))?;
        let mut model: user::ActiveModel = existing.into();
        model.password_hash = Set(password_hash);
        model.update(db).await?;
        info!(%user_id, "password reset by administrator");
        Ok(())
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(user_id).await?;

        if !auth::verify_password(current_password, &existing.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?
        {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".into(),
            ));
        }

        let password_hash =
            auth::hash_password(new_password).map_err(|e| ServiceError::HashError(e.to_string()))?;
        let mut model: user::ActiveModel = existing.into();
        model.password_hash = Set(password_hash);
        model.update(db).await?;
        info!(%user_id, "password changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<UserStatsResponse, ServiceError> {
        let db = &*self.db_pool;
        let total_users = user::Entity::find().count(db).await?;
        let active_users = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .count(db)
            .await?;
        let admin_count = user::Entity::find()
            .filter(user::Column::Role.eq(ROLE_ADMIN))
            .count(db)
            .await?;
        let sales_count = user::Entity::find()
            .filter(user::Column::Role.eq(ROLE_SALES))
            .count(db)
            .await?;

        Ok(UserStatsResponse {
            total_users,
            active_users,
            admin_count,
            sales_count,
        })
    }

    pub fn model_to_response(user: user::Model) -> UserResponse {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            phone: user.phone,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_validation_accepts_known_roles() {
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("sales").is_ok());
        assert!(validate_role("superuser").is_err());
        assert!(validate_role("").is_err());
    }

    #[test]
    fn create_user_request_rejects_short_password() {
        let request = CreateUserRequest {
            username: "newuser".into(),
            email: "newuser@example.com".into(),
            password: "short".into(),
            full_name: "New User".into(),
            role: "sales".into(),
            phone: None,
        };
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().contains_key("password"));
    }
}
