use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::user;
use crate::errors::ServiceError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SALES: &str = "sales";

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: String,
    /// Token id, used for revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller, extracted from a validated token and made
/// available to handlers through request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn from_user(user: &user::Model, token_id: String) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            token_id,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is disabled")]
    AccountDisabled,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            AuthError::HashingError(_) => "HASHING_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::HashingError(msg) => ServiceError::HashError(msg),
            _ => ServiceError::Unauthorized(err.to_string()),
        }
    }
}

/// Hash a plaintext password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::HashingError(e.to_string()))
}

/// Verify a plaintext password against a stored PHC-format hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        warn!(error = %e, "stored password hash is malformed");
        AuthError::InvalidCredentials
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Access token lifetime in seconds
    pub access_token_expiration: i64,
}

impl AuthConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_issuer: config.auth_issuer.clone(),
            jwt_audience: config.auth_audience.clone(),
            access_token_expiration: config.jwt_expiration as i64,
        }
    }
}

#[derive(Debug, Clone)]
struct BlacklistedToken {
    jti: String,
    expires_at: i64,
}

/// Issues and validates access tokens, and tracks revoked token ids
/// until they would have expired anyway.
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    blacklist: RwLock<Vec<BlacklistedToken>>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            blacklist: RwLock::new(Vec::new()),
        }
    }

    pub fn token_expiration_seconds(&self) -> i64 {
        self.config.access_token_expiration
    }

    /// Mint an access token for an authenticated user.
    pub fn generate_token(&self, user: &user::Model) -> Result<(String, Claims), AuthError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.access_token_expiration);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok((token, claims))
    }

    /// Validate a token's signature, expiry, issuer and audience, and
    /// reject revoked token ids.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!(error = %e, "token validation failed");
                    AuthError::InvalidToken
                }
            }
        })?;

        if self.is_revoked(&data.claims.jti) {
            return Err(AuthError::TokenRevoked);
        }
        Ok(data.claims)
    }

    /// Revoke a token id so subsequent requests with the same token fail.
    pub fn revoke_token(&self, jti: &str, expires_at: i64) {
        let mut blacklist = match self.blacklist.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now().timestamp();
        blacklist.retain(|entry| entry.expires_at > now);
        blacklist.push(BlacklistedToken {
            jti: jti.to_string(),
            expires_at,
        });
    }

    fn is_revoked(&self, jti: &str) -> bool {
        let blacklist = match self.blacklist.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        blacklist.iter().any(|entry| entry.jti == jti)
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Requires a valid access token and stores the caller as an
/// `AuthUser` extension for downstream extractors.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let auth_service = request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or(AuthError::InvalidToken)?;

    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;
    let claims = auth_service.validate_token(token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
    let auth_user = AuthUser {
        user_id,
        username: claims.username,
        email: claims.email,
        role: claims.role,
        token_id: claims.jti,
    };
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Requires that the already-authenticated caller holds the given role.
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;
    if !auth_user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }
    Ok(next.run(request).await)
}

/// Convenience methods for attaching auth layers to routers.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl AuthRouterExt for Router<crate::AppState> {
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        // Role check runs first in layer order after auth populates the extension
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .layer(axum::middleware::from_fn(auth_middleware))
    }
}
