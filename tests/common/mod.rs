use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use salesdesk_api::{
    auth::{hash_password, AuthConfig, AuthService, ROLE_ADMIN, ROLE_SALES},
    config::AppConfig,
    db,
    entities::{inventory_record, product, user},
    handlers::AppServices,
    AppState,
};

const TEST_JWT_SECRET: &str =
    "integration-test-secret-long-enough-for-hs256-signing-0123456789abcdef";

/// Harness that spins up the full router against an in-memory SQLite
/// database. A single connection keeps every query on the same
/// in-memory instance.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_id: Uuid,
    pub sales_id: Uuid,
    pub sales2_id: Uuid,
    admin_token: String,
    sales_token: String,
    sales2_token: String,
    auth_service: Arc<AuthService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);

        let auth_service = Arc::new(AuthService::new(AuthConfig::from_app_config(&cfg)));
        let services = AppServices::new(db_arc.clone(), &cfg, auth_service.clone());
        let state = AppState {
            db: db_arc.clone(),
            config: cfg,
            services,
        };

        let admin = Self::insert_user(&db_arc, "admin", ROLE_ADMIN, "admin123").await;
        let sales = Self::insert_user(&db_arc, "sales1", ROLE_SALES, "sales123").await;
        let sales2 = Self::insert_user(&db_arc, "sales2", ROLE_SALES, "sales123").await;

        let (admin_token, _) = auth_service
            .generate_token(&admin)
            .expect("mint admin token");
        let (sales_token, _) = auth_service
            .generate_token(&sales)
            .expect("mint sales token");
        let (sales2_token, _) = auth_service
            .generate_token(&sales2)
            .expect("mint sales2 token");

        let auth_service_for_layer = auth_service.clone();
        let api_router = salesdesk_api::api_v1_routes().layer(middleware::from_fn_with_state(
            auth_service_for_layer,
            |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
             mut req: Request<Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ));

        let router = Router::new()
            .route("/health", get(salesdesk_api::health_check))
            .nest("/api/v1", api_router)
            .with_state(state.clone());

        Self {
            router,
            state,
            admin_id: admin.id,
            sales_id: sales.id,
            sales2_id: sales2.id,
            admin_token,
            sales_token,
            sales2_token,
            auth_service,
        }
    }

    async fn insert_user(
        db: &Arc<sea_orm::DatabaseConnection>,
        username: &str,
        role: &str,
        password: &str,
    ) -> user::Model {
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(format!("{}@test.local", username)),
            password_hash: Set(hash_password(password).expect("hash test password")),
            full_name: Set(format!("Test {}", username)),
            role: Set(role.to_string()),
            phone: Set(None),
            is_active: Set(true),
            ..Default::default()
        };
        model.insert(db.as_ref()).await.expect("insert test user")
    }

    #[allow(dead_code)]
    pub fn auth_service(&self) -> Arc<AuthService> {
        self.auth_service.clone()
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn sales_token(&self) -> &str {
        &self.sales_token
    }

    #[allow(dead_code)]
    pub fn sales2_token(&self) -> &str {
        &self.sales2_token
    }

    /// Seed an active product with an optional stock record.
    #[allow(dead_code)]
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: Option<i32>) -> Uuid {
        let db = self.state.db.as_ref();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_name: Set(name.to_string()),
            size: Set(None),
            trade_price: Set(price),
            return_price_market: Set(Decimal::ZERO),
            return_price_office: Set(Decimal::ZERO),
            category: Set(Some("Test".to_string())),
            description: Set(None),
            is_active: Set(true),
            ..Default::default()
        };
        let created = model.insert(db).await.expect("seed product");

        if let Some(stock) = stock {
            let record = inventory_record::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(created.id),
                current_stock: Set(stock),
                minimum_stock: Set(10),
                maximum_stock: Set(None),
                ..Default::default()
            };
            record.insert(db).await.expect("seed inventory record");
        }
        created.id
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_as_admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.admin_token()))
            .await
    }

    pub async fn request_as_sales(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.sales_token()))
            .await
    }
}

/// Parse a decimal field that may serialize as a string or a number.
#[allow(dead_code)]
pub fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal value, got {}", other),
    }
}

/// Read a JSON body from a response, asserting the expected status first.
pub async fn json_body(response: axum::response::Response, expected: StatusCode) -> Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    assert_eq!(
        status,
        expected,
        "unexpected status, body: {}",
        String::from_utf8_lossy(&bytes)
    );
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}
