pub mod auth;
pub mod common;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<crate::services::UserService>,
    pub products: Arc<crate::services::ProductService>,
    pub customers: Arc<crate::services::CustomerService>,
    pub orders: Arc<crate::services::OrderService>,
    pub inventory: Arc<crate::services::InventoryService>,
    pub reports: Arc<crate::services::ReportService>,
    pub auth: Arc<crate::auth::AuthService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        auth_service: Arc<crate::auth::AuthService>,
    ) -> Self {
        let default_page = u64::from(config.api_default_page_size);
        let max_page = u64::from(config.api_max_page_size);
        let monthly_target =
            Decimal::from_f64_retain(config.monthly_sales_target).unwrap_or(Decimal::ZERO);

        Self {
            users: Arc::new(crate::services::UserService::new(
                db_pool.clone(),
                default_page,
                max_page,
            )),
            products: Arc::new(crate::services::ProductService::new(
                db_pool.clone(),
                default_page,
                max_page,
            )),
            customers: Arc::new(crate::services::CustomerService::new(
                db_pool.clone(),
                default_page,
                max_page,
            )),
            orders: Arc::new(crate::services::OrderService::new(
                db_pool.clone(),
                default_page,
                max_page,
            )),
            inventory: Arc::new(crate::services::InventoryService::new(db_pool.clone())),
            reports: Arc::new(crate::services::ReportService::new(
                db_pool,
                monthly_target,
            )),
            auth: auth_service,
        }
    }
}
