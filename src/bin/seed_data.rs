//! Seed data script - populates an empty database with demo data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates the default accounts, a small product catalog with
//! stock levels, and a handful of orders in various states. It does
//! nothing if the database already has users.

use tracing::info;

use salesdesk_api::config::load_config;
use salesdesk_api::db::{establish_connection_from_app_config, run_migrations};
use salesdesk_api::seed::seed_if_empty;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== SalesDesk API Seed Data ===");

    let config = load_config()?;
    let db = establish_connection_from_app_config(&config).await?;
    run_migrations(&db).await?;

    if seed_if_empty(&db).await? {
        info!("");
        info!("Demo data created. Try these API calls once the server is up:");
        info!("  curl -X POST http://localhost:8080/api/v1/auth/login \\");
        info!("       -H 'Content-Type: application/json' \\");
        info!("       -d '{{\"identifier\":\"admin\",\"password\":\"admin123\"}}'");
        info!("");
        info!("Or explore interactively at: http://localhost:8080/swagger-ui");
    }

    Ok(())
}
