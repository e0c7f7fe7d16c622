//! Demo data seeding.
//!
//! Populates an empty database with the default accounts, a small
//! catalog with stock levels, and a few orders to explore. Seeding is
//! skipped entirely when any user already exists, so it is safe to run
//! on every startup in development.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, ROLE_ADMIN, ROLE_SALES};
use crate::db::DbPool;
use crate::entities::{customer, inventory_record, order, order_item, product, user};
use crate::errors::ServiceError;
use crate::services::orders::OrderStatus;
use crate::services::CustomerService;

/// Default accounts created on first run.
pub const SEED_USERS: &[(&str, &str, &str, &str, &str)] = &[
    // (username, email, password, full name, role)
    ("admin", "admin@salesdesk.local", "admin123", "Administrator", ROLE_ADMIN),
    ("manager", "manager@salesdesk.local", "manager123", "Operations Manager", ROLE_ADMIN),
    ("sales1", "sales1@salesdesk.local", "sales123", "Sales One", ROLE_SALES),
    ("sales2", "sales2@salesdesk.local", "sales123", "Sales Two", ROLE_SALES),
];

pub async fn seed_if_empty(db: &DbPool) -> Result<bool, ServiceError> {
    let existing = user::Entity::find().count(db).await?;
    if existing > 0 {
        info!("database already has {} users, skipping seed", existing);
        return Ok(false);
    }

    let users = seed_users(db).await?;
    let products = seed_catalog(db).await?;
    seed_inventory(db, &products).await?;
    seed_orders(db, &users, &products).await?;

    info!("seeded demo data");
    Ok(true)
}

async fn seed_users(db: &DbPool) -> Result<Vec<user::Model>, ServiceError> {
    let mut created = Vec::with_capacity(SEED_USERS.len());
    for (username, email, password, full_name, role) in SEED_USERS {
        let password_hash =
            hash_password(password).map_err(|e| ServiceError::HashError(e.to_string()))?;
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set((*username).to_string()),
            email: Set((*email).to_string()),
            password_hash: Set(password_hash),
            full_name: Set((*full_name).to_string()),
            role: Set((*role).to_string()),
            phone: Set(None),
            is_active: Set(true),
            ..Default::default()
        };
        created.push(model.insert(db).await?);
    }
    info!("created {} accounts", created.len());
    Ok(created)
}

async fn seed_catalog(db: &DbPool) -> Result<Vec<product::Model>, ServiceError> {
    let catalog = [
        ("Mineral Water", Some("500ml"), dec!(12.50), Some("Beverages")),
        ("Mineral Water", Some("1.5L"), dec!(25.00), Some("Beverages")),
        ("Orange Juice", Some("1L"), dec!(48.00), Some("Beverages")),
        ("Potato Crisps", Some("150g"), dec!(35.00), Some("Snacks")),
        ("Salted Peanuts", Some("200g"), dec!(42.00), Some("Snacks")),
        ("Dish Soap", Some("750ml"), dec!(65.00), Some("Household")),
        ("Laundry Powder", Some("2kg"), dec!(180.00), Some("Household")),
        ("Notebook A5", None, dec!(28.00), Some("Stationery")),
    ];

    let mut created = Vec::with_capacity(catalog.len());
    for (name, size, price, category) in catalog {
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_name: Set(format!(
                "{}{}",
                name,
                size.map(|s| format!(" {}", s)).unwrap_or_default()
            )),
            size: Set(size.map(str::to_string)),
            trade_price: Set(price),
            return_price_market: Set(price * dec!(0.9)),
            return_price_office: Set(price * dec!(0.85)),
            category: Set(category.map(str::to_string)),
            description: Set(None),
            is_active: Set(true),
            ..Default::default()
        };
        created.push(model.insert(db).await?);
    }
    info!("created {} products", created.len());
    Ok(created)
}

async fn seed_inventory(db: &DbPool, products: &[product::Model]) -> Result<(), ServiceError> {
    for (index, product) in products.iter().enumerate() {
        let model = inventory_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            current_stock: Set(120 + (index as i32) * 40),
            minimum_stock: Set(50),
            maximum_stock: Set(Some(1000)),
            ..Default::default()
        };
        model.insert(db).await?;
    }
    info!("created inventory records");
    Ok(())
}

async fn seed_orders(
    db: &DbPool,
    users: &[user::Model],
    products: &[product::Model],
) -> Result<(), ServiceError> {
    let sales: Vec<&user::Model> = users.iter().filter(|u| u.role == ROLE_SALES).collect();
    if sales.is_empty() || products.len() < 2 {
        return Ok(());
    }

    let plan = [
        (0usize, "Corner Shop Alfa", OrderStatus::Delivered, 21i64),
        (0, "Corner Shop Alfa", OrderStatus::Processing, 5),
        (0, "Mini Market Beta", OrderStatus::Pending, 1),
        (1, "Kiosk Gamma", OrderStatus::Delivered, 14),
        (1, "Kiosk Gamma", OrderStatus::Cancelled, 7),
    ];

    for (sales_index, customer_name, status, days_ago) in plan {
        let sales_person = sales[sales_index % sales.len()];

        // Make sure the customer exists before its aggregates are bumped
        let existing = customer::Entity::find()
            .filter(customer::Column::CreatedBy.eq(sales_person.id))
            .filter(customer::Column::Name.eq(customer_name))
            .one(db)
            .await?;
        if existing.is_none() {
            let model = customer::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(customer_name.to_string()),
                phone: Set(None),
                address: Set(None),
                delivery_area: Set(Some("Central".to_string())),
                created_by: Set(sales_person.id),
                total_orders: Set(0),
                total_spent: Set(dec!(0)),
                last_order_date: Set(None),
                ..Default::default()
            };
            model.insert(db).await?;
        }

        let order_date = Utc::now() - Duration::days(days_ago);
        let order_id = Uuid::new_v4();
        let first = &products[days_ago as usize % products.len()];
        let second = &products[(days_ago as usize + 3) % products.len()];

        let line_one = first.trade_price * dec!(10);
        let line_two = second.trade_price * dec!(4);

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(format!(
                "SO-{}-{}",
                order_date.format("%Y%m%d"),
                &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
            )),
            sales_person_id: Set(sales_person.id),
            customer_name: Set(customer_name.to_string()),
            customer_phone: Set(None),
            customer_address: Set(None),
            delivery_area: Set(Some("Central".to_string())),
            status: Set(status.to_string()),
            total_value: Set(line_one + line_two),
            order_date: Set(order_date),
            delivery_date: Set(if status == OrderStatus::Delivered {
                Some(order_date + Duration::days(2))
            } else {
                None
            }),
            notes: Set(None),
            ..Default::default()
        };
        order_model.insert(db).await?;

        for (prod, qty, total) in [(first, 10, line_one), (second, 4, line_two)] {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(prod.id),
                quantity: Set(qty),
                unit_price: Set(prod.trade_price),
                total_price: Set(total),
                ..Default::default()
            };
            item.insert(db).await?;
        }

        CustomerService::recompute_aggregates(db, sales_person.id, customer_name).await?;
    }

    info!("created demo orders");
    Ok(())
}
