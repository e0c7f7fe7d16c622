use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::{inventory_record, order, order_item, product};
use crate::errors::ServiceError;
use crate::services::CustomerService;
use crate::PaginatedResponse;

/// Lifecycle of an order. Delivered and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Delivered)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 120, message = "Customer name is required"))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub delivery_area: Option<String>,
    pub notes: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    /// Overrides the delivery timestamp when moving to delivered
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Admin-only filter on the owning sales person
    pub sales_person_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub sales_person_id: Uuid,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub delivery_area: Option<String>,
    pub status: String,
    pub total_value: Decimal,
    pub order_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub total_orders: u64,
    pub total_value: Decimal,
    pub pending_orders: u64,
    pub processing_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    pub total_orders: u64,
    pub total_value: Decimal,
}

fn parse_status(value: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(value).map_err(|_| {
        ServiceError::InvalidStatus(format!(
            "Unknown order status '{}', expected one of: pending, processing, delivered, cancelled",
            value
        ))
    })
}

/// Service for sales orders. Order creation is the only multi-table
/// write in the system and runs in a single transaction.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    default_page_size: u64,
    max_page_size: u64,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, default_page_size: u64, max_page_size: u64) -> Self {
        Self {
            db_pool,
            default_page_size,
            max_page_size,
        }
    }

    fn generate_order_number() -> String {
        let token = Uuid::new_v4().simple().to_string();
        format!(
            "SO-{}-{}",
            Utc::now().format("%Y%m%d"),
            token[..8].to_uppercase()
        )
    }

    /// Creates an order with its items. Every line's total is computed
    /// server-side as unit_price * quantity, and the order total is the
    /// sum of line totals. The header and all items commit atomically.
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn create_order(
        &self,
        auth: &AuthUser,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        for item in &request.items {
            if item.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Unit price must be greater than zero".into(),
                ));
            }
        }

        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let mut total_value = Decimal::ZERO;
        let mut line_models = Vec::with_capacity(request.items.len());
        let mut product_names: HashMap<Uuid, String> = HashMap::new();
        let order_id = Uuid::new_v4();

        for item in &request.items {
            let product = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
            if !product.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product '{}' is no longer available",
                    product.item_name
                )));
            }

            // Stock is checked, not decremented. Deliveries reconcile
            // stock through the inventory endpoint.
            let inventory = inventory_record::Entity::find()
                .filter(inventory_record::Column::ProductId.eq(item.product_id))
                .one(&txn)
                .await?;
            if let Some(inventory) = inventory {
                if inventory.current_stock < item.quantity {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Product '{}' has {} units in stock, {} requested",
                        product.item_name, inventory.current_stock, item.quantity
                    )));
                }
            }

            let line_total = item.unit_price * Decimal::from(item.quantity);
            total_value += line_total;
            product_names.insert(product.id, product.item_name);

            line_models.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                total_price: Set(line_total),
                ..Default::default()
            });
        }

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(Self::generate_order_number()),
            sales_person_id: Set(auth.user_id),
            customer_name: Set(request.customer_name.clone()),
            customer_phone: Set(request.customer_phone),
            customer_address: Set(request.customer_address),
            delivery_area: Set(request.delivery_area),
            status: Set(OrderStatus::Pending.to_string()),
            total_value: Set(total_value),
            order_date: Set(request.order_date.unwrap_or_else(Utc::now)),
            delivery_date: Set(None),
            notes: Set(request.notes),
            ..Default::default()
        };

        let created = order_model.insert(&txn).await?;
        let mut items = Vec::with_capacity(line_models.len());
        for line in line_models {
            items.push(line.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit order transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        // Keep the customer's denormalized totals in step with the new order
        CustomerService::recompute_aggregates(db, auth.user_id, &request.customer_name).await?;

        info!(order_id = %created.id, order_number = %created.order_number, "created order");

        let item_responses = items
            .into_iter()
            .map(|item| {
                let product_name = product_names
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_default();
                Self::item_to_response(item, product_name)
            })
            .collect();
        Ok(Self::model_to_response(created, Some(item_responses)))
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
        auth: &AuthUser,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = self.find_required(order_id).await?;
        Self::check_access(&order, auth)?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?;
        let names: HashMap<Uuid, String> =
            products.into_iter().map(|p| (p.id, p.item_name)).collect();

        let item_responses = items
            .into_iter()
            .map(|item| {
                let product_name = names.get(&item.product_id).cloned().unwrap_or_default();
                Self::item_to_response(item, product_name)
            })
            .collect();
        Ok(Self::model_to_response(order, Some(item_responses)))
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn list_orders(
        &self,
        auth: &AuthUser,
        query: OrderListQuery,
    ) -> Result<PaginatedResponse<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        let mut finder = order::Entity::find();
        if !auth.is_admin() {
            finder = finder.filter(order::Column::SalesPersonId.eq(auth.user_id));
        } else if let Some(sales_person_id) = query.sales_person_id {
            finder = finder.filter(order::Column::SalesPersonId.eq(sales_person_id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            let status = parse_status(status)?;
            finder = finder.filter(order::Column::Status.eq(status.to_string()));
        }
        if let Some(from) = query.date_from {
            let start = from
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .ok_or_else(|| ServiceError::InvalidInput("Invalid date_from".into()))?;
            finder = finder.filter(order::Column::OrderDate.gte(start));
        }
        if let Some(to) = query.date_to {
            let end = to
                .and_hms_opt(23, 59, 59)
                .map(|dt| dt.and_utc())
                .ok_or_else(|| ServiceError::InvalidInput("Invalid date_to".into()))?;
            finder = finder.filter(order::Column::OrderDate.lte(end));
        }

        let paginator = finder
            .order_by_desc(order::Column::OrderDate)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(
            orders
                .into_iter()
                .map(|o| Self::model_to_response(o, None))
                .collect(),
            total,
            page,
            limit,
        ))
    }

    /// Moves an order along the pending -> processing -> delivered
    /// path, or cancels it from a non-terminal state. Delivery stamps
    /// the delivery date.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        auth: &AuthUser,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = self.find_required(order_id).await?;
        Self::check_access(&order, auth)?;

        let current = parse_status(&order.status)?;
        let next = parse_status(&request.status)?;
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change order status from '{}' to '{}'",
                current, next
            )));
        }

        let mut model: order::ActiveModel = order.into();
        model.status = Set(next.to_string());
        if next == OrderStatus::Delivered {
            model.delivery_date = Set(Some(request.delivery_date.unwrap_or_else(Utc::now)));
        }
        let updated = model.update(db).await?;
        info!(%order_id, status = %next, "order status updated");
        Ok(Self::model_to_response(updated, None))
    }

    /// Status counts and total value across the caller's visible orders.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn summary(&self, auth: &AuthUser) -> Result<OrderSummaryResponse, ServiceError> {
        let db = &*self.db_pool;
        let mut finder = order::Entity::find();
        if !auth.is_admin() {
            finder = finder.filter(order::Column::SalesPersonId.eq(auth.user_id));
        }
        let orders = finder.all(db).await?;

        let mut summary = OrderSummaryResponse {
            total_orders: orders.len() as u64,
            total_value: Decimal::ZERO,
            pending_orders: 0,
            processing_orders: 0,
            delivered_orders: 0,
            cancelled_orders: 0,
        };
        for order in &orders {
            summary.total_value += order.total_value;
            match parse_status(&order.status)? {
                OrderStatus::Pending => summary.pending_orders += 1,
                OrderStatus::Processing => summary.processing_orders += 1,
                OrderStatus::Delivered => summary.delivered_orders += 1,
                OrderStatus::Cancelled => summary.cancelled_orders += 1,
            }
        }
        Ok(summary)
    }

    /// Order count and value for one calendar day, defaulting to today.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn daily_summary(
        &self,
        auth: &AuthUser,
        date: Option<NaiveDate>,
    ) -> Result<DailySummaryResponse, ServiceError> {
        let db = &*self.db_pool;
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let start = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ServiceError::InvalidInput("Invalid date".into()))?;
        let end = date
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ServiceError::InvalidInput("Invalid date".into()))?;

        let mut finder = order::Entity::find()
            .filter(order::Column::OrderDate.gte(start))
            .filter(order::Column::OrderDate.lte(end));
        if !auth.is_admin() {
            finder = finder.filter(order::Column::SalesPersonId.eq(auth.user_id));
        }
        let orders = finder.all(db).await?;

        Ok(DailySummaryResponse {
            date,
            total_orders: orders.len() as u64,
            total_value: orders.iter().map(|o| o.total_value).sum(),
        })
    }

    async fn find_required(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let db = &*self.db_pool;
        order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    fn check_access(order: &order::Model, auth: &AuthUser) -> Result<(), ServiceError> {
        if !auth.is_admin() && order.sales_person_id != auth.user_id {
            return Err(ServiceError::Forbidden(
                "You do not have access to this order".into(),
            ));
        }
        Ok(())
    }

    fn item_to_response(item: order_item::Model, product_name: String) -> OrderItemResponse {
        OrderItemResponse {
            id: item.id,
            product_id: item.product_id,
            product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }

    pub fn model_to_response(
        order: order::Model,
        items: Option<Vec<OrderItemResponse>>,
    ) -> OrderResponse {
        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            sales_person_id: order.sales_person_id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            delivery_area: order.delivery_area,
            status: order.status,
            total_value: order.total_value,
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrderStatus::Pending, OrderStatus::Processing, true)]
    #[test_case(OrderStatus::Pending, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Processing, OrderStatus::Delivered, true)]
    #[test_case(OrderStatus::Processing, OrderStatus::Cancelled, true)]
    #[test_case(OrderStatus::Pending, OrderStatus::Delivered, false)]
    #[test_case(OrderStatus::Delivered, OrderStatus::Cancelled, false)]
    #[test_case(OrderStatus::Cancelled, OrderStatus::Pending, false)]
    #[test_case(OrderStatus::Delivered, OrderStatus::Processing, false)]
    fn status_transitions(from: OrderStatus, to: OrderStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!(parse_status("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_status("delivered").unwrap(), OrderStatus::Delivered);
        assert!(parse_status("shipped").is_err());
    }

    #[test]
    fn order_numbers_carry_prefix_and_date() {
        let number = OrderService::generate_order_number();
        assert!(number.starts_with("SO-"));
        let date_part = &number[3..11];
        assert!(date_part.chars().all(|c| c.is_ascii_digit()));
    }
}
