use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::{customer, order};
use crate::errors::ServiceError;
use crate::PaginatedResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 120, message = "Customer name is required"))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub delivery_area: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 120, message = "Customer name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub delivery_area: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// Admin-only filter on the owning sales person
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub delivery_area: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub total_orders: i32,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Service for the customer book. Sales accounts only ever see their
/// own customers, admins see everything.
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    default_page_size: u64,
    max_page_size: u64,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, default_page_size: u64, max_page_size: u64) -> Self {
        Self {
            db_pool,
            default_page_size,
            max_page_size,
        }
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn list_customers(
        &self,
        auth: &AuthUser,
        query: CustomerListQuery,
    ) -> Result<PaginatedResponse<CustomerResponse>, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        let mut finder = customer::Entity::find();
        if !auth.is_admin() {
            finder = finder.filter(customer::Column::CreatedBy.eq(auth.user_id));
        } else if let Some(created_by) = query.created_by {
            finder = finder.filter(customer::Column::CreatedBy.eq(created_by));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            finder = finder.filter(
                Condition::any()
                    .add(customer::Column::Name.contains(search))
                    .add(customer::Column::Phone.contains(search)),
            );
        }

        let paginator = finder
            .order_by_asc(customer::Column::Name)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(
            customers.into_iter().map(Self::model_to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get_customer(
        &self,
        customer_id: Uuid,
        auth: &AuthUser,
    ) -> Result<CustomerResponse, ServiceError> {
        let customer = self.find_required(customer_id).await?;
        Self::check_access(&customer, auth)?;
        Ok(Self::model_to_response(customer))
    }

    async fn find_required(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        let db = &*self.db_pool;
        customer::Entity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    fn check_access(customer: &customer::Model, auth: &AuthUser) -> Result<(), ServiceError> {
        if !auth.is_admin() && customer.created_by != auth.user_id {
            return Err(ServiceError::Forbidden(
                "You do not have access to this customer".into(),
            ));
        }
        Ok(())
    }

    /// Creates a customer owned by the calling sales person. Duplicate
    /// names are rejected per owner, not globally, since two sales
    /// people may legitimately serve shops with the same name.
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id, name = %request.name))]
    pub async fn create_customer(
        &self,
        auth: &AuthUser,
        request: CreateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;

        let duplicate = customer::Entity::find()
            .filter(customer::Column::CreatedBy.eq(auth.user_id))
            .filter(customer::Column::Name.eq(request.name.as_str()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "You already have a customer named '{}'",
                request.name
            )));
        }

        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            delivery_area: Set(request.delivery_area),
            notes: Set(request.notes),
            created_by: Set(auth.user_id),
            total_orders: Set(0),
            total_spent: Set(Decimal::ZERO),
            last_order_date: Set(None),
            ..Default::default()
        };

        let created = model.insert(db).await?;
        info!(customer_id = %created.id, "created customer");
        Ok(Self::model_to_response(created))
    }

    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        auth: &AuthUser,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(customer_id).await?;
        Self::check_access(&existing, auth)?;

        if let Some(name) = &request.name {
            if name != &existing.name {
                let duplicate = customer::Entity::find()
                    .filter(customer::Column::CreatedBy.eq(existing.created_by))
                    .filter(customer::Column::Name.eq(name.as_str()))
                    .filter(customer::Column::Id.ne(customer_id))
                    .one(db)
                    .await?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "You already have a customer named '{}'",
                        name
                    )));
                }
            }
        }

        let mut model: customer::ActiveModel = existing.into();
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(phone) = request.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(email) = request.email {
            model.email = Set(Some(email));
        }
        if let Some(address) = request.address {
            model.address = Set(Some(address));
        }
        if let Some(delivery_area) = request.delivery_area {
            model.delivery_area = Set(Some(delivery_area));
        }
        if let Some(notes) = request.notes {
            model.notes = Set(Some(notes));
        }

        let updated = model.update(db).await?;
        Ok(Self::model_to_response(updated))
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(customer_id).await?;
        existing.delete(db).await?;
        info!(%customer_id, "deleted customer");
        Ok(())
    }

    /// Recomputes the denormalized order aggregates for one customer.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn refresh_stats(
        &self,
        customer_id: Uuid,
        auth: &AuthUser,
    ) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;
        let customer = self.find_required(customer_id).await?;
        Self::check_access(&customer, auth)?;

        let name = customer.name.clone();
        let refreshed = Self::recompute_aggregates(db, customer.created_by, &name).await?;
        match refreshed {
            Some(updated) => Ok(Self::model_to_response(updated)),
            None => Ok(Self::model_to_response(customer)),
        }
    }

    /// Recomputes total_orders, total_spent and last_order_date from
    /// the orders this customer's owner placed under the same name.
    /// Shared with order creation, which bumps the aggregates after
    /// every new order.
    pub async fn recompute_aggregates<C: ConnectionTrait>(
        db: &C,
        created_by: Uuid,
        customer_name: &str,
    ) -> Result<Option<customer::Model>, ServiceError> {
        let customer = customer::Entity::find()
            .filter(customer::Column::CreatedBy.eq(created_by))
            .filter(customer::Column::Name.eq(customer_name))
            .one(db)
            .await?;
        let customer = match customer {
            Some(customer) => customer,
            None => return Ok(None),
        };

        let orders = order::Entity::find()
            .filter(order::Column::SalesPersonId.eq(created_by))
            .filter(order::Column::CustomerName.eq(customer_name))
            .all(db)
            .await?;

        let total_orders = orders.len() as i32;
        let total_spent: Decimal = orders.iter().map(|o| o.total_value).sum();
        let last_order_date = orders.iter().map(|o| o.order_date).max();

        let mut model: customer::ActiveModel = customer.into();
        model.total_orders = Set(total_orders);
        model.total_spent = Set(total_spent);
        model.last_order_date = Set(last_order_date);
        let updated = model.update(db).await?;
        Ok(Some(updated))
    }

    pub fn model_to_response(customer: customer::Model) -> CustomerResponse {
        CustomerResponse {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
            delivery_area: customer.delivery_area,
            notes: customer.notes,
            created_by: customer.created_by,
            total_orders: customer.total_orders,
            total_spent: customer.total_spent,
            last_order_date: customer.last_order_date,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}
