use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::PaginatedResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub item_name: String,
    pub size: Option<String>,
    pub trade_price: Decimal,
    pub return_price_market: Option<Decimal>,
    pub return_price_office: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Item name cannot be empty"))]
    pub item_name: Option<String>,
    pub size: Option<String>,
    pub trade_price: Option<Decimal>,
    pub return_price_market: Option<Decimal>,
    pub return_price_office: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches against item name and category
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub item_name: String,
    pub size: Option<String>,
    pub trade_price: Decimal,
    pub return_price_market: Decimal,
    pub return_price_office: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Service for the product catalog
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    default_page_size: u64,
    max_page_size: u64,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, default_page_size: u64, max_page_size: u64) -> Self {
        Self {
            db_pool,
            default_page_size,
            max_page_size,
        }
    }

    fn page_params(&self, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        (page, limit)
    }

    /// Lists active products with optional text search and category filter.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<PaginatedResponse<ProductResponse>, ServiceError> {
        let db = &*self.db_pool;
        let (page, limit) = self.page_params(query.page, query.limit);

        let mut finder = product::Entity::find().filter(product::Column::IsActive.eq(true));
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            finder = finder.filter(
                Condition::any()
                    .add(product::Column::ItemName.contains(search))
                    .add(product::Column::Category.contains(search)),
            );
        }
        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            finder = finder.filter(product::Column::Category.eq(category));
        }

        let paginator = finder
            .order_by_asc(product::Column::ItemName)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(
            products.into_iter().map(Self::model_to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    /// Lists every product including deactivated ones.
    #[instrument(skip(self))]
    pub async fn list_all_products(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<PaginatedResponse<ProductResponse>, ServiceError> {
        let db = &*self.db_pool;
        let (page, limit) = self.page_params(page, limit);

        let paginator = product::Entity::find()
            .order_by_asc(product::Column::ItemName)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedResponse::new(
            products.into_iter().map(Self::model_to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    /// Fetches one product by id. Deactivated products stay reachable
    /// here so historical orders can still resolve their lines.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        let product = self.find_required(product_id).await?;
        Ok(Self::model_to_response(product))
    }

    pub async fn find_required(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;
        product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Distinct category names across active products.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db_pool;
        let categories: Vec<Option<String>> = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Category.is_not_null())
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .order_by_asc(product::Column::Category)
            .into_tuple()
            .all(db)
            .await?;
        Ok(categories.into_iter().flatten().collect())
    }

    /// Trade price must be positive. Return prices may be zero, which
    /// means the product has no buy-back program, but never negative.
    fn check_prices(
        trade_price: Option<Decimal>,
        return_price_market: Option<Decimal>,
        return_price_office: Option<Decimal>,
    ) -> Result<(), ServiceError> {
        if let Some(price) = trade_price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Trade price must be greater than zero".into(),
                ));
            }
        }
        for price in [return_price_market, return_price_office]
            .into_iter()
            .flatten()
        {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Return prices cannot be negative".into(),
                ));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(item_name = %request.item_name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        Self::check_prices(
            Some(request.trade_price),
            request.return_price_market,
            request.return_price_office,
        )?;
        self.check_name_conflict(&request.item_name, None).await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_name: Set(request.item_name),
            size: Set(request.size),
            trade_price: Set(request.trade_price),
            return_price_market: Set(request.return_price_market.unwrap_or_default()),
            return_price_office: Set(request.return_price_office.unwrap_or_default()),
            category: Set(request.category),
            description: Set(request.description),
            is_active: Set(true),
            ..Default::default()
        };

        let created = model.insert(db).await?;
        info!(product_id = %created.id, "created product");
        Ok(Self::model_to_response(created))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        let db = &*self.db_pool;
        Self::check_prices(
            request.trade_price,
            request.return_price_market,
            request.return_price_office,
        )?;
        let existing = self.find_required(product_id).await?;

        if let Some(item_name) = &request.item_name {
            if item_name != &existing.item_name {
                self.check_name_conflict(item_name, Some(product_id)).await?;
            }
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(item_name) = request.item_name {
            model.item_name = Set(item_name);
        }
        if let Some(size) = request.size {
            model.size = Set(Some(size));
        }
        if let Some(trade_price) = request.trade_price {
            model.trade_price = Set(trade_price);
        }
        if let Some(price) = request.return_price_market {
            model.return_price_market = Set(price);
        }
        if let Some(price) = request.return_price_office {
            model.return_price_office = Set(price);
        }
        if let Some(category) = request.category {
            model.category = Set(Some(category));
        }
        if let Some(description) = request.description {
            model.description = Set(Some(description));
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }

        let updated = model.update(db).await?;
        Ok(Self::model_to_response(updated))
    }

    /// Deactivates a product instead of removing the row, so existing
    /// order items keep a valid reference.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = self.find_required(product_id).await?;

        let mut model: product::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.update(db).await?;
        info!(%product_id, "deactivated product");
        Ok(())
    }

    async fn check_name_conflict(
        &self,
        item_name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let mut finder = product::Entity::find()
            .filter(product::Column::ItemName.eq(item_name))
            .filter(product::Column::IsActive.eq(true));
        if let Some(id) = exclude_id {
            finder = finder.filter(product::Column::Id.ne(id));
        }
        if finder.one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "An active product named '{}' already exists",
                item_name
            )));
        }
        Ok(())
    }

    pub fn model_to_response(product: product::Model) -> ProductResponse {
        ProductResponse {
            id: product.id,
            item_name: product.item_name,
            size: product.size,
            trade_price: product.trade_price,
            return_price_market: product.return_price_market,
            return_price_office: product.return_price_office,
            category: product.category,
            description: product.description,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
