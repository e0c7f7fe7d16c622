use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{inventory_record, product};
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertInventoryRequest {
    #[validate(range(min = 0, message = "Current stock cannot be negative"))]
    pub current_stock: i32,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: i32,
    pub maximum_stock: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub current_stock: i32,
    pub minimum_stock: i32,
    pub maximum_stock: Option<i32>,
    pub is_low_stock: bool,
    pub last_updated: DateTime<Utc>,
}

/// Service for stock levels. Each product has at most one record, so
/// writes are upserts keyed by product id.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_inventory(&self) -> Result<Vec<InventoryResponse>, ServiceError> {
        let db = &*self.db_pool;
        let records = inventory_record::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(inventory_record::Column::LastUpdated)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|(record, product)| Self::model_to_response(record, product))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_by_product(&self, product_id: Uuid) -> Result<InventoryResponse, ServiceError> {
        let db = &*self.db_pool;
        let found = inventory_record::Entity::find()
            .filter(inventory_record::Column::ProductId.eq(product_id))
            .find_also_related(product::Entity)
            .one(db)
            .await?;
        match found {
            Some((record, product)) => Ok(Self::model_to_response(record, product)),
            None => Err(ServiceError::NotFound(format!(
                "No inventory record for product {}",
                product_id
            ))),
        }
    }

    /// Creates or replaces the stock record for a product. The product
    /// must exist and be active.
    #[instrument(skip(self, request))]
    pub async fn upsert_inventory(
        &self,
        product_id: Uuid,
        request: UpsertInventoryRequest,
    ) -> Result<InventoryResponse, ServiceError> {
        let db = &*self.db_pool;
        let product = product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        if !product.is_active {
            return Err(ServiceError::InvalidOperation(format!(
                "Product '{}' is deactivated and cannot hold stock",
                product.item_name
            )));
        }
        if let Some(max) = request.maximum_stock {
            if max < request.minimum_stock {
                return Err(ServiceError::ValidationError(
                    "Maximum stock cannot be below minimum stock".into(),
                ));
            }
        }

        let existing = inventory_record::Entity::find()
            .filter(inventory_record::Column::ProductId.eq(product_id))
            .one(db)
            .await?;

        let saved = match existing {
            Some(record) => {
                let mut model: inventory_record::ActiveModel = record.into();
                model.current_stock = Set(request.current_stock);
                model.minimum_stock = Set(request.minimum_stock);
                model.maximum_stock = Set(request.maximum_stock);
                model.update(db).await?
            }
            None => {
                let model = inventory_record::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product_id),
                    current_stock: Set(request.current_stock),
                    minimum_stock: Set(request.minimum_stock),
                    maximum_stock: Set(request.maximum_stock),
                    ..Default::default()
                };
                model.insert(db).await?
            }
        };

        info!(%product_id, stock = saved.current_stock, "inventory updated");
        Ok(Self::model_to_response(saved, Some(product)))
    }

    /// Records at or below their minimum threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<InventoryResponse>, ServiceError> {
        let db = &*self.db_pool;
        let records = inventory_record::Entity::find()
            .filter(
                Expr::col(inventory_record::Column::CurrentStock)
                    .lte(Expr::col(inventory_record::Column::MinimumStock)),
            )
            .find_also_related(product::Entity)
            .order_by_asc(inventory_record::Column::CurrentStock)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|(record, product)| Self::model_to_response(record, product))
            .collect())
    }

    fn model_to_response(
        record: inventory_record::Model,
        product: Option<product::Model>,
    ) -> InventoryResponse {
        InventoryResponse {
            id: record.id,
            product_id: record.product_id,
            product_name: product.map(|p| p.item_name).unwrap_or_default(),
            current_stock: record.current_stock,
            minimum_stock: record.minimum_stock,
            maximum_stock: record.maximum_stock,
            is_low_stock: record.current_stock <= record.minimum_stock,
            last_updated: record.last_updated,
        }
    }
}
