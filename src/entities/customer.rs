use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 120,
        message = "Customer name must be between 1 and 120 characters"
    ))]
    pub name: String,

    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub delivery_area: Option<String>,
    pub notes: Option<String>,

    /// Sales person who owns this customer
    pub created_by: Uuid,

    /// Denormalized aggregates, recomputed from matching orders
    pub total_orders: i32,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    CreatedBy,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = chrono::Utc::now();
        if insert {
            if active_model.created_at.is_not_set() {
                active_model.created_at = sea_orm::Set(now);
            }
        } else {
            active_model.updated_at = sea_orm::Set(Some(now));
        }
        Ok(active_model)
    }
}
