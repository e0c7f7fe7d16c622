use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::entities::{order, order_item, product};
use crate::errors::ServiceError;
use crate::services::orders::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReportPeriod {
    Week,
    Month,
    Quarter,
    Year,
}

impl ReportPeriod {
    fn days(self) -> i64 {
        match self {
            ReportPeriod::Week => 7,
            ReportPeriod::Month => 30,
            ReportPeriod::Quarter => 90,
            ReportPeriod::Year => 365,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalesReportQuery {
    /// One of week, month, quarter, year. Defaults to month.
    pub period: Option<String>,
    /// Admin-only filter to report on one sales person
    pub sales_person_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyBucket {
    /// ISO week label, e.g. "2026-W34"
    pub week: String,
    pub orders: u64,
    pub value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TargetProgress {
    pub monthly_target: Decimal,
    /// Value of this calendar month's orders
    pub achieved: Decimal,
    pub progress_percent: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReportResponse {
    pub period: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_orders: u64,
    pub total_value: Decimal,
    pub average_order_value: Decimal,
    pub weekly_breakdown: Vec<WeeklyBucket>,
    pub top_products: Vec<TopProduct>,
    pub target: TargetProgress,
}

fn iso_week_label(date: DateTime<Utc>) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Service for sales reporting. Aggregation happens in memory over the
/// caller's visible orders, which keeps the queries portable across
/// backends at this data scale.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
    monthly_sales_target: Decimal,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, monthly_sales_target: Decimal) -> Self {
        Self {
            db_pool,
            monthly_sales_target,
        }
    }

    /// Builds the sales report for a rolling window ending now.
    /// Cancelled orders never count toward totals or targets.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn sales_report(
        &self,
        auth: &AuthUser,
        query: SalesReportQuery,
    ) -> Result<SalesReportResponse, ServiceError> {
        let db = &*self.db_pool;
        let period_name = query.period.unwrap_or_else(|| "month".to_string());
        let period = ReportPeriod::from_str(&period_name).map_err(|_| {
            ServiceError::InvalidInput(format!(
                "Unknown report period '{}', expected one of: week, month, quarter, year",
                period_name
            ))
        })?;

        let end_date = Utc::now();
        let start_date = end_date - Duration::days(period.days());
        let scope = Self::scope(auth, query.sales_person_id);

        let mut finder = order::Entity::find()
            .filter(order::Column::OrderDate.gte(start_date))
            .filter(order::Column::OrderDate.lte(end_date))
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()));
        if let Some(sales_person_id) = scope {
            finder = finder.filter(order::Column::SalesPersonId.eq(sales_person_id));
        }
        let orders = finder.all(db).await?;

        let total_orders = orders.len() as u64;
        let total_value: Decimal = orders.iter().map(|o| o.total_value).sum();
        let average_order_value = if total_orders > 0 {
            total_value / Decimal::from(total_orders)
        } else {
            Decimal::ZERO
        };

        // Bucket by ISO week, oldest first
        let mut buckets: HashMap<String, (u64, Decimal)> = HashMap::new();
        for o in &orders {
            let entry = buckets.entry(iso_week_label(o.order_date)).or_default();
            entry.0 += 1;
            entry.1 += o.total_value;
        }
        let mut weekly_breakdown: Vec<WeeklyBucket> = buckets
            .into_iter()
            .map(|(week, (orders, value))| WeeklyBucket {
                week,
                orders,
                value,
            })
            .collect();
        weekly_breakdown.sort_by(|a, b| a.week.cmp(&b.week));

        let top_products = self.top_products(&orders).await?;
        let target = self.target_progress(scope).await?;

        Ok(SalesReportResponse {
            period: period.to_string(),
            start_date,
            end_date,
            total_orders,
            total_value,
            average_order_value,
            weekly_breakdown,
            top_products,
            target,
        })
    }

    /// Top ten products by sold value across the given orders.
    async fn top_products(&self, orders: &[order::Model]) -> Result<Vec<TopProduct>, ServiceError> {
        let db = &*self.db_pool;
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await?;

        let mut totals: HashMap<Uuid, (i64, Decimal)> = HashMap::new();
        for item in &items {
            let entry = totals.entry(item.product_id).or_default();
            entry.0 += item.quantity as i64;
            entry.1 += item.total_price;
        }

        let product_ids: Vec<Uuid> = totals.keys().copied().collect();
        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?;
        let names: HashMap<Uuid, String> =
            products.into_iter().map(|p| (p.id, p.item_name)).collect();

        let mut ranked: Vec<TopProduct> = totals
            .into_iter()
            .map(|(product_id, (quantity_sold, total_value))| TopProduct {
                product_id,
                product_name: names.get(&product_id).cloned().unwrap_or_default(),
                quantity_sold,
                total_value,
            })
            .collect();
        ranked.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        ranked.truncate(10);
        Ok(ranked)
    }

    /// Sales accounts always report over their own orders; admins see
    /// everyone unless they narrow to one sales person.
    fn scope(auth: &AuthUser, requested: Option<Uuid>) -> Option<Uuid> {
        if auth.is_admin() {
            requested
        } else {
            Some(auth.user_id)
        }
    }

    /// Progress against the configured monthly target, measured over
    /// the current calendar month regardless of the requested window.
    async fn target_progress(&self, scope: Option<Uuid>) -> Result<TargetProgress, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let month_start = now
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ServiceError::InternalError("Failed to compute month start".into()))?;

        let mut finder = order::Entity::find()
            .filter(order::Column::OrderDate.gte(month_start))
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()));
        if let Some(sales_person_id) = scope {
            finder = finder.filter(order::Column::SalesPersonId.eq(sales_person_id));
        }
        let orders = finder.all(db).await?;
        let achieved: Decimal = orders.iter().map(|o| o.total_value).sum();

        let progress_percent = if self.monthly_sales_target > Decimal::ZERO {
            let ratio = achieved / self.monthly_sales_target * Decimal::from(100);
            ratio.to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        Ok(TargetProgress {
            monthly_target: self.monthly_sales_target,
            achieved,
            progress_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_period_parses_and_sizes_windows() {
        assert_eq!(ReportPeriod::from_str("week").unwrap().days(), 7);
        assert_eq!(ReportPeriod::from_str("month").unwrap().days(), 30);
        assert_eq!(ReportPeriod::from_str("quarter").unwrap().days(), 90);
        assert_eq!(ReportPeriod::from_str("year").unwrap().days(), 365);
        assert!(ReportPeriod::from_str("fortnight").is_err());
    }

    #[test]
    fn iso_week_labels_pad_week_numbers() {
        let early = Utc.with_ymd_and_hms(2026, 1, 7, 12, 0, 0).unwrap();
        assert_eq!(iso_week_label(early), "2026-W02");
        let late = Utc.with_ymd_and_hms(2026, 8, 24, 12, 0, 0).unwrap();
        assert_eq!(iso_week_label(late), "2026-W35");
    }
}
