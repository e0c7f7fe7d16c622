use axum::{
    extract::{Query, State},
    response::Json,
};

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::reports::{SalesReportQuery, SalesReportResponse};
use crate::{ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/reports/sales",
    summary = "Sales report",
    description = "Totals, weekly breakdown, top products and target progress for a rolling window ending now. Sales accounts report over their own orders only.",
    params(
        ("period" = Option<String>, Query, description = "One of week, month, quarter, year (default: month)"),
        ("sales_person_id" = Option<Uuid>, Query, description = "Report on one sales person (admins only, ignored otherwise)"),
    ),
    responses(
        (status = 200, description = "Report generated", body = ApiResponse<SalesReportResponse>),
        (status = 400, description = "Unknown report period", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn sales_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<SalesReportQuery>,
) -> Result<Json<ApiResponse<SalesReportResponse>>, ServiceError> {
    let report = state.services.reports.sales_report(&auth_user, query).await?;
    Ok(Json(ApiResponse::success(report)))
}
