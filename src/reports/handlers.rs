// HTTP handlers for front-desk reports

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};

use crate::calendar::parse_date;
use crate::error::{ApiError, ErrorResponse};
use crate::reports::{OccupancyReport, ReportDateQuery, UnpaidReservation, WalkInAvailability};
use crate::AppState;

fn report_date(query: &ReportDateQuery) -> Result<NaiveDate, ApiError> {
    match query.date.as_deref() {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Handler for GET /api/admin/reports/walk-ins
#[utoipa::path(
    get,
    path = "/api/admin/reports/walk-ins",
    params(ReportDateQuery),
    responses(
        (status = 200, description = "Active sites with their next check-in", body = [WalkInAvailability]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn walk_in_report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportDateQuery>,
) -> Result<Json<Vec<WalkInAvailability>>, ApiError> {
    let today = report_date(&query)?;
    Ok(Json(state.reports.walk_in_availability(today).await?))
}

/// Handler for GET /api/admin/reports/occupancy
#[utoipa::path(
    get,
    path = "/api/admin/reports/occupancy",
    params(ReportDateQuery),
    responses(
        (status = 200, description = "Who holds each active site that night", body = OccupancyReport),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn occupancy_report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportDateQuery>,
) -> Result<Json<OccupancyReport>, ApiError> {
    let date = report_date(&query)?;
    Ok(Json(state.reports.occupancy_on(date).await?))
}

/// Handler for GET /api/admin/reports/unpaid
/// Confirmed walk-ins still waiting on payment
#[utoipa::path(
    get,
    path = "/api/admin/reports/unpaid",
    responses(
        (status = 200, description = "Unpaid confirmed reservations by check-in", body = [UnpaidReservation]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn unpaid_report_handler(State(state): State<AppState>) -> Result<Json<Vec<UnpaidReservation>>, ApiError> {
    Ok(Json(state.reports.unpaid_reservations().await?))
}
