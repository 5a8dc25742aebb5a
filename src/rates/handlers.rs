// HTTP handlers for rates and rate plan administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::calendar::parse_date;
use crate::error::{ApiError, ErrorResponse};
use crate::rates::{CreateRatePlanRequest, RatePlan, RatePlanListQuery, RateQuery, RateQuote};
use crate::AppState;

/// Handler for GET /api/rates
#[utoipa::path(
    get,
    path = "/api/rates",
    params(RateQuery),
    responses(
        (status = 200, description = "Nightly rate in effect", body = RateQuote),
        (status = 400, description = "Invalid date", body = ErrorResponse)
    ),
    tag = "rates"
)]
pub async fn get_rate_handler(
    State(state): State<AppState>,
    Query(query): Query<RateQuery>,
) -> Result<Json<RateQuote>, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let nightly_rate = state.rates.active_rate_for(query.site_type, date).await?;
    Ok(Json(RateQuote {
        site_type: query.site_type,
        date,
        nightly_rate,
    }))
}

/// Handler for GET /api/admin/rate-plans
#[utoipa::path(
    get,
    path = "/api/admin/rate-plans",
    params(RatePlanListQuery),
    responses((status = 200, description = "Rate plans", body = [RatePlan])),
    tag = "admin"
)]
pub async fn list_rate_plans_handler(
    State(state): State<AppState>,
    Query(query): Query<RatePlanListQuery>,
) -> Result<Json<Vec<RatePlan>>, ApiError> {
    Ok(Json(state.rates.list_plans(query.include_inactive).await?))
}

/// Handler for POST /api/admin/rate-plans
#[utoipa::path(
    post,
    path = "/api/admin/rate-plans",
    request_body = CreateRatePlanRequest,
    responses(
        (status = 201, description = "Rate plan created", body = RatePlan),
        (status = 400, description = "Invalid input data", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_rate_plan_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateRatePlanRequest>,
) -> Result<(StatusCode, Json<RatePlan>), ApiError> {
    request.validate()?;
    let plan = state.rates.create_plan(request).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Handler for DELETE /api/admin/rate-plans/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/rate-plans/{id}",
    params(("id" = i32, Path, description = "Rate plan id")),
    responses(
        (status = 200, description = "Rate plan deactivated", body = RatePlan),
        (status = 404, description = "Rate plan not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn deactivate_rate_plan_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RatePlan>, ApiError> {
    Ok(Json(state.rates.deactivate_plan(id).await?))
}
