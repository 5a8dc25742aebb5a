// HTTP handlers for special events

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::calendar::StayRange;
use crate::error::{ApiError, ErrorResponse};
use crate::events::{CreateSpecialEventRequest, OverlapQuery, OverlapResponse, SpecialEvent};
use crate::AppState;

/// Handler for GET /api/special-events/overlap
#[utoipa::path(
    get,
    path = "/api/special-events/overlap",
    params(OverlapQuery),
    responses(
        (status = 200, description = "Whether the stay touches a special event", body = OverlapResponse),
        (status = 400, description = "Invalid dates", body = ErrorResponse)
    ),
    tag = "special-events"
)]
pub async fn special_event_overlap_handler(
    State(state): State<AppState>,
    Query(query): Query<OverlapQuery>,
) -> Result<Json<OverlapResponse>, ApiError> {
    let stay = StayRange::parse(&query.check_in, &query.check_out)?;
    let events = state.events.events_overlapping(&stay).await?;
    Ok(Json(OverlapResponse {
        check_in: stay.check_in,
        check_out: stay.check_out,
        overlaps_special_event: !events.is_empty(),
        events,
    }))
}

/// Handler for GET /api/admin/special-events
#[utoipa::path(
    get,
    path = "/api/admin/special-events",
    responses((status = 200, description = "Special events by start date", body = [SpecialEvent])),
    tag = "admin"
)]
pub async fn list_special_events_handler(State(state): State<AppState>) -> Result<Json<Vec<SpecialEvent>>, ApiError> {
    Ok(Json(state.events.list_events().await?))
}

/// Handler for POST /api/admin/special-events
#[utoipa::path(
    post,
    path = "/api/admin/special-events",
    request_body = CreateSpecialEventRequest,
    responses(
        (status = 201, description = "Special event created", body = SpecialEvent),
        (status = 400, description = "Invalid input data", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_special_event_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSpecialEventRequest>,
) -> Result<(StatusCode, Json<SpecialEvent>), ApiError> {
    request.validate()?;
    let event = state.events.create_event(request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Handler for DELETE /api/admin/special-events/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/special-events/{id}",
    params(("id" = i32, Path, description = "Special event id")),
    responses(
        (status = 204, description = "Special event deleted"),
        (status = 404, description = "Special event not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn delete_special_event_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.events.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
