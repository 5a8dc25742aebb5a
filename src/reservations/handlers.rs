// HTTP handlers for availability and reservation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::calendar::{next_day, parse_date, StayRange};
use crate::error::{ApiError, ErrorResponse};
use crate::reservations::{
    AvailabilityParams, AvailabilityQuery, BookingOutcome, CancelReservationRequest, CancellationResult,
    CreateReservationRequest, EditOutcome, EditReservationRequest, EditedReservation, Reservation, ReservationFilter,
    SiteOrdering,
};
use crate::sites::Site;
use crate::AppState;

/// Handler for GET /api/sites/available
/// Search for a stay, or the vacancy board when no dates are given
#[utoipa::path(
    get,
    path = "/api/sites/available",
    params(AvailabilityParams),
    responses(
        (status = 200, description = "Available sites; empty when nothing matches", body = [Site]),
        (status = 400, description = "Invalid dates or ordering", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn available_sites_handler(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<Site>>, ApiError> {
    let check_in = match params.check_in.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let check_out = match params.check_out.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => next_day(check_in)?,
    };
    let ordering = match params.order.as_deref() {
        Some(raw) => raw.parse::<SiteOrdering>().map_err(|message| ApiError::BadRequest {
            code: "INVALID_ORDERING",
            message,
        })?,
        None => SiteOrdering::default(),
    };

    let mut query = AvailabilityQuery::new(
        StayRange::new(check_in, check_out)?,
        params.rig_length_ft.unwrap_or(0).max(0),
        params.site_type,
    );
    query.ordering = ordering;

    let sites = state.booking.availability().find_available_sites(&query).await?;
    Ok(Json(sites))
}

/// Handler for POST /api/reservations
#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation confirmed", body = Reservation),
        (status = 400, description = "A booking rule was violated", body = ErrorResponse),
        (status = 404, description = "Site not found or inactive", body = ErrorResponse),
        (status = 409, description = "Site already booked; details carry alternatives", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn create_reservation_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    request.validate()?;

    match state.booking.create_reservation(request.into_booking()?).await? {
        BookingOutcome::Confirmed(reservation) => Ok((StatusCode::CREATED, Json(reservation))),
        BookingOutcome::Conflict(report) => Err(ApiError::BookingConflict(report)),
    }
}

/// Handler for GET /api/reservations
/// Front-desk listing ordered by check-in
#[utoipa::path(
    get,
    path = "/api/reservations",
    params(ReservationFilter),
    responses(
        (status = 200, description = "Reservations matching the filter", body = [Reservation]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn list_reservations_handler(
    State(state): State<AppState>,
    Query(filter): Query<ReservationFilter>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    Ok(Json(state.booking.list_reservations(&filter).await?))
}

/// Handler for GET /api/guests/{guest_id}/reservations
#[utoipa::path(
    get,
    path = "/api/guests/{guest_id}/reservations",
    params(("guest_id" = i32, Path, description = "Guest id")),
    responses(
        (status = 200, description = "The guest's reservations, newest check-in first", body = [Reservation]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn guest_reservations_handler(
    State(state): State<AppState>,
    Path(guest_id): Path<i32>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    Ok(Json(state.booking.guest_reservations(guest_id).await?))
}

/// Handler for GET /api/reservations/{id}
#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = Reservation),
        (status = 404, description = "Reservation not found", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn get_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ApiError> {
    Ok(Json(state.booking.get_reservation(id).await?))
}

/// Handler for GET /api/reservations/confirmation/{code}
#[utoipa::path(
    get,
    path = "/api/reservations/confirmation/{code}",
    params(("code" = String, Path, description = "Confirmation code, e.g. RV-7KQ2MZ9D")),
    responses(
        (status = 200, description = "Reservation", body = Reservation),
        (status = 404, description = "No reservation with this code", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn get_reservation_by_code_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Reservation>, ApiError> {
    Ok(Json(state.booking.find_by_confirmation_code(&code).await?))
}

/// Handler for PUT /api/reservations/{id}
#[utoipa::path(
    put,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body = EditReservationRequest,
    responses(
        (status = 200, description = "Reservation updated with the price adjustment, if any", body = EditedReservation),
        (status = 400, description = "A booking rule was violated", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "New dates conflict, or the reservation is no longer editable", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn edit_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditReservationRequest>,
) -> Result<Json<EditedReservation>, ApiError> {
    request.validate()?;

    match state.booking.edit_reservation(id, request.into_edit()?).await? {
        EditOutcome::Updated(edited) => Ok(Json(edited)),
        EditOutcome::Conflict(report) => Err(ApiError::BookingConflict(report)),
    }
}

/// Handler for POST /api/reservations/{id}/cancel
/// Cancelling again returns the figures of the first cancellation
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body(content = CancelReservationRequest, description = "Optional evaluation instant; defaults to now"),
    responses(
        (status = 200, description = "Fee kept and refund issued", body = CancellationResult),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "Reservation already completed", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn cancel_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<CancelReservationRequest>>,
) -> Result<Json<CancellationResult>, ApiError> {
    let now = request
        .and_then(|Json(request)| request.now)
        .unwrap_or_else(Utc::now);
    Ok(Json(state.cancellation.cancel(id, now).await?))
}

/// Handler for POST /api/reservations/{id}/complete
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/complete",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation completed", body = Reservation),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "Reservation was cancelled", body = ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn complete_reservation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ApiError> {
    Ok(Json(state.booking.complete_reservation(id).await?))
}
