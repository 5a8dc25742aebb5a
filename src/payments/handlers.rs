// HTTP handlers for payment capture and history

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ErrorResponse};
use crate::payments::{PaymentHistory, PaymentReceipt, RecordPaymentRequest};
use crate::AppState;

/// Handler for POST /api/reservations/{id}/payments
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/payments",
    params(("id" = Uuid, Path, description = "Reservation id")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentReceipt),
        (status = 400, description = "Invalid amount or method", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "Reservation is not CONFIRMED", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn record_payment_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), ApiError> {
    request.validate()?;
    let receipt = state.payments.record_payment(id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Handler for GET /api/reservations/{id}/payments
#[utoipa::path(
    get,
    path = "/api/reservations/{id}/payments",
    params(("id" = Uuid, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Ledger entries, oldest first", body = PaymentHistory),
        (status = 404, description = "Reservation not found", body = ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn payment_history_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentHistory>, ApiError> {
    Ok(Json(state.payments.payment_history(id).await?))
}
