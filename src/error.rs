// Error handling module for the campground API
// Maps every domain error onto one HTTP response format

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::calendar::CalendarError;
use crate::db::StorageError;
use crate::events::EventError;
use crate::payments::PaymentError;
use crate::rates::RatePlanError;
use crate::reports::ReportError;
use crate::reservations::{BookingError, CancelError, ConflictReport};
use crate::sites::SiteError;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
#[derive(Debug)]
pub enum ApiError {
    /// Request DTO failed validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// A business rule rejected the request; `code` names the rule
    /// Maps to HTTP 400 Bad Request
    BadRequest { code: &'static str, message: String },

    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Maps to HTTP 409 Conflict
    Conflict { code: &'static str, message: String },

    /// Requested site is taken; carries the substitutes
    /// Maps to HTTP 409 Conflict
    BookingConflict(ConflictReport),

    /// Transient storage fault; the detail is logged, never returned
    /// Maps to HTTP 503 Service Unavailable
    StorageUnavailable(String),

    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),
}

/// Consistent error response structure
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "RIG_TOO_LONG", "NOT_FOUND")
    pub error_code: String,

    pub message: String,

    /// Field-level validation errors or booking alternatives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(
                        "VALIDATION_ERROR",
                        "Request validation failed",
                        Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                    ),
                )
            }
            ApiError::BadRequest { code, message } => {
                debug!("Rejected request ({}): {}", code, message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(code, message.clone(), None))
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", format!("{} with id {} not found", resource, id), None),
                )
            }
            ApiError::Conflict { code, message } => {
                warn!("Conflict error ({}): {}", code, message);
                (StatusCode::CONFLICT, ErrorResponse::new(code, message.clone(), None))
            }
            ApiError::BookingConflict(report) => {
                warn!(
                    "Booking conflict on site {} for {} to {}",
                    report.site_id, report.check_in, report.check_out
                );
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new(
                        "BOOKING_CONFLICT",
                        report.message.clone(),
                        Some(serde_json::to_value(report).unwrap_or(serde_json::json!({}))),
                    ),
                )
            }
            ApiError::StorageUnavailable(detail) => {
                error!("Storage unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(
                        "STORAGE_UNAVAILABLE",
                        "The service is temporarily unavailable, please try again",
                        None,
                    ),
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred", None),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } | ApiError::BookingConflict(_) => StatusCode::CONFLICT,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        ApiError::StorageUnavailable(error.to_string())
    }
}

impl From<CalendarError> for ApiError {
    fn from(error: CalendarError) -> Self {
        let code = match error {
            CalendarError::InvalidDate(_) => "INVALID_DATE",
            CalendarError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            CalendarError::InvalidMonthDay(_) => "INVALID_MONTH_DAY",
        };
        ApiError::BadRequest {
            code,
            message: error.to_string(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::InvalidDates(e) => e.into(),
            BookingError::SiteNotFound(id) => ApiError::not_found("Site", id),
            BookingError::InvalidRigLength(_) => ApiError::BadRequest {
                code: "INVALID_RIG_LENGTH",
                message: error.to_string(),
            },
            BookingError::RigTooLong { .. } => ApiError::BadRequest {
                code: "RIG_TOO_LONG",
                message: error.to_string(),
            },
            BookingError::PeakStayLimitExceeded { .. } => ApiError::BadRequest {
                code: "PEAK_STAY_LIMIT_EXCEEDED",
                message: error.to_string(),
            },
            BookingError::ReservationNotFound(id) => ApiError::not_found("Reservation", id),
            BookingError::InvalidTransition(message) => ApiError::Conflict {
                code: "INVALID_STATUS_TRANSITION",
                message,
            },
            BookingError::ConcurrentModification(_) => ApiError::Conflict {
                code: "CONCURRENT_MODIFICATION",
                message: error.to_string(),
            },
            BookingError::ConfirmationCodeExhausted => ApiError::StorageUnavailable(error.to_string()),
            BookingError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<CancelError> for ApiError {
    fn from(error: CancelError) -> Self {
        match error {
            CancelError::ReservationNotFound(id) => ApiError::not_found("Reservation", id),
            CancelError::InvalidTransition(message) => ApiError::Conflict {
                code: "INVALID_STATUS_TRANSITION",
                message,
            },
            CancelError::ConcurrentModification(_) => ApiError::Conflict {
                code: "CONCURRENT_MODIFICATION",
                message: error.to_string(),
            },
            CancelError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(error: PaymentError) -> Self {
        match error {
            PaymentError::ReservationNotFound(id) => ApiError::not_found("Reservation", id),
            PaymentError::NotPayable { .. } => ApiError::Conflict {
                code: "INVALID_STATUS_TRANSITION",
                message: error.to_string(),
            },
            PaymentError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::InvalidDate(e) => e.into(),
            ReportError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<SiteError> for ApiError {
    fn from(error: SiteError) -> Self {
        match error {
            SiteError::NotFound(id) => ApiError::not_found("Site", id),
            SiteError::DuplicateNumber(_) => ApiError::Conflict {
                code: "DUPLICATE_SITE_NUMBER",
                message: error.to_string(),
            },
            SiteError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<RatePlanError> for ApiError {
    fn from(error: RatePlanError) -> Self {
        match error {
            RatePlanError::NotFound(id) => ApiError::not_found("Rate plan", id),
            RatePlanError::StorageUnavailable(e) => e.into(),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(error: EventError) -> Self {
        match error {
            EventError::NotFound(id) => ApiError::not_found("Special event", id),
            EventError::StorageUnavailable(e) => e.into(),
        }
    }
}
