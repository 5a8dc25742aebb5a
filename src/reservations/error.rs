use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::CalendarError;
use crate::db::StorageError;

/// Errors raised by the booking engine
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    InvalidDates(#[from] CalendarError),

    #[error("Site {0} not found or not available for booking")]
    SiteNotFound(i32),

    #[error("Rig length must not be negative (got {0} ft)")]
    InvalidRigLength(i32),

    #[error("Rig length {rig_length_ft} ft exceeds the site maximum of {max_length_ft} ft")]
    RigTooLong { rig_length_ft: i32, max_length_ft: i32 },

    #[error("Stays longer than {max_nights} nights are not allowed during peak season ({nights} nights requested from {check_in})")]
    PeakStayLimitExceeded {
        nights: i64,
        max_nights: i64,
        check_in: NaiveDate,
    },

    #[error("Reservation {0} not found")]
    ReservationNotFound(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Reservation {0} was modified concurrently; reload and try again")]
    ConcurrentModification(Uuid),

    #[error("Could not generate a unique confirmation code")]
    ConfirmationCodeExhausted,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// Errors raised by the cancellation engine
#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("Reservation {0} not found")]
    ReservationNotFound(Uuid),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Reservation {0} was modified concurrently; reload and try again")]
    ConcurrentModification(Uuid),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}
