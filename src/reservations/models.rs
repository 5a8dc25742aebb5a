use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::calendar::{parse_date, CalendarError, StayRange};
use crate::payments::{NewPayment, Payment};
use crate::sites::{Site, SiteType};

/// Reservation lifecycle; only CONFIRMED stays block their dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Domain model representing a reservation in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub site_id: i32,
    /// Account of the guest, absent for walk-ins
    pub guest_id: Option<i32>,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub rig_length_ft: i32,
    pub check_in: NaiveDate,
    /// Exclusive
    pub check_out: NaiveDate,
    pub status: ReservationStatus,
    /// Snapshot taken at booking time
    #[schema(value_type = String, example = "40.00")]
    pub nightly_rate: Decimal,
    #[schema(value_type = String, example = "200.00")]
    pub amount_paid: Decimal,
    pub payment_method: Option<String>,
    pub paid: bool,
    pub pcs_exempt: bool,
    #[schema(example = "RV-7KQ2MZ9D")]
    pub confirmation_code: String,
    /// Set once cancelled so that repeated cancellations replay the same figures
    #[schema(value_type = Option<String>)]
    pub cancellation_fee: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub refund_amount: Option<Decimal>,
    /// Row version, bumped by every write
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn stay(&self) -> StayRange {
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    pub fn nights(&self) -> i64 {
        self.stay().nights()
    }
}

/// Guest identity as supplied by the identity layer or the front desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GuestInfo {
    pub guest_id: Option<i32>,
    #[schema(example = "Dana Whitfield")]
    pub name: String,
    pub email: Option<String>,
}

/// Typed input to the booking engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub site_id: i32,
    pub guest: GuestInfo,
    pub rig_length_ft: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub pcs_exempt: bool,
}

/// Typed input to an edit; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditRequest {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub rig_length_ft: Option<i32>,
}

/// Row about to be inserted by a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub id: Uuid,
    pub site_id: i32,
    pub guest_id: Option<i32>,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub rig_length_ft: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nightly_rate: Decimal,
    pub amount_paid: Decimal,
    pub pcs_exempt: bool,
    pub confirmation_code: String,
}

impl NewReservation {
    pub fn stay(&self) -> StayRange {
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

/// Changes written by an edit, guarded by the row version the engine read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationChange {
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub rig_length_ft: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub amount_paid: Decimal,
    pub expected_version: i32,
    pub adjustment: Option<NewPayment>,
}

impl ReservationChange {
    pub fn stay(&self) -> StayRange {
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

/// Cancellation figures written atomically with the status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub fee: Decimal,
    pub refund: Decimal,
    /// Row version the fee was assessed against
    pub expected_version: i32,
    pub refund_payment: Option<NewPayment>,
}

/// Result of the atomic check-and-insert primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Reservation),
    /// A confirmed reservation already holds an overlapping night on the site
    Conflict,
    /// The site vanished or was retired after validation
    SiteUnavailable,
    /// The confirmation code is already taken
    DuplicateCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated {
        reservation: Reservation,
        adjustment: Option<Payment>,
    },
    Conflict,
    /// The site was retired after validation
    SiteUnavailable,
    NotFound,
    NotEditable(ReservationStatus),
    /// The row was written since the engine read it
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled {
        reservation: Reservation,
        refund_payment: Option<Payment>,
    },
    AlreadyCancelled(Reservation),
    NotCancellable(ReservationStatus),
    NotFound,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Recorded {
        reservation: Reservation,
        payment: Payment,
    },
    NotPayable(ReservationStatus),
    NotFound,
}

/// A booking that could not be placed on the requested site, with substitutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConflictReport {
    pub site_id: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub message: String,
    pub alternatives: Vec<Site>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed(Reservation),
    Conflict(ConflictReport),
}

/// Reservation after an edit together with the ledger entry it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EditedReservation {
    pub reservation: Reservation,
    pub adjustment: Option<Payment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(EditedReservation),
    Conflict(ConflictReport),
}

/// Fee and refund of a cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CancellationResult {
    pub reservation_id: Uuid,
    pub confirmation_code: String,
    #[schema(value_type = String, example = "10.00")]
    pub fee: Decimal,
    #[schema(value_type = String, example = "110.00")]
    pub refund: Decimal,
    /// True when this call replayed an earlier cancellation
    pub already_cancelled: bool,
}

/// Request DTO for POST /api/reservations
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    pub site_id: i32,
    pub guest_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Guest name must be between 1 and 100 characters"))]
    pub guest_name: String,
    #[validate(email(message = "Guest email must be a valid address"))]
    pub guest_email: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Rig length must be between 0 and 100 feet"))]
    #[schema(example = 38)]
    pub rig_length_ft: i32,
    /// `yyyy-MM-dd` or an ISO-8601 timestamp
    #[schema(example = "2025-07-15")]
    pub check_in: String,
    #[schema(example = "2025-07-18")]
    pub check_out: String,
    #[serde(default)]
    pub pcs_exempt: bool,
}

impl CreateReservationRequest {
    pub fn into_booking(self) -> Result<BookingRequest, CalendarError> {
        Ok(BookingRequest {
            site_id: self.site_id,
            guest: GuestInfo {
                guest_id: self.guest_id,
                name: self.guest_name.trim().to_string(),
                email: self.guest_email,
            },
            rig_length_ft: self.rig_length_ft,
            check_in: parse_date(&self.check_in)?,
            check_out: parse_date(&self.check_out)?,
            pcs_exempt: self.pcs_exempt,
        })
    }
}

/// Request DTO for PUT /api/reservations/:id
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EditReservationRequest {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Guest name must be between 1 and 100 characters"))]
    pub guest_name: Option<String>,
    #[validate(email(message = "Guest email must be a valid address"))]
    pub guest_email: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Rig length must be between 0 and 100 feet"))]
    pub rig_length_ft: Option<i32>,
}

impl EditReservationRequest {
    pub fn into_edit(self) -> Result<EditRequest, CalendarError> {
        Ok(EditRequest {
            check_in: self.check_in.as_deref().map(parse_date).transpose()?,
            check_out: self.check_out.as_deref().map(parse_date).transpose()?,
            guest_name: self.guest_name.map(|name| name.trim().to_string()),
            guest_email: self.guest_email,
            rig_length_ft: self.rig_length_ft,
        })
    }
}

/// Query parameters for GET /api/sites/available
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityParams {
    /// Defaults to today
    pub check_in: Option<String>,
    /// Defaults to the day after check-in
    pub check_out: Option<String>,
    /// Defaults to 0 (any rig)
    pub rig_length_ft: Option<i32>,
    pub site_type: Option<SiteType>,
    /// `fit` (tightest fit first, default) or `number`
    pub order: Option<String>,
}

/// Filter for the front-desk reservation listing (GET /api/reservations)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub site_id: Option<i32>,
}

/// Request DTO for POST /api/reservations/:id/cancel
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CancelReservationRequest {
    /// Evaluation instant; defaults to now
    pub now: Option<DateTime<Utc>>,
}
