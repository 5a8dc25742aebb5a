use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::calendar::{overlaps, StayRange};
use crate::validation::{validate_date_order, validate_not_blank};

/// A date window (holiday weekend, rally) during which cancellations are
/// charged the full late fee regardless of notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SpecialEvent {
    pub id: i32,
    #[schema(example = "Fourth of July weekend")]
    pub name: String,
    pub start_date: NaiveDate,
    /// Exclusive, like a reservation's check-out
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SpecialEvent {
    pub fn overlaps_stay(&self, stay: &StayRange) -> bool {
        overlaps(self.start_date, self.end_date, stay.check_in, stay.check_out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpecialEvent {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Request DTO for POST /api/admin/special-events
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_event_window"))]
pub struct CreateSpecialEventRequest {
    #[validate(
        length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn validate_event_window(request: &CreateSpecialEventRequest) -> Result<(), ValidationError> {
    validate_date_order(request.start_date, Some(request.end_date), false)
}

impl From<CreateSpecialEventRequest> for NewSpecialEvent {
    fn from(request: CreateSpecialEventRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

/// Query parameters for GET /api/special-events/overlap
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OverlapQuery {
    pub check_in: String,
    pub check_out: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverlapResponse {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub overlaps_special_event: bool,
    pub events: Vec<SpecialEvent>,
}
