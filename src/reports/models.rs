use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::reservations::Reservation;
use crate::sites::Site;

/// How long a site stays open for a walk-in guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WalkInAvailability {
    pub site: Site,
    /// First confirmed check-in strictly after the report date
    pub next_check_in: Option<NaiveDate>,
    pub days_until_next_check_in: Option<i64>,
}

/// Who occupies a site on a given night
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SiteOccupancy {
    pub site: Site,
    pub reservation: Option<Reservation>,
}

/// A CONFIRMED stay nobody has paid for yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnpaidReservation {
    pub reservation: Reservation,
    pub nights: i64,
    /// Snapshot nightly rate times nights
    pub expected_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OccupancyReport {
    pub date: NaiveDate,
    pub occupied: usize,
    pub sites: Vec<SiteOccupancy>,
}

/// Query parameters for the report endpoints; `date` defaults to today
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportDateQuery {
    pub date: Option<String>,
}
