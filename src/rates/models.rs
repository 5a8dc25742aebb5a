use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::sites::SiteType;
use crate::validation::{validate_date_order, validate_money_amount};

/// Effective-dated nightly price for a site type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RatePlan {
    pub id: i32,
    pub site_type: SiteType,
    #[schema(value_type = String, example = "40.00")]
    pub nightly_rate: Decimal,
    pub start_date: NaiveDate,
    /// Inclusive; `None` means open-ended
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl RatePlan {
    /// Whether this plan is a candidate for `site_type` on `date`
    pub fn applies_to(&self, site_type: SiteType, date: NaiveDate) -> bool {
        self.active
            && self.site_type == site_type
            && self.start_date <= date
            && self.end_date.map_or(true, |end| end >= date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRatePlan {
    pub site_type: SiteType,
    pub nightly_rate: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Request DTO for POST /api/admin/rate-plans
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_plan_window"))]
pub struct CreateRatePlanRequest {
    pub site_type: SiteType,
    #[validate(custom = "validate_money_amount")]
    #[schema(value_type = String, example = "40.00")]
    pub nightly_rate: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

fn validate_plan_window(request: &CreateRatePlanRequest) -> Result<(), ValidationError> {
    validate_date_order(request.start_date, request.end_date, true)
}

impl From<CreateRatePlanRequest> for NewRatePlan {
    fn from(request: CreateRatePlanRequest) -> Self {
        Self {
            site_type: request.site_type,
            nightly_rate: request.nightly_rate,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

/// Query parameters for GET /api/rates
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RateQuery {
    pub site_type: SiteType,
    /// Any accepted date format; defaults to today
    pub date: Option<String>,
}

/// Resolved nightly rate
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateQuote {
    pub site_type: SiteType,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "30.00")]
    pub nightly_rate: Decimal,
}

/// Query parameters for GET /api/admin/rate-plans
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RatePlanListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}
