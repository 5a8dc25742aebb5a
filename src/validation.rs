// Validation utilities module
// Custom validator functions for money and date rules shared by request DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a monetary amount is strictly positive
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        Err(ValidationError::new("amount_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a monetary amount has at most two fractional digits
pub fn validate_cents(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.normalize().scale() > 2 {
        Err(ValidationError::new("amount_has_fractional_cents"))
    } else {
        Ok(())
    }
}

/// Validates a strictly positive amount expressed in whole cents
pub fn validate_money_amount(amount: &Decimal) -> Result<(), ValidationError> {
    validate_positive_amount(amount)?;
    validate_cents(amount)
}

/// Validates an optional end date against a start date; `inclusive` allows equality
pub fn validate_date_order(
    start: NaiveDate,
    end: Option<NaiveDate>,
    inclusive: bool,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if end < start || (!inclusive && end == start) => {
            Err(ValidationError::new("end_date_before_start_date"))
        }
        _ => Ok(()),
    }
}

/// Validates that a free-text payment method is not blank
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}
