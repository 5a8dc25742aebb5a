use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_money_amount, validate_not_blank};

/// Characters used for guest-facing references; no 0/O or 1/I
const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const REFERENCE_LENGTH: usize = 8;

/// Random reference such as `REF-7KQ2MZ9D`
pub fn generate_reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..REFERENCE_LENGTH)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", prefix, body)
}

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Charge,
    Refund,
    Adjustment,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Charge => "charge",
            PaymentKind::Refund => "refund",
            PaymentKind::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only ledger entry; negative amounts are money returned to the guest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub kind: PaymentKind,
    #[schema(value_type = String, example = "-110.00")]
    pub amount: Decimal,
    #[schema(example = "Refund")]
    pub method: String,
    pub note: Option<String>,
    #[schema(example = "REF-7KQ2MZ9D")]
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub method: String,
    pub note: Option<String>,
    pub transaction_id: String,
}

impl NewPayment {
    pub fn charge(reservation_id: Uuid, amount: Decimal, method: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            kind: PaymentKind::Charge,
            amount,
            method: method.trim().to_string(),
            note: None,
            transaction_id: generate_reference("TXN"),
        }
    }

    /// Refund entry; `refund` is positive and stored negated
    pub fn refund(reservation_id: Uuid, refund: Decimal, fee: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            kind: PaymentKind::Refund,
            amount: -refund,
            method: "Refund".to_string(),
            note: Some(format!("Cancellation fee: ${}", fee)),
            transaction_id: generate_reference("REF"),
        }
    }

    /// Price change after an edit; positive is an additional charge
    pub fn adjustment(reservation_id: Uuid, delta: Decimal, previous: Decimal, current: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            kind: PaymentKind::Adjustment,
            amount: delta,
            method: "Adjustment".to_string(),
            note: Some(format!("Reservation edited: ${} -> ${}", previous, current)),
            transaction_id: generate_reference("ADJ"),
        }
    }

    /// Materialize the entry as stored, for stores that do not round-trip a row
    pub fn into_payment(self, created_at: DateTime<Utc>) -> Payment {
        Payment {
            id: self.id,
            reservation_id: self.reservation_id,
            kind: self.kind,
            amount: self.amount,
            method: self.method,
            note: self.note,
            transaction_id: self.transaction_id,
            created_at,
        }
    }
}

/// Request DTO for POST /api/reservations/:id/payments
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    #[validate(custom = "validate_money_amount")]
    #[schema(value_type = String, example = "120.00")]
    pub amount: Decimal,
    #[validate(
        length(min = 1, max = 50, message = "Payment method must be between 1 and 50 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "Credit Card")]
    pub method: String,
}

/// Ledger entries for one reservation with their running net
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentHistory {
    pub reservation_id: Uuid,
    pub payments: Vec<Payment>,
    #[schema(value_type = String, example = "10.00")]
    pub net_total: Decimal,
}
