use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::StorageError;
use crate::metrics::BookingMetrics;
use crate::payments::{NewPayment, Payment, PaymentHistory, PaymentLedger, RecordPaymentRequest};
use crate::reservations::{ChargeOutcome, Reservation, ReservationStore};

/// Error types for payment operations
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Reservation {0} not found")]
    ReservationNotFound(Uuid),

    #[error("Reservation {id} is {status} and cannot accept payments")]
    NotPayable { id: Uuid, status: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// Payment captured against a reservation
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct PaymentReceipt {
    pub reservation: Reservation,
    pub payment: Payment,
}

#[derive(Clone)]
pub struct PaymentService {
    reservations: Arc<dyn ReservationStore>,
    ledger: Arc<dyn PaymentLedger>,
    metrics: BookingMetrics,
}

impl PaymentService {
    pub fn new(reservations: Arc<dyn ReservationStore>, ledger: Arc<dyn PaymentLedger>, metrics: BookingMetrics) -> Self {
        Self {
            reservations,
            ledger,
            metrics,
        }
    }

    /// Capture a payment. The reservation stays CONFIRMED and keeps holding its
    /// dates; only `paid` and `payment_method` change.
    pub async fn record_payment(&self, id: Uuid, request: RecordPaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        let charge = NewPayment::charge(id, request.amount, &request.method);

        match self.reservations.record_charge(id, &charge).await? {
            ChargeOutcome::Recorded { reservation, payment } => {
                self.metrics.record_payment();
                tracing::info!(
                    "Recorded {} payment of {} for reservation {} ({})",
                    payment.method,
                    payment.amount,
                    id,
                    payment.transaction_id
                );
                Ok(PaymentReceipt { reservation, payment })
            }
            ChargeOutcome::NotPayable(status) => {
                tracing::warn!("Rejected payment for reservation {} in status {}", id, status);
                Err(PaymentError::NotPayable {
                    id,
                    status: status.to_string(),
                })
            }
            ChargeOutcome::NotFound => Err(PaymentError::ReservationNotFound(id)),
        }
    }

    /// Ledger entries oldest first, with their sum
    pub async fn payment_history(&self, id: Uuid) -> Result<PaymentHistory, PaymentError> {
        if self.reservations.get(id).await?.is_none() {
            return Err(PaymentError::ReservationNotFound(id));
        }

        let payments = self.ledger.history(id).await?;
        let net_total = payments.iter().map(|payment| payment.amount).sum::<Decimal>();
        Ok(PaymentHistory {
            reservation_id: id,
            payments,
            net_total,
        })
    }
}
