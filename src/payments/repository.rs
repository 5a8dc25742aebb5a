use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::db::{with_timeout, StorageError};
use crate::payments::{NewPayment, Payment};

const PAYMENT_COLUMNS: &str = "id, reservation_id, kind, amount, method, note, transaction_id, created_at";

/// Read side of the payment ledger
///
/// Entries are appended only inside the reservation transactions that produce
/// them (charge, edit adjustment, cancellation refund), never on their own.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Entries for a reservation, oldest first
    async fn history(&self, reservation_id: Uuid) -> Result<Vec<Payment>, StorageError>;
}

#[derive(Clone)]
pub struct PgPaymentLedger {
    pool: PgPool,
    timeout: Duration,
}

impl PgPaymentLedger {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl PaymentLedger for PgPaymentLedger {
    async fn history(&self, reservation_id: Uuid) -> Result<Vec<Payment>, StorageError> {
        with_timeout(self.timeout, async {
            let payments = sqlx::query_as::<_, Payment>(&format!(
                "SELECT {} FROM payments WHERE reservation_id = $1 ORDER BY created_at, id",
                PAYMENT_COLUMNS
            ))
            .bind(reservation_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(payments)
        })
        .await
    }
}

/// Append a ledger entry on an open connection (normally a transaction)
pub(crate) async fn append_payment(conn: &mut PgConnection, payment: &NewPayment) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (id, reservation_id, kind, amount, method, note, transaction_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        PAYMENT_COLUMNS
    ))
    .bind(payment.id)
    .bind(payment.reservation_id)
    .bind(payment.kind)
    .bind(payment.amount)
    .bind(&payment.method)
    .bind(&payment.note)
    .bind(&payment.transaction_id)
    .fetch_one(&mut *conn)
    .await
}
