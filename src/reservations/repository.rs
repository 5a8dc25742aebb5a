use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::calendar::StayRange;
use crate::db::{with_timeout, StorageError};
use crate::payments::{append_payment, NewPayment};
use crate::reservations::{
    CancelOutcome, Cancellation, ChargeOutcome, InsertOutcome, NewReservation, Reservation, ReservationChange,
    ReservationFilter, ReservationStatus, UpdateOutcome,
};

const RESERVATION_COLUMNS: &str = "id, site_id, guest_id, guest_name, guest_email, rig_length_ft, \
     check_in, check_out, status, nightly_rate, amount_paid, payment_method, paid, pcs_exempt, \
     confirmation_code, cancellation_fee, refund_amount, version, created_at, updated_at";

/// Unique constraint on confirmation codes
pub const CONFIRMATION_CODE_KEY: &str = "reservations_confirmation_code_key";

/// Earliest upcoming confirmed check-in on a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct NextCheckIn {
    pub site_id: i32,
    pub check_in: NaiveDate,
}

/// Persistence interface for reservations
///
/// Every mutating method is one atomic unit: the state it checks cannot change
/// before its write commits.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StorageError>;

    async fn find_by_confirmation_code(&self, code: &str) -> Result<Option<Reservation>, StorageError>;

    /// Front-desk listing ordered by check-in, then site
    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError>;

    /// A guest's reservations in any status, newest check-in first
    async fn list_for_guest(&self, guest_id: i32) -> Result<Vec<Reservation>, StorageError>;

    /// CONFIRMED reservations with no payment captured, ordered by check-in
    async fn unpaid_confirmed(&self) -> Result<Vec<Reservation>, StorageError>;

    /// CONFIRMED reservations overlapping the stay, optionally on one site
    async fn confirmed_overlapping(
        &self,
        stay: &StayRange,
        site_id: Option<i32>,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Insert unless the site is gone or already booked for an overlapping night
    async fn insert_if_available(&self, reservation: &NewReservation) -> Result<InsertOutcome, StorageError>;

    /// Rewrite a CONFIRMED reservation unless another CONFIRMED one overlaps
    /// or the row moved past `change.expected_version`
    async fn update_if_available(&self, id: Uuid, change: &ReservationChange) -> Result<UpdateOutcome, StorageError>;

    /// Mark CANCELLED, store the fee/refund and append the refund entry, unless
    /// the row moved past `cancellation.expected_version`
    async fn cancel(&self, id: Uuid, cancellation: &Cancellation) -> Result<CancelOutcome, StorageError>;

    /// Mark paid and append the charge entry
    async fn record_charge(&self, id: Uuid, payment: &NewPayment) -> Result<ChargeOutcome, StorageError>;

    /// Compare-and-set on status; `None` when the row is missing or not in `from`
    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Option<Reservation>, StorageError>;

    /// Per site, the first CONFIRMED check-in strictly after `after`
    async fn next_check_ins(&self, after: NaiveDate) -> Result<Vec<NextCheckIn>, StorageError>;
}

#[derive(Clone)]
pub struct PgReservationStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgReservationStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

/// Half-open overlap against CONFIRMED rows on one site
async fn overlapping_exists(
    conn: &mut PgConnection,
    site_id: i32,
    stay: &StayRange,
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let exists: Option<bool> = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM reservations
            WHERE site_id = $1
              AND status = 'confirmed'
              AND check_in < $3
              AND check_out > $2
              AND ($4::uuid IS NULL OR id <> $4)
        )
        "#,
    )
    .bind(site_id)
    .bind(stay.check_in)
    .bind(stay.check_out)
    .bind(exclude)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists.unwrap_or(false))
}

async fn lock_reservation(conn: &mut PgConnection, id: Uuid) -> Result<Option<Reservation>, sqlx::Error> {
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {} FROM reservations WHERE id = $1 FOR UPDATE",
        RESERVATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Serializes every booking and edit touching the same site
async fn lock_site(conn: &mut PgConnection, site_id: i32) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar("SELECT active FROM sites WHERE id = $1 FOR UPDATE")
        .bind(site_id)
        .fetch_optional(&mut *conn)
        .await
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservation = sqlx::query_as::<_, Reservation>(&format!(
                "SELECT {} FROM reservations WHERE id = $1",
                RESERVATION_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(reservation)
        })
        .await
    }

    async fn find_by_confirmation_code(&self, code: &str) -> Result<Option<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservation = sqlx::query_as::<_, Reservation>(&format!(
                "SELECT {} FROM reservations WHERE confirmation_code = $1",
                RESERVATION_COLUMNS
            ))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
            Ok(reservation)
        })
        .await
    }

    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservations = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                SELECT {}
                FROM reservations
                WHERE ($1::text IS NULL OR status = $1)
                  AND ($2::int IS NULL OR site_id = $2)
                ORDER BY check_in, site_id, id
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(filter.status)
            .bind(filter.site_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(reservations)
        })
        .await
    }

    async fn list_for_guest(&self, guest_id: i32) -> Result<Vec<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservations = sqlx::query_as::<_, Reservation>(&format!(
                "SELECT {} FROM reservations WHERE guest_id = $1 ORDER BY check_in DESC, created_at DESC",
                RESERVATION_COLUMNS
            ))
            .bind(guest_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(reservations)
        })
        .await
    }

    async fn unpaid_confirmed(&self) -> Result<Vec<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservations = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                SELECT {}
                FROM reservations
                WHERE status = 'confirmed' AND NOT paid
                ORDER BY check_in, site_id
                "#,
                RESERVATION_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?;
            Ok(reservations)
        })
        .await
    }

    async fn confirmed_overlapping(
        &self,
        stay: &StayRange,
        site_id: Option<i32>,
    ) -> Result<Vec<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservations = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                SELECT {}
                FROM reservations
                WHERE status = 'confirmed'
                  AND check_in < $2
                  AND check_out > $1
                  AND ($3::int IS NULL OR site_id = $3)
                ORDER BY site_id, check_in
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(stay.check_in)
            .bind(stay.check_out)
            .bind(site_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(reservations)
        })
        .await
    }

    async fn insert_if_available(&self, new: &NewReservation) -> Result<InsertOutcome, StorageError> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            if lock_site(&mut tx, new.site_id).await? != Some(true) {
                return Ok(InsertOutcome::SiteUnavailable);
            }
            if overlapping_exists(&mut tx, new.site_id, &new.stay(), None).await? {
                return Ok(InsertOutcome::Conflict);
            }

            let inserted = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                INSERT INTO reservations (
                    id, site_id, guest_id, guest_name, guest_email, rig_length_ft,
                    check_in, check_out, status, nightly_rate, amount_paid, paid,
                    pcs_exempt, confirmation_code
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'confirmed', $9, $10, FALSE, $11, $12)
                RETURNING {}
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(new.id)
            .bind(new.site_id)
            .bind(new.guest_id)
            .bind(&new.guest_name)
            .bind(&new.guest_email)
            .bind(new.rig_length_ft)
            .bind(new.check_in)
            .bind(new.check_out)
            .bind(new.nightly_rate)
            .bind(new.amount_paid)
            .bind(new.pcs_exempt)
            .bind(&new.confirmation_code)
            .fetch_one(&mut *tx)
            .await;

            let reservation = match inserted {
                Ok(reservation) => reservation,
                Err(e) => {
                    return match StorageError::from(e) {
                        StorageError::Exclusion { .. } => Ok(InsertOutcome::Conflict),
                        e if e.is_duplicate_of(CONFIRMATION_CODE_KEY) => Ok(InsertOutcome::DuplicateCode),
                        e => Err(e),
                    }
                }
            };

            tx.commit().await?;
            Ok(InsertOutcome::Inserted(reservation))
        })
        .await
    }

    async fn update_if_available(&self, id: Uuid, change: &ReservationChange) -> Result<UpdateOutcome, StorageError> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let current = match lock_reservation(&mut tx, id).await? {
                Some(reservation) => reservation,
                None => return Ok(UpdateOutcome::NotFound),
            };
            if current.status != ReservationStatus::Confirmed {
                return Ok(UpdateOutcome::NotEditable(current.status));
            }
            if current.version != change.expected_version {
                return Ok(UpdateOutcome::Stale);
            }

            if lock_site(&mut tx, current.site_id).await? != Some(true) {
                return Ok(UpdateOutcome::SiteUnavailable);
            }
            if overlapping_exists(&mut tx, current.site_id, &change.stay(), Some(id)).await? {
                return Ok(UpdateOutcome::Conflict);
            }

            let updated = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                UPDATE reservations
                SET guest_name = $1,
                    guest_email = $2,
                    rig_length_ft = $3,
                    check_in = $4,
                    check_out = $5,
                    amount_paid = $6,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $7
                RETURNING {}
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(&change.guest_name)
            .bind(&change.guest_email)
            .bind(change.rig_length_ft)
            .bind(change.check_in)
            .bind(change.check_out)
            .bind(change.amount_paid)
            .bind(id)
            .fetch_one(&mut *tx)
            .await;

            let reservation = match updated {
                Ok(reservation) => reservation,
                Err(e) => {
                    return match StorageError::from(e) {
                        StorageError::Exclusion { .. } => Ok(UpdateOutcome::Conflict),
                        e => Err(e),
                    }
                }
            };

            let adjustment = match &change.adjustment {
                Some(payment) => Some(append_payment(&mut tx, payment).await?),
                None => None,
            };

            tx.commit().await?;
            Ok(UpdateOutcome::Updated {
                reservation,
                adjustment,
            })
        })
        .await
    }

    async fn cancel(&self, id: Uuid, cancellation: &Cancellation) -> Result<CancelOutcome, StorageError> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let current = match lock_reservation(&mut tx, id).await? {
                Some(reservation) => reservation,
                None => return Ok(CancelOutcome::NotFound),
            };
            match current.status {
                ReservationStatus::Cancelled => return Ok(CancelOutcome::AlreadyCancelled(current)),
                ReservationStatus::Completed => return Ok(CancelOutcome::NotCancellable(current.status)),
                ReservationStatus::Confirmed => {}
            }
            if current.version != cancellation.expected_version {
                return Ok(CancelOutcome::Stale);
            }

            let reservation = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                UPDATE reservations
                SET status = 'cancelled',
                    cancellation_fee = $1,
                    refund_amount = $2,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $3
                RETURNING {}
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(cancellation.fee)
            .bind(cancellation.refund)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            let refund_payment = match &cancellation.refund_payment {
                Some(payment) => Some(append_payment(&mut tx, payment).await?),
                None => None,
            };

            tx.commit().await?;
            Ok(CancelOutcome::Cancelled {
                reservation,
                refund_payment,
            })
        })
        .await
    }

    async fn record_charge(&self, id: Uuid, payment: &NewPayment) -> Result<ChargeOutcome, StorageError> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let current = match lock_reservation(&mut tx, id).await? {
                Some(reservation) => reservation,
                None => return Ok(ChargeOutcome::NotFound),
            };
            if current.status != ReservationStatus::Confirmed {
                return Ok(ChargeOutcome::NotPayable(current.status));
            }

            let reservation = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                UPDATE reservations
                SET paid = TRUE,
                    payment_method = $1,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $2
                RETURNING {}
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(&payment.method)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            let payment = append_payment(&mut tx, payment).await?;

            tx.commit().await?;
            Ok(ChargeOutcome::Recorded { reservation, payment })
        })
        .await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Option<Reservation>, StorageError> {
        with_timeout(self.timeout, async {
            let reservation = sqlx::query_as::<_, Reservation>(&format!(
                r#"
                UPDATE reservations
                SET status = $1, version = version + 1, updated_at = NOW()
                WHERE id = $2 AND status = $3
                RETURNING {}
                "#,
                RESERVATION_COLUMNS
            ))
            .bind(to)
            .bind(id)
            .bind(from)
            .fetch_optional(&self.pool)
            .await?;
            Ok(reservation)
        })
        .await
    }

    async fn next_check_ins(&self, after: NaiveDate) -> Result<Vec<NextCheckIn>, StorageError> {
        with_timeout(self.timeout, async {
            let rows = sqlx::query_as::<_, NextCheckIn>(
                r#"
                SELECT site_id, MIN(check_in) AS check_in
                FROM reservations
                WHERE status = 'confirmed' AND check_in > $1
                GROUP BY site_id
                "#,
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }
}
