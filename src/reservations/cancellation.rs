// Cancellation engine
//
// Fee policy: a base administrative fee always applies; one extra night at
// the reservation's snapshot rate is added when the cancellation happens
// within the late window before check-in, or when the stay touches a special
// event. Cancelling twice replays the stored figures.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::events::SpecialEventRegistry;
use crate::metrics::BookingMetrics;
use crate::payments::NewPayment;
use crate::reservations::{
    CancelError, CancelOutcome, Cancellation, CancellationResult, PriceCalculator, Reservation, ReservationStatus,
    ReservationStore, StatusMachine,
};

/// Reads of a reservation before a cancel gives up on a row that keeps changing
const ASSESSMENT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub base_fee: Decimal,
    pub late_window_hours: i64,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            base_fee: Decimal::new(1000, 2),
            late_window_hours: 48,
        }
    }
}

impl CancellationPolicy {
    /// Check-in instant used for the late window (midnight UTC of the check-in day)
    pub fn check_in_instant(reservation: &Reservation) -> DateTime<Utc> {
        Utc.from_utc_datetime(&reservation.check_in.and_time(chrono::NaiveTime::MIN))
    }

    /// Whole hours from `now` until check-in; negative once check-in has passed
    pub fn hours_before_check_in(reservation: &Reservation, now: DateTime<Utc>) -> i64 {
        (Self::check_in_instant(reservation) - now).num_hours()
    }

    pub fn is_late(&self, reservation: &Reservation, now: DateTime<Utc>) -> bool {
        Self::check_in_instant(reservation) - now <= Duration::hours(self.late_window_hours)
    }

    /// Fee and refund for cancelling `reservation` at `now`
    pub fn assess(&self, reservation: &Reservation, now: DateTime<Utc>, is_special: bool) -> (Decimal, Decimal) {
        let charge_one_night = is_special || self.is_late(reservation, now);
        let fee = PriceCalculator::cancellation_fee(self.base_fee, reservation.nightly_rate, charge_one_night);
        let refund = PriceCalculator::refund(reservation.amount_paid, fee);
        (fee, refund)
    }
}

#[derive(Clone)]
pub struct CancellationEngine {
    reservations: Arc<dyn ReservationStore>,
    events: Arc<SpecialEventRegistry>,
    policy: CancellationPolicy,
    metrics: BookingMetrics,
}

impl CancellationEngine {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        events: Arc<SpecialEventRegistry>,
        policy: CancellationPolicy,
        metrics: BookingMetrics,
    ) -> Self {
        Self {
            reservations,
            events,
            policy,
            metrics,
        }
    }

    /// Cancel a reservation as of `now`, returning the fee kept and the refund
    /// issued. A refund ledger entry is written only when the refund is positive.
    pub async fn cancel(&self, id: Uuid, now: DateTime<Utc>) -> Result<CancellationResult, CancelError> {
        let result = self.try_cancel(id, now).await;
        if let Err(CancelError::StorageUnavailable(_)) = &result {
            self.metrics.record_storage_failure();
        }
        result
    }

    async fn try_cancel(&self, id: Uuid, now: DateTime<Utc>) -> Result<CancellationResult, CancelError> {
        for _ in 0..ASSESSMENT_ATTEMPTS {
            let current = self
                .reservations
                .get(id)
                .await?
                .ok_or(CancelError::ReservationNotFound(id))?;

            if current.status == ReservationStatus::Cancelled {
                tracing::debug!("Reservation {} already cancelled, replaying stored figures", id);
                return Ok(replayed(&current));
            }
            StatusMachine::transition(current.status, ReservationStatus::Cancelled).map_err(|message| {
                tracing::warn!("Rejected cancellation of reservation {}: {}", id, message);
                CancelError::InvalidTransition(message)
            })?;

            let is_special = self.events.overlaps_special_event(&current.stay()).await?;
            let (fee, refund) = self.policy.assess(&current, now, is_special);
            let cancellation = Cancellation {
                fee,
                refund,
                expected_version: current.version,
                refund_payment: (refund > Decimal::ZERO).then(|| NewPayment::refund(id, refund, fee)),
            };

            match self.reservations.cancel(id, &cancellation).await? {
                CancelOutcome::Cancelled {
                    reservation,
                    refund_payment,
                } => {
                    self.metrics.record_cancellation();
                    if refund_payment.is_some() {
                        self.metrics.record_refund();
                    }
                    tracing::info!(
                        "Cancelled reservation {} ({} h before check-in, special event: {}): fee {}, refund {}",
                        id,
                        CancellationPolicy::hours_before_check_in(&current, now),
                        is_special,
                        fee,
                        refund
                    );
                    return Ok(CancellationResult {
                        reservation_id: reservation.id,
                        confirmation_code: reservation.confirmation_code,
                        fee,
                        refund,
                        already_cancelled: false,
                    });
                }
                // A concurrent cancel won; report its figures
                CancelOutcome::AlreadyCancelled(reservation) => return Ok(replayed(&reservation)),
                CancelOutcome::NotCancellable(status) => {
                    return Err(CancelError::InvalidTransition(format!(
                        "Invalid status transition from {} to {}",
                        status,
                        ReservationStatus::Cancelled
                    )))
                }
                CancelOutcome::NotFound => return Err(CancelError::ReservationNotFound(id)),
                CancelOutcome::Stale => {
                    tracing::debug!("Reservation {} changed while being cancelled, reassessing", id);
                }
            }
        }

        tracing::warn!("Reservation {} kept changing while being cancelled", id);
        Err(CancelError::ConcurrentModification(id))
    }
}

fn replayed(reservation: &Reservation) -> CancellationResult {
    CancellationResult {
        reservation_id: reservation.id,
        confirmation_code: reservation.confirmation_code.clone(),
        fee: reservation.cancellation_fee.unwrap_or(Decimal::ZERO),
        refund: reservation.refund_amount.unwrap_or(Decimal::ZERO),
        already_cancelled: true,
    }
}
