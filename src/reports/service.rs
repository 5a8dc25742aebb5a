// Front-desk reports
//
// Data only: the walk-in board, the nightly occupancy list and the unpaid
// walk-ins. Formatting is left to whoever renders them.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::calendar::{CalendarError, StayRange};
use crate::db::StorageError;
use crate::reports::{OccupancyReport, SiteOccupancy, UnpaidReservation, WalkInAvailability};
use crate::reservations::{PriceCalculator, ReservationStore};
use crate::sites::SiteStore;

/// Error types for front-desk reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    InvalidDate(#[from] CalendarError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

#[derive(Clone)]
pub struct ReportService {
    sites: Arc<dyn SiteStore>,
    reservations: Arc<dyn ReservationStore>,
}

impl ReportService {
    pub fn new(sites: Arc<dyn SiteStore>, reservations: Arc<dyn ReservationStore>) -> Self {
        Self { sites, reservations }
    }

    /// Active sites by number, each with its next confirmed check-in after `today`
    pub async fn walk_in_availability(&self, today: NaiveDate) -> Result<Vec<WalkInAvailability>, ReportError> {
        let sites = self.sites.list(false).await?;
        let next: HashMap<i32, NaiveDate> = self
            .reservations
            .next_check_ins(today)
            .await?
            .into_iter()
            .map(|row| (row.site_id, row.check_in))
            .collect();

        let board: Vec<WalkInAvailability> = sites
            .into_iter()
            .map(|site| {
                let next_check_in = next.get(&site.id).copied();
                WalkInAvailability {
                    days_until_next_check_in: next_check_in.map(|date| (date - today).num_days()),
                    next_check_in,
                    site,
                }
            })
            .collect();

        tracing::debug!("Walk-in board for {}: {} site(s)", today, board.len());
        Ok(board)
    }

    /// Active sites by number with the confirmed reservation holding the night of `date`
    pub async fn occupancy_on(&self, date: NaiveDate) -> Result<OccupancyReport, ReportError> {
        let night = StayRange::night_of(date)?;
        let sites = self.sites.list(false).await?;
        let mut holding: HashMap<i32, _> = self
            .reservations
            .confirmed_overlapping(&night, None)
            .await?
            .into_iter()
            .filter(|reservation| reservation.stay().contains(date))
            .map(|reservation| (reservation.site_id, reservation))
            .collect();

        let sites: Vec<SiteOccupancy> = sites
            .into_iter()
            .map(|site| SiteOccupancy {
                reservation: holding.remove(&site.id),
                site,
            })
            .collect();
        let occupied = sites.iter().filter(|entry| entry.reservation.is_some()).count();

        tracing::debug!("Occupancy on {}: {}/{}", date, occupied, sites.len());
        Ok(OccupancyReport { date, occupied, sites })
    }

    /// CONFIRMED reservations with no payment yet, soonest check-in first
    pub async fn unpaid_reservations(&self) -> Result<Vec<UnpaidReservation>, ReportError> {
        let unpaid: Vec<UnpaidReservation> = self
            .reservations
            .unpaid_confirmed()
            .await?
            .into_iter()
            .map(|reservation| {
                let nights = reservation.stay().nights();
                UnpaidReservation {
                    expected_amount: PriceCalculator::stay_total(reservation.nightly_rate, nights),
                    nights,
                    reservation,
                }
            })
            .collect();

        tracing::debug!("{} unpaid reservation(s)", unpaid.len());
        Ok(unpaid)
    }
}
