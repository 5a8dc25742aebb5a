// Booking engine
//
// Validates and persists new reservations and edits. Validation runs in a
// fixed order (dates, site, rig length, peak limit, conflict) so callers see
// the first rule a request breaks. The final check-and-write happens inside
// the store's atomic primitive; the pre-check here only exists to build the
// conflict report with alternatives.

use std::sync::Arc;
use uuid::Uuid;

use crate::calendar::{PeakSeason, StayRange};
use crate::metrics::BookingMetrics;
use crate::payments::{generate_reference, NewPayment};
use crate::rates::RatePolicy;
use crate::reservations::{
    AvailabilityIndex, AvailabilityQuery, BookingError, BookingOutcome, BookingRequest, ConflictReport,
    EditOutcome, EditRequest, EditedReservation, InsertOutcome, NewReservation, PriceCalculator, Reservation,
    ReservationChange, ReservationFilter, ReservationStatus, ReservationStore, SiteOrdering, StatusMachine, UpdateOutcome,
};
use crate::sites::{Site, SiteStore};

/// Attempts at drawing an unused confirmation code before giving up
const CONFIRMATION_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct BookingEngine {
    sites: Arc<dyn SiteStore>,
    reservations: Arc<dyn ReservationStore>,
    availability: AvailabilityIndex,
    rates: Arc<RatePolicy>,
    peak: PeakSeason,
    metrics: BookingMetrics,
}

impl BookingEngine {
    pub fn new(
        sites: Arc<dyn SiteStore>,
        reservations: Arc<dyn ReservationStore>,
        rates: Arc<RatePolicy>,
        peak: PeakSeason,
        metrics: BookingMetrics,
    ) -> Self {
        let availability = AvailabilityIndex::new(Arc::clone(&sites), Arc::clone(&reservations));
        Self {
            sites,
            reservations,
            availability,
            rates,
            peak,
            metrics,
        }
    }

    pub fn availability(&self) -> &AvailabilityIndex {
        &self.availability
    }

    /// Validate, price and persist a new CONFIRMED reservation.
    ///
    /// A conflict is returned as [`BookingOutcome::Conflict`] with substitute
    /// sites, not as an error.
    pub async fn create_reservation(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        let result = self.try_create(request).await;
        self.track_storage_failure(&result);
        result
    }

    async fn try_create(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        let stay = StayRange::new(request.check_in, request.check_out)?;
        let site = self.bookable_site(request.site_id).await?;
        self.check_stay_rules(&site, request.rig_length_ft, &stay, request.pcs_exempt)?;

        if self.availability.has_conflict(site.id, &stay, None).await? {
            return Ok(BookingOutcome::Conflict(
                self.conflict_report(&site, request.rig_length_ft, &stay).await?,
            ));
        }

        let nightly_rate = self.rates.active_rate_for(site.site_type, stay.check_in).await?;
        let amount = PriceCalculator::stay_total(nightly_rate, stay.nights());

        for _ in 0..CONFIRMATION_CODE_ATTEMPTS {
            let new = NewReservation {
                id: Uuid::new_v4(),
                site_id: site.id,
                guest_id: request.guest.guest_id,
                guest_name: request.guest.name.clone(),
                guest_email: request.guest.email.clone(),
                rig_length_ft: request.rig_length_ft,
                check_in: stay.check_in,
                check_out: stay.check_out,
                nightly_rate,
                amount_paid: amount,
                pcs_exempt: request.pcs_exempt,
                confirmation_code: generate_reference("RV"),
            };

            match self.reservations.insert_if_available(&new).await? {
                InsertOutcome::Inserted(reservation) => {
                    self.metrics.record_reservation_created();
                    tracing::info!(
                        "Created reservation {} ({}) on site {} for {}: {} nights at {} = {}",
                        reservation.id,
                        reservation.confirmation_code,
                        site.number,
                        stay,
                        stay.nights(),
                        nightly_rate,
                        amount
                    );
                    return Ok(BookingOutcome::Confirmed(reservation));
                }
                InsertOutcome::Conflict => {
                    // Lost the race to a concurrent booking
                    return Ok(BookingOutcome::Conflict(
                        self.conflict_report(&site, request.rig_length_ft, &stay).await?,
                    ));
                }
                InsertOutcome::SiteUnavailable => {
                    tracing::warn!("Site {} was retired while booking {}", site.id, stay);
                    return Err(BookingError::SiteNotFound(site.id));
                }
                InsertOutcome::DuplicateCode => {
                    tracing::debug!("Confirmation code {} already taken, drawing another", new.confirmation_code);
                }
            }
        }

        tracing::error!("Exhausted confirmation code attempts for site {}", site.id);
        Err(BookingError::ConfirmationCodeExhausted)
    }

    /// Re-validate a CONFIRMED reservation with new dates, guest details or rig
    /// length, keeping its site and snapshot rate. The difference from the
    /// previous amount is written to the ledger as an adjustment.
    pub async fn edit_reservation(&self, id: Uuid, edit: EditRequest) -> Result<EditOutcome, BookingError> {
        let result = self.try_edit(id, edit).await;
        self.track_storage_failure(&result);
        result
    }

    async fn try_edit(&self, id: Uuid, edit: EditRequest) -> Result<EditOutcome, BookingError> {
        let current = self.load(id).await?;
        StatusMachine::transition(current.status, ReservationStatus::Confirmed)
            .map_err(BookingError::InvalidTransition)?;

        let stay = StayRange::new(
            edit.check_in.unwrap_or(current.check_in),
            edit.check_out.unwrap_or(current.check_out),
        )?;
        let rig_length_ft = edit.rig_length_ft.unwrap_or(current.rig_length_ft);
        let site = self.bookable_site(current.site_id).await?;
        self.check_stay_rules(&site, rig_length_ft, &stay, current.pcs_exempt)?;

        if self.availability.has_conflict(site.id, &stay, Some(id)).await? {
            return Ok(EditOutcome::Conflict(self.conflict_report(&site, rig_length_ft, &stay).await?));
        }

        let amount = PriceCalculator::stay_total(current.nightly_rate, stay.nights());
        let delta = PriceCalculator::adjustment(current.amount_paid, amount);
        let adjustment =
            (!delta.is_zero()).then(|| NewPayment::adjustment(id, delta, current.amount_paid, amount));

        let change = ReservationChange {
            guest_name: edit.guest_name.unwrap_or_else(|| current.guest_name.clone()),
            guest_email: edit.guest_email.or_else(|| current.guest_email.clone()),
            rig_length_ft,
            check_in: stay.check_in,
            check_out: stay.check_out,
            amount_paid: amount,
            expected_version: current.version,
            adjustment,
        };

        match self.reservations.update_if_available(id, &change).await? {
            UpdateOutcome::Updated {
                reservation,
                adjustment,
            } => {
                self.metrics.record_edit();
                tracing::info!(
                    "Edited reservation {} to {}: {} -> {}",
                    id,
                    stay,
                    current.amount_paid,
                    reservation.amount_paid
                );
                Ok(EditOutcome::Updated(EditedReservation {
                    reservation,
                    adjustment,
                }))
            }
            UpdateOutcome::Conflict => Ok(EditOutcome::Conflict(
                self.conflict_report(&site, rig_length_ft, &stay).await?,
            )),
            UpdateOutcome::NotFound => Err(BookingError::ReservationNotFound(id.to_string())),
            UpdateOutcome::NotEditable(status) => Err(BookingError::InvalidTransition(format!(
                "Reservation {} is {} and can no longer be edited",
                id, status
            ))),
            UpdateOutcome::SiteUnavailable => {
                tracing::warn!("Site {} was retired while editing reservation {}", site.id, id);
                Err(BookingError::SiteNotFound(site.id))
            }
            UpdateOutcome::Stale => {
                tracing::warn!("Reservation {} changed while being edited", id);
                Err(BookingError::ConcurrentModification(id))
            }
        }
    }

    pub async fn get_reservation(&self, id: Uuid) -> Result<Reservation, BookingError> {
        self.load(id).await
    }

    /// Guest-facing lookup by confirmation code (case-insensitive)
    pub async fn find_by_confirmation_code(&self, code: &str) -> Result<Reservation, BookingError> {
        let normalized = code.trim().to_uppercase();
        self.reservations
            .find_by_confirmation_code(&normalized)
            .await?
            .ok_or(BookingError::ReservationNotFound(normalized))
    }

    /// Close out a stay: CONFIRMED -> COMPLETED. Completing twice is a no-op.
    pub async fn complete_reservation(&self, id: Uuid) -> Result<Reservation, BookingError> {
        let current = self.load(id).await?;
        StatusMachine::transition(current.status, ReservationStatus::Completed).map_err(|message| {
            tracing::warn!("Rejected completion of reservation {}: {}", id, message);
            BookingError::InvalidTransition(message)
        })?;
        if current.status == ReservationStatus::Completed {
            return Ok(current);
        }

        match self
            .reservations
            .transition_status(id, ReservationStatus::Confirmed, ReservationStatus::Completed)
            .await?
        {
            Some(reservation) => {
                tracing::info!("Completed reservation {}", id);
                Ok(reservation)
            }
            None => Err(BookingError::ConcurrentModification(id)),
        }
    }

    /// Front-desk listing, optionally narrowed by status and site
    pub async fn list_reservations(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, BookingError> {
        Ok(self.reservations.list(filter).await?)
    }

    /// A guest's own reservations, newest check-in first
    pub async fn guest_reservations(&self, guest_id: i32) -> Result<Vec<Reservation>, BookingError> {
        let reservations = self.reservations.list_for_guest(guest_id).await?;
        tracing::debug!("Guest {} has {} reservation(s)", guest_id, reservations.len());
        Ok(reservations)
    }

    async fn load(&self, id: Uuid) -> Result<Reservation, BookingError> {
        self.reservations
            .get(id)
            .await?
            .ok_or_else(|| BookingError::ReservationNotFound(id.to_string()))
    }

    async fn bookable_site(&self, site_id: i32) -> Result<Site, BookingError> {
        match self.sites.get(site_id).await? {
            Some(site) if site.active => Ok(site),
            _ => Err(BookingError::SiteNotFound(site_id)),
        }
    }

    fn check_stay_rules(
        &self,
        site: &Site,
        rig_length_ft: i32,
        stay: &StayRange,
        pcs_exempt: bool,
    ) -> Result<(), BookingError> {
        if rig_length_ft < 0 {
            return Err(BookingError::InvalidRigLength(rig_length_ft));
        }
        if !site.fits(rig_length_ft) {
            return Err(BookingError::RigTooLong {
                rig_length_ft,
                max_length_ft: site.max_length_ft,
            });
        }
        if self.peak.exceeds_peak_stay_limit(stay, pcs_exempt) {
            return Err(BookingError::PeakStayLimitExceeded {
                nights: stay.nights(),
                max_nights: self.peak.max_nights,
                check_in: stay.check_in,
            });
        }
        Ok(())
    }

    async fn conflict_report(
        &self,
        site: &Site,
        rig_length_ft: i32,
        stay: &StayRange,
    ) -> Result<ConflictReport, BookingError> {
        self.metrics.record_conflict();

        let mut query = AvailabilityQuery::new(*stay, rig_length_ft, Some(site.site_type));
        query.ordering = SiteOrdering::TightestFit;
        query.exclude_site = Some(site.id);
        let alternatives = self.availability.find_available_sites(&query).await?;

        tracing::warn!(
            "Site {} is already booked for {}; offering {} alternative(s)",
            site.number,
            stay,
            alternatives.len()
        );
        Ok(ConflictReport {
            site_id: site.id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            message: format!("Site {} is already booked for some of the requested nights", site.number),
            alternatives,
        })
    }

    fn track_storage_failure<T>(&self, result: &Result<T, BookingError>) {
        if let Err(BookingError::StorageUnavailable(_)) = result {
            self.metrics.record_storage_failure();
        }
    }
}
