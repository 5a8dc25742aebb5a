// In-memory stores for unit and HTTP tests
//
// One mutex guards all tables, so every trait method is atomic in the same
// way the Postgres transactions are.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::calendar::StayRange;
use crate::db::StorageError;
use crate::events::{NewSpecialEvent, SpecialEvent, SpecialEventStore};
use crate::payments::{NewPayment, Payment, PaymentLedger};
use crate::rates::{NewRatePlan, RatePlan, RatePlanStore};
use crate::reservations::{
    CancelOutcome, Cancellation, ChargeOutcome, InsertOutcome, NewReservation, NextCheckIn, Reservation,
    ReservationChange, ReservationFilter, ReservationStatus, ReservationStore, UpdateOutcome,
};
use crate::sites::{NewSite, Site, SiteStore, SiteType, ACTIVE_NUMBER_INDEX};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[derive(Default)]
struct Tables {
    sites: Vec<Site>,
    reservations: Vec<Reservation>,
    rate_plans: Vec<RatePlan>,
    events: Vec<SpecialEvent>,
    payments: Vec<Payment>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn overlapping_confirmed(&self, site_id: i32, stay: &StayRange, exclude: Option<Uuid>) -> bool {
        self.reservations.iter().any(|r| {
            r.site_id == site_id
                && r.status == ReservationStatus::Confirmed
                && Some(r.id) != exclude
                && r.stay().overlaps(stay)
        })
    }

    fn active_number_taken(&self, number: i32, exclude_id: Option<i32>) -> bool {
        self.sites
            .iter()
            .any(|s| s.active && s.number == number && Some(s.id) != exclude_id)
    }

    fn append(&mut self, payment: &NewPayment) -> Payment {
        let payment = payment.clone().into_payment(Utc::now());
        self.payments.push(payment.clone());
        payment
    }

    fn reservation_mut(&mut self, id: Uuid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every store call fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(self.tables.lock().unwrap())
    }

    pub fn add_site(&self, number: i32, site_type: SiteType, max_length_ft: i32) -> Site {
        let mut tables = self.tables.lock().unwrap();
        let site = Site {
            id: tables.next_id(),
            number,
            site_type,
            max_length_ft,
            active: true,
            description: None,
        };
        tables.sites.push(site.clone());
        site
    }

    pub fn retire_site(&self, id: i32) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(site) = tables.sites.iter_mut().find(|s| s.id == id) {
            site.active = false;
        }
    }

    /// CONFIRMED reservation at 30.00/night, bypassing the booking engine
    pub fn add_confirmed(&self, site_id: i32, check_in: &str, check_out: &str) -> Reservation {
        let stay = StayRange::new(date(check_in), date(check_out)).unwrap();
        let rate = Decimal::new(3000, 2);
        self.add_reservation(site_id, check_in, check_out, rate, rate * Decimal::from(stay.nights()))
    }

    pub fn add_reservation(
        &self,
        site_id: i32,
        check_in: &str,
        check_out: &str,
        nightly_rate: Decimal,
        amount_paid: Decimal,
    ) -> Reservation {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let reservation = Reservation {
            id,
            site_id,
            guest_id: None,
            guest_name: "Seeded Guest".to_string(),
            guest_email: None,
            rig_length_ft: 20,
            check_in: date(check_in),
            check_out: date(check_out),
            status: ReservationStatus::Confirmed,
            nightly_rate,
            amount_paid,
            payment_method: None,
            paid: false,
            pcs_exempt: false,
            confirmation_code: format!("RV-{}", &id.simple().to_string()[..8].to_uppercase()),
            cancellation_fee: None,
            refund_amount: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().reservations.push(reservation.clone());
        reservation
    }

    pub fn set_status(&self, id: Uuid, status: ReservationStatus) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(reservation) = tables.reservation_mut(id) {
            reservation.status = status;
            reservation.version += 1;
        }
    }

    pub fn set_guest(&self, id: Uuid, guest_id: i32) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(reservation) = tables.reservation_mut(id) {
            reservation.guest_id = Some(guest_id);
        }
    }

    pub fn set_paid(&self, id: Uuid) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(reservation) = tables.reservation_mut(id) {
            reservation.paid = true;
            reservation.version += 1;
        }
    }

    /// Move a stay to new dates without touching its price, as another writer would
    pub fn move_stay(&self, id: Uuid, check_in: &str, check_out: &str) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(reservation) = tables.reservation_mut(id) {
            reservation.check_in = date(check_in);
            reservation.check_out = date(check_out);
            reservation.version += 1;
            reservation.updated_at = Utc::now();
        }
    }

    pub fn reservations_snapshot(&self) -> Vec<Reservation> {
        self.tables.lock().unwrap().reservations.clone()
    }
}

#[async_trait]
impl SiteStore for InMemoryStore {
    async fn get(&self, id: i32) -> Result<Option<Site>, StorageError> {
        Ok(self.lock()?.sites.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Site>, StorageError> {
        let mut sites: Vec<Site> = self
            .lock()?
            .sites
            .iter()
            .filter(|s| include_inactive || s.active)
            .cloned()
            .collect();
        sites.sort_by_key(|s| (s.number, s.id));
        Ok(sites)
    }

    async fn find_candidates(
        &self,
        min_length_ft: i32,
        site_type: Option<SiteType>,
    ) -> Result<Vec<Site>, StorageError> {
        Ok(self
            .lock()?
            .sites
            .iter()
            .filter(|s| s.active && s.max_length_ft >= min_length_ft)
            .filter(|s| site_type.map_or(true, |t| s.site_type == t))
            .cloned()
            .collect())
    }

    async fn active_number_taken(&self, number: i32, exclude_id: Option<i32>) -> Result<bool, StorageError> {
        Ok(self.lock()?.active_number_taken(number, exclude_id))
    }

    async fn insert(&self, new: &NewSite) -> Result<Site, StorageError> {
        let mut tables = self.lock()?;
        if tables.active_number_taken(new.number, None) {
            return Err(StorageError::Duplicate {
                constraint: ACTIVE_NUMBER_INDEX.to_string(),
            });
        }
        let site = Site {
            id: tables.next_id(),
            number: new.number,
            site_type: new.site_type,
            max_length_ft: new.max_length_ft,
            active: true,
            description: new.description.clone(),
        };
        tables.sites.push(site.clone());
        Ok(site)
    }

    async fn update(&self, site: &Site) -> Result<Option<Site>, StorageError> {
        let mut tables = self.lock()?;
        if site.active && tables.active_number_taken(site.number, Some(site.id)) {
            return Err(StorageError::Duplicate {
                constraint: ACTIVE_NUMBER_INDEX.to_string(),
            });
        }
        Ok(tables.sites.iter_mut().find(|s| s.id == site.id).map(|existing| {
            *existing = site.clone();
            existing.clone()
        }))
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StorageError> {
        Ok(self.lock()?.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_confirmation_code(&self, code: &str) -> Result<Option<Reservation>, StorageError> {
        Ok(self
            .lock()?
            .reservations
            .iter()
            .find(|r| r.confirmation_code == code)
            .cloned())
    }

    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        let mut reservations: Vec<Reservation> = self
            .lock()?
            .reservations
            .iter()
            .filter(|r| filter.status.map_or(true, |status| r.status == status))
            .filter(|r| filter.site_id.map_or(true, |id| r.site_id == id))
            .cloned()
            .collect();
        reservations.sort_by_key(|r| (r.check_in, r.site_id, r.id));
        Ok(reservations)
    }

    async fn list_for_guest(&self, guest_id: i32) -> Result<Vec<Reservation>, StorageError> {
        let mut reservations: Vec<Reservation> = self
            .lock()?
            .reservations
            .iter()
            .filter(|r| r.guest_id == Some(guest_id))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.check_in.cmp(&a.check_in).then(b.created_at.cmp(&a.created_at)));
        Ok(reservations)
    }

    async fn unpaid_confirmed(&self) -> Result<Vec<Reservation>, StorageError> {
        let mut reservations: Vec<Reservation> = self
            .lock()?
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed && !r.paid)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| (r.check_in, r.site_id));
        Ok(reservations)
    }

    async fn confirmed_overlapping(
        &self,
        stay: &StayRange,
        site_id: Option<i32>,
    ) -> Result<Vec<Reservation>, StorageError> {
        Ok(self
            .lock()?
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed && r.stay().overlaps(stay))
            .filter(|r| site_id.map_or(true, |id| r.site_id == id))
            .cloned()
            .collect())
    }

    async fn insert_if_available(&self, new: &NewReservation) -> Result<InsertOutcome, StorageError> {
        let mut tables = self.lock()?;
        if !tables.sites.iter().any(|s| s.id == new.site_id && s.active) {
            return Ok(InsertOutcome::SiteUnavailable);
        }
        if tables.overlapping_confirmed(new.site_id, &new.stay(), None) {
            return Ok(InsertOutcome::Conflict);
        }
        if tables
            .reservations
            .iter()
            .any(|r| r.confirmation_code == new.confirmation_code)
        {
            return Ok(InsertOutcome::DuplicateCode);
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: new.id,
            site_id: new.site_id,
            guest_id: new.guest_id,
            guest_name: new.guest_name.clone(),
            guest_email: new.guest_email.clone(),
            rig_length_ft: new.rig_length_ft,
            check_in: new.check_in,
            check_out: new.check_out,
            status: ReservationStatus::Confirmed,
            nightly_rate: new.nightly_rate,
            amount_paid: new.amount_paid,
            payment_method: None,
            paid: false,
            pcs_exempt: new.pcs_exempt,
            confirmation_code: new.confirmation_code.clone(),
            cancellation_fee: None,
            refund_amount: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        tables.reservations.push(reservation.clone());
        Ok(InsertOutcome::Inserted(reservation))
    }

    async fn update_if_available(&self, id: Uuid, change: &ReservationChange) -> Result<UpdateOutcome, StorageError> {
        let mut tables = self.lock()?;
        let current = match tables.reservations.iter().find(|r| r.id == id) {
            Some(reservation) => reservation.clone(),
            None => return Ok(UpdateOutcome::NotFound),
        };
        if current.status != ReservationStatus::Confirmed {
            return Ok(UpdateOutcome::NotEditable(current.status));
        }
        if current.version != change.expected_version {
            return Ok(UpdateOutcome::Stale);
        }
        if !tables.sites.iter().any(|s| s.id == current.site_id && s.active) {
            return Ok(UpdateOutcome::SiteUnavailable);
        }
        if tables.overlapping_confirmed(current.site_id, &change.stay(), Some(id)) {
            return Ok(UpdateOutcome::Conflict);
        }

        let adjustment = change.adjustment.as_ref().map(|payment| tables.append(payment));
        let Some(reservation) = tables.reservation_mut(id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        reservation.guest_name = change.guest_name.clone();
        reservation.guest_email = change.guest_email.clone();
        reservation.rig_length_ft = change.rig_length_ft;
        reservation.check_in = change.check_in;
        reservation.check_out = change.check_out;
        reservation.amount_paid = change.amount_paid;
        reservation.version += 1;
        reservation.updated_at = Utc::now();

        Ok(UpdateOutcome::Updated {
            reservation: reservation.clone(),
            adjustment,
        })
    }

    async fn cancel(&self, id: Uuid, cancellation: &Cancellation) -> Result<CancelOutcome, StorageError> {
        let mut tables = self.lock()?;
        let current = match tables.reservations.iter().find(|r| r.id == id) {
            Some(reservation) => reservation.clone(),
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

        let refund_payment = cancellation.refund_payment.as_ref().map(|payment| tables.append(payment));
        let Some(reservation) = tables.reservation_mut(id) else {
            return Ok(CancelOutcome::NotFound);
        };
        reservation.status = ReservationStatus::Cancelled;
        reservation.cancellation_fee = Some(cancellation.fee);
        reservation.refund_amount = Some(cancellation.refund);
        reservation.version += 1;
        reservation.updated_at = Utc::now();

        Ok(CancelOutcome::Cancelled {
            reservation: reservation.clone(),
            refund_payment,
        })
    }

    async fn record_charge(&self, id: Uuid, payment: &NewPayment) -> Result<ChargeOutcome, StorageError> {
        let mut tables = self.lock()?;
        let status = match tables.reservations.iter().find(|r| r.id == id) {
            Some(reservation) => reservation.status,
            None => return Ok(ChargeOutcome::NotFound),
        };
        if status != ReservationStatus::Confirmed {
            return Ok(ChargeOutcome::NotPayable(status));
        }

        let payment = tables.append(payment);
        let Some(reservation) = tables.reservation_mut(id) else {
            return Ok(ChargeOutcome::NotFound);
        };
        reservation.paid = true;
        reservation.payment_method = Some(payment.method.clone());
        reservation.version += 1;
        reservation.updated_at = Utc::now();

        Ok(ChargeOutcome::Recorded {
            reservation: reservation.clone(),
            payment,
        })
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Option<Reservation>, StorageError> {
        let mut tables = self.lock()?;
        Ok(tables
            .reservation_mut(id)
            .filter(|r| r.status == from)
            .map(|reservation| {
                reservation.status = to;
                reservation.version += 1;
                reservation.updated_at = Utc::now();
                reservation.clone()
            }))
    }

    async fn next_check_ins(&self, after: NaiveDate) -> Result<Vec<NextCheckIn>, StorageError> {
        let tables = self.lock()?;
        let mut next: Vec<NextCheckIn> = Vec::new();
        for r in tables
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed && r.check_in > after)
        {
            match next.iter_mut().find(|n| n.site_id == r.site_id) {
                Some(existing) if existing.check_in > r.check_in => existing.check_in = r.check_in,
                Some(_) => {}
                None => next.push(NextCheckIn {
                    site_id: r.site_id,
                    check_in: r.check_in,
                }),
            }
        }
        Ok(next)
    }
}

#[async_trait]
impl RatePlanStore for InMemoryStore {
    async fn list(&self, include_inactive: bool) -> Result<Vec<RatePlan>, StorageError> {
        Ok(self
            .lock()?
            .rate_plans
            .iter()
            .filter(|p| include_inactive || p.active)
            .cloned()
            .collect())
    }

    async fn insert(&self, plan: &NewRatePlan) -> Result<RatePlan, StorageError> {
        let mut tables = self.lock()?;
        let plan = RatePlan {
            id: tables.next_id(),
            site_type: plan.site_type,
            nightly_rate: plan.nightly_rate,
            start_date: plan.start_date,
            end_date: plan.end_date,
            active: true,
            created_at: Utc::now(),
        };
        tables.rate_plans.push(plan.clone());
        Ok(plan)
    }

    async fn deactivate(&self, id: i32) -> Result<Option<RatePlan>, StorageError> {
        let mut tables = self.lock()?;
        Ok(tables.rate_plans.iter_mut().find(|p| p.id == id).map(|plan| {
            plan.active = false;
            plan.clone()
        }))
    }
}

#[async_trait]
impl SpecialEventStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<SpecialEvent>, StorageError> {
        let mut events = self.lock()?.events.clone();
        events.sort_by_key(|e| (e.start_date, e.id));
        Ok(events)
    }

    async fn insert(&self, event: &NewSpecialEvent) -> Result<SpecialEvent, StorageError> {
        let mut tables = self.lock()?;
        let event = SpecialEvent {
            id: tables.next_id(),
            name: event.name.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn delete(&self, id: i32) -> Result<bool, StorageError> {
        let mut tables = self.lock()?;
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        Ok(tables.events.len() != before)
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn history(&self, reservation_id: Uuid) -> Result<Vec<Payment>, StorageError> {
        Ok(self
            .lock()?
            .payments
            .iter()
            .filter(|p| p.reservation_id == reservation_id)
            .cloned()
            .collect())
    }
}

type Interleaved = Box<dyn FnOnce(&InMemoryStore) + Send>;

/// Reservation store that lets another writer act between an engine's read
/// and its atomic write, and can report confirmation-code collisions.
pub struct InterleavingStore {
    inner: Arc<InMemoryStore>,
    before_write: Mutex<VecDeque<Interleaved>>,
    duplicate_codes: AtomicUsize,
    attempted_codes: Mutex<Vec<String>>,
}

impl InterleavingStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            before_write: Mutex::new(VecDeque::new()),
            duplicate_codes: AtomicUsize::new(0),
            attempted_codes: Mutex::new(Vec::new()),
        }
    }

    /// Queue `write` to run against the backing store right before the next
    /// atomic write that has nothing queued ahead of it
    pub fn before_next_write(&self, write: impl FnOnce(&InMemoryStore) + Send + 'static) {
        self.before_write.lock().unwrap().push_back(Box::new(write));
    }

    /// Report the next `count` inserts as confirmation-code collisions
    pub fn collide_codes(&self, count: usize) {
        self.duplicate_codes.store(count, Ordering::SeqCst);
    }

    pub fn attempted_codes(&self) -> Vec<String> {
        self.attempted_codes.lock().unwrap().clone()
    }

    fn interleave(&self) {
        let write = self.before_write.lock().unwrap().pop_front();
        if let Some(write) = write {
            write(&self.inner);
        }
    }
}

#[async_trait]
impl ReservationStore for InterleavingStore {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StorageError> {
        ReservationStore::get(self.inner.as_ref(), id).await
    }

    async fn find_by_confirmation_code(&self, code: &str) -> Result<Option<Reservation>, StorageError> {
        self.inner.find_by_confirmation_code(code).await
    }

    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        ReservationStore::list(self.inner.as_ref(), filter).await
    }

    async fn list_for_guest(&self, guest_id: i32) -> Result<Vec<Reservation>, StorageError> {
        self.inner.list_for_guest(guest_id).await
    }

    async fn unpaid_confirmed(&self) -> Result<Vec<Reservation>, StorageError> {
        self.inner.unpaid_confirmed().await
    }

    async fn confirmed_overlapping(
        &self,
        stay: &StayRange,
        site_id: Option<i32>,
    ) -> Result<Vec<Reservation>, StorageError> {
        self.inner.confirmed_overlapping(stay, site_id).await
    }

    async fn insert_if_available(&self, new: &NewReservation) -> Result<InsertOutcome, StorageError> {
        self.attempted_codes.lock().unwrap().push(new.confirmation_code.clone());
        let collide = self
            .duplicate_codes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if collide {
            return Ok(InsertOutcome::DuplicateCode);
        }
        self.interleave();
        self.inner.insert_if_available(new).await
    }

    async fn update_if_available(&self, id: Uuid, change: &ReservationChange) -> Result<UpdateOutcome, StorageError> {
        self.interleave();
        self.inner.update_if_available(id, change).await
    }

    async fn cancel(&self, id: Uuid, cancellation: &Cancellation) -> Result<CancelOutcome, StorageError> {
        self.interleave();
        self.inner.cancel(id, cancellation).await
    }

    async fn record_charge(&self, id: Uuid, payment: &NewPayment) -> Result<ChargeOutcome, StorageError> {
        self.interleave();
        self.inner.record_charge(id, payment).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<Option<Reservation>, StorageError> {
        self.interleave();
        self.inner.transition_status(id, from, to).await
    }

    async fn next_check_ins(&self, after: NaiveDate) -> Result<Vec<NextCheckIn>, StorageError> {
        self.inner.next_check_ins(after).await
    }
}
