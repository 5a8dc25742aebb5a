// Booking metrics
//
// Lock-free counters for the booking core. Cheap to clone; every clone shares
// the same counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default)]
pub struct BookingMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    reservations_created: AtomicU64,
    booking_conflicts: AtomicU64,
    reservations_edited: AtomicU64,
    cancellations: AtomicU64,
    refunds_issued: AtomicU64,
    payments_recorded: AtomicU64,
    storage_failures: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct MetricsSnapshot {
    pub reservations_created: u64,
    pub booking_conflicts: u64,
    pub reservations_edited: u64,
    pub cancellations: u64,
    pub refunds_issued: u64,
    pub payments_recorded: u64,
    pub storage_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
}

impl BookingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reservation_created(&self) {
        self.inner.reservations_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.inner.booking_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_edit(&self) {
        self.inner.reservations_edited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.inner.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refund(&self) {
        self.inner.refunds_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payment(&self) {
        self.inner.payments_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_failure(&self) {
        self.inner.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            reservations_created: load(&self.inner.reservations_created),
            booking_conflicts: load(&self.inner.booking_conflicts),
            reservations_edited: load(&self.inner.reservations_edited),
            cancellations: load(&self.inner.cancellations),
            refunds_issued: load(&self.inner.refunds_issued),
            payments_recorded: load(&self.inner.payments_recorded),
            storage_failures: load(&self.inner.storage_failures),
            cache_hits: load(&self.inner.cache_hits),
            cache_misses: load(&self.inner.cache_misses),
            cache_hit_rate: self.cache_hit_rate(),
        }
    }
}
