// Rate policy
//
// Resolves the nightly rate for a site type on a date from the active rate
// plans, falling back to a configured default when no plan covers the date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::cache::PolicyCache;
use crate::db::StorageError;
use crate::rates::{CreateRatePlanRequest, NewRatePlan, RatePlan, RatePlanStore};
use crate::sites::SiteType;

/// Error types for rate plan administration
#[derive(Debug, thiserror::Error)]
pub enum RatePlanError {
    #[error("Rate plan {0} not found")]
    NotFound(i32),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// Pick the authoritative plan among `plans` for `site_type` on `on_date`.
///
/// The most recently started plan wins; equal start dates fall back to the
/// higher id (the later-created plan) so the choice is deterministic.
pub fn select_rate_plan(plans: &[RatePlan], site_type: SiteType, on_date: NaiveDate) -> Option<&RatePlan> {
    plans
        .iter()
        .filter(|plan| plan.applies_to(site_type, on_date))
        .max_by_key(|plan| (plan.start_date, plan.id))
}

pub struct RatePolicy {
    store: Arc<dyn RatePlanStore>,
    cache: PolicyCache<Vec<RatePlan>>,
    default_rate: Decimal,
}

impl RatePolicy {
    pub fn new(store: Arc<dyn RatePlanStore>, cache: PolicyCache<Vec<RatePlan>>, default_rate: Decimal) -> Self {
        Self {
            store,
            cache,
            default_rate,
        }
    }

    async fn active_plans(&self) -> Result<Arc<Vec<RatePlan>>, StorageError> {
        let store = Arc::clone(&self.store);
        self.cache.get_or_load(|| async move { store.list(false).await }).await
    }

    /// Nightly rate for `site_type` on `on_date`.
    ///
    /// Missing configuration never blocks a booking: with no matching plan the
    /// default rate applies. Storage failures are propagated, not defaulted.
    pub async fn active_rate_for(&self, site_type: SiteType, on_date: NaiveDate) -> Result<Decimal, StorageError> {
        let plans = self.active_plans().await?;
        match select_rate_plan(&plans, site_type, on_date) {
            Some(plan) => {
                tracing::debug!(
                    "Rate plan {} applies to {} on {}: {}",
                    plan.id,
                    site_type,
                    on_date,
                    plan.nightly_rate
                );
                Ok(plan.nightly_rate)
            }
            None => {
                tracing::debug!("No rate plan for {} on {}, using default {}", site_type, on_date, self.default_rate);
                Ok(self.default_rate)
            }
        }
    }

    pub async fn list_plans(&self, include_inactive: bool) -> Result<Vec<RatePlan>, RatePlanError> {
        Ok(self.store.list(include_inactive).await?)
    }

    pub async fn create_plan(&self, request: CreateRatePlanRequest) -> Result<RatePlan, RatePlanError> {
        let plan = self.store.insert(&NewRatePlan::from(request)).await?;
        self.cache.invalidate().await;
        tracing::info!(
            "Created rate plan {} for {}: {} from {}",
            plan.id,
            plan.site_type,
            plan.nightly_rate,
            plan.start_date
        );
        Ok(plan)
    }

    pub async fn deactivate_plan(&self, id: i32) -> Result<RatePlan, RatePlanError> {
        let plan = self.store.deactivate(id).await?.ok_or(RatePlanError::NotFound(id))?;
        self.cache.invalidate().await;
        tracing::info!("Deactivated rate plan {}", id);
        Ok(plan)
    }
}
