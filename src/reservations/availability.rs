// Availability index
//
// Which active sites can take a rig for a date range, and whether one site is
// already held by a CONFIRMED reservation. Both questions use the same
// half-open overlap predicate; cancelled and completed stays never block.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::calendar::StayRange;
use crate::db::StorageError;
use crate::reservations::ReservationStore;
use crate::sites::{Site, SiteStore, SiteType};

/// Result ordering, chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteOrdering {
    /// Shortest adequate site first, then by number
    #[default]
    TightestFit,
    /// By display number, for administrative listings
    SiteNumber,
}

impl FromStr for SiteOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fit" | "length" | "tightest_fit" => Ok(SiteOrdering::TightestFit),
            "number" | "site_number" => Ok(SiteOrdering::SiteNumber),
            _ => Err(format!("Invalid ordering: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub stay: StayRange,
    pub min_rig_length_ft: i32,
    pub site_type: Option<SiteType>,
    pub ordering: SiteOrdering,
    /// Leave this site out (the one that just conflicted)
    pub exclude_site: Option<i32>,
}

impl AvailabilityQuery {
    pub fn new(stay: StayRange, min_rig_length_ft: i32, site_type: Option<SiteType>) -> Self {
        Self {
            stay,
            min_rig_length_ft,
            site_type,
            ordering: SiteOrdering::default(),
            exclude_site: None,
        }
    }
}

#[derive(Clone)]
pub struct AvailabilityIndex {
    sites: Arc<dyn SiteStore>,
    reservations: Arc<dyn ReservationStore>,
}

impl AvailabilityIndex {
    pub fn new(sites: Arc<dyn SiteStore>, reservations: Arc<dyn ReservationStore>) -> Self {
        Self { sites, reservations }
    }

    /// Active, long-enough sites of the requested type with no overlapping
    /// CONFIRMED reservation. An empty result is not an error.
    pub async fn find_available_sites(&self, query: &AvailabilityQuery) -> Result<Vec<Site>, StorageError> {
        let candidates = self
            .sites
            .find_candidates(query.min_rig_length_ft, query.site_type)
            .await?;

        let held: HashSet<i32> = self
            .reservations
            .confirmed_overlapping(&query.stay, None)
            .await?
            .into_iter()
            .filter(|reservation| reservation.stay().overlaps(&query.stay))
            .map(|reservation| reservation.site_id)
            .collect();

        let mut available: Vec<Site> = candidates
            .into_iter()
            .filter(|site| site.active && site.fits(query.min_rig_length_ft))
            .filter(|site| query.site_type.map_or(true, |t| site.site_type == t))
            .filter(|site| Some(site.id) != query.exclude_site)
            .filter(|site| !held.contains(&site.id))
            .collect();

        match query.ordering {
            SiteOrdering::TightestFit => available.sort_by_key(|site| (site.max_length_ft, site.number, site.id)),
            SiteOrdering::SiteNumber => available.sort_by_key(|site| (site.number, site.id)),
        }

        tracing::debug!(
            "{} site(s) available for {} (rig {} ft, type {:?})",
            available.len(),
            query.stay,
            query.min_rig_length_ft,
            query.site_type
        );
        Ok(available)
    }

    /// Whether a CONFIRMED reservation other than `exclude_reservation` holds
    /// any night of the stay on the site
    pub async fn has_conflict(
        &self,
        site_id: i32,
        stay: &StayRange,
        exclude_reservation: Option<Uuid>,
    ) -> Result<bool, StorageError> {
        let existing = self.reservations.confirmed_overlapping(stay, Some(site_id)).await?;
        let conflict = existing.iter().find(|reservation| {
            reservation.site_id == site_id
                && Some(reservation.id) != exclude_reservation
                && reservation.stay().overlaps(stay)
        });

        if let Some(reservation) = conflict {
            tracing::debug!(
                "Site {} is held by reservation {} ({}) for {}",
                site_id,
                reservation.id,
                reservation.stay(),
                stay
            );
        }
        Ok(conflict.is_some())
    }
}
