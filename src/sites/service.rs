use std::sync::Arc;

use crate::sites::{
    CreateSiteRequest, NewSite, Site, SiteError, SiteStore, UpdateSiteRequest, ACTIVE_NUMBER_INDEX,
};

/// Administrative operations on sites
///
/// Sites are never hard-deleted: reservations keep referring to retired sites
/// for history, so removal only clears the active flag.
#[derive(Clone)]
pub struct SiteService {
    store: Arc<dyn SiteStore>,
}

impl SiteService {
    pub fn new(store: Arc<dyn SiteStore>) -> Self {
        Self { store }
    }

    pub async fn list_sites(&self, include_inactive: bool) -> Result<Vec<Site>, SiteError> {
        Ok(self.store.list(include_inactive).await?)
    }

    pub async fn get_site(&self, id: i32) -> Result<Site, SiteError> {
        self.store.get(id).await?.ok_or(SiteError::NotFound(id))
    }

    pub async fn create_site(&self, request: CreateSiteRequest) -> Result<Site, SiteError> {
        if self.store.active_number_taken(request.number, None).await? {
            tracing::warn!("Attempt to create duplicate site number {}", request.number);
            return Err(SiteError::DuplicateNumber(request.number));
        }

        let number = request.number;
        let site = self
            .store
            .insert(&NewSite::from(request))
            .await
            .map_err(|e| duplicate_or(e, number))?;

        tracing::info!("Created site {} (number {}, {})", site.id, site.number, site.site_type);
        Ok(site)
    }

    /// Apply an update; making a site active (or renumbering an active one)
    /// re-checks number uniqueness among active sites.
    pub async fn update_site(&self, id: i32, request: UpdateSiteRequest) -> Result<Site, SiteError> {
        let existing = self.get_site(id).await?;
        let merged = request.apply_to(&existing);

        if merged.active && self.store.active_number_taken(merged.number, Some(id)).await? {
            tracing::warn!("Site {} update would duplicate active number {}", id, merged.number);
            return Err(SiteError::DuplicateNumber(merged.number));
        }

        let number = merged.number;
        let site = self
            .store
            .update(&merged)
            .await
            .map_err(|e| duplicate_or(e, number))?
            .ok_or(SiteError::NotFound(id))?;

        tracing::info!("Updated site {}", site.id);
        Ok(site)
    }

    /// Soft delete: the site stops appearing in searches and rejects new bookings
    pub async fn deactivate_site(&self, id: i32) -> Result<Site, SiteError> {
        let mut site = self.get_site(id).await?;
        if !site.active {
            return Ok(site);
        }
        site.active = false;

        let site = self.store.update(&site).await?.ok_or(SiteError::NotFound(id))?;
        tracing::info!("Deactivated site {} (number {})", site.id, site.number);
        Ok(site)
    }
}

/// A race past the service check still lands on the partial unique index
fn duplicate_or(error: crate::db::StorageError, number: i32) -> SiteError {
    if error.is_duplicate_of(ACTIVE_NUMBER_INDEX) {
        SiteError::DuplicateNumber(number)
    } else {
        SiteError::StorageUnavailable(error)
    }
}
