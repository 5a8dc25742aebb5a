// Special event registry
//
// Read-only policy lookup for the cancellation engine: does a stay touch any
// special event window? Admin changes go through here so the cache stays
// coherent.

use std::sync::Arc;

use crate::cache::PolicyCache;
use crate::calendar::StayRange;
use crate::db::StorageError;
use crate::events::{CreateSpecialEventRequest, NewSpecialEvent, SpecialEvent, SpecialEventStore};

/// Error types for special event administration
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Special event {0} not found")]
    NotFound(i32),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

pub struct SpecialEventRegistry {
    store: Arc<dyn SpecialEventStore>,
    cache: PolicyCache<Vec<SpecialEvent>>,
}

impl SpecialEventRegistry {
    pub fn new(store: Arc<dyn SpecialEventStore>, cache: PolicyCache<Vec<SpecialEvent>>) -> Self {
        Self { store, cache }
    }

    async fn all_events(&self) -> Result<Arc<Vec<SpecialEvent>>, StorageError> {
        let store = Arc::clone(&self.store);
        self.cache.get_or_load(|| async move { store.list().await }).await
    }

    /// Events whose window intersects the stay
    pub async fn events_overlapping(&self, stay: &StayRange) -> Result<Vec<SpecialEvent>, StorageError> {
        let events = self.all_events().await?;
        Ok(events.iter().filter(|event| event.overlaps_stay(stay)).cloned().collect())
    }

    pub async fn overlaps_special_event(&self, stay: &StayRange) -> Result<bool, StorageError> {
        let events = self.all_events().await?;
        let overlapping = events.iter().find(|event| event.overlaps_stay(stay));
        if let Some(event) = overlapping {
            tracing::debug!("Stay {} overlaps special event '{}'", stay, event.name);
        }
        Ok(overlapping.is_some())
    }

    pub async fn list_events(&self) -> Result<Vec<SpecialEvent>, EventError> {
        Ok(self.store.list().await?)
    }

    pub async fn create_event(&self, request: CreateSpecialEventRequest) -> Result<SpecialEvent, EventError> {
        let event = self.store.insert(&NewSpecialEvent::from(request)).await?;
        self.cache.invalidate().await;
        tracing::info!(
            "Created special event {} '{}' ({} to {})",
            event.id,
            event.name,
            event.start_date,
            event.end_date
        );
        Ok(event)
    }

    pub async fn delete_event(&self, id: i32) -> Result<(), EventError> {
        if !self.store.delete(id).await? {
            return Err(EventError::NotFound(id));
        }
        self.cache.invalidate().await;
        tracing::info!("Deleted special event {}", id);
        Ok(())
    }
}
