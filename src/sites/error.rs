use crate::db::StorageError;

/// Error types for site administration
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Site {0} not found")]
    NotFound(i32),

    #[error("An active site with number {0} already exists")]
    DuplicateNumber(i32),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}
