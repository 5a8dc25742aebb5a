use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::db::{with_timeout, StorageError};
use crate::sites::{NewSite, Site, SiteType};

const SITE_COLUMNS: &str = "id, number, site_type, max_length_ft, active, description";

/// Name of the partial unique index on active site numbers
pub const ACTIVE_NUMBER_INDEX: &str = "sites_active_number_idx";

/// Persistence interface for sites
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<Site>, StorageError>;

    /// All sites ordered by number
    async fn list(&self, include_inactive: bool) -> Result<Vec<Site>, StorageError>;

    /// Active sites long enough for the rig and of the requested type
    async fn find_candidates(
        &self,
        min_length_ft: i32,
        site_type: Option<SiteType>,
    ) -> Result<Vec<Site>, StorageError>;

    /// Whether an active site other than `exclude_id` already uses `number`
    async fn active_number_taken(&self, number: i32, exclude_id: Option<i32>) -> Result<bool, StorageError>;

    async fn insert(&self, site: &NewSite) -> Result<Site, StorageError>;

    /// Overwrite every mutable column; `None` when the id does not exist
    async fn update(&self, site: &Site) -> Result<Option<Site>, StorageError>;
}

/// Postgres-backed site store
#[derive(Clone)]
pub struct PgSiteStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgSiteStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl SiteStore for PgSiteStore {
    async fn get(&self, id: i32) -> Result<Option<Site>, StorageError> {
        with_timeout(self.timeout, async {
            let site = sqlx::query_as::<_, Site>(&format!("SELECT {} FROM sites WHERE id = $1", SITE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(site)
        })
        .await
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Site>, StorageError> {
        with_timeout(self.timeout, async {
            let sites = sqlx::query_as::<_, Site>(&format!(
                "SELECT {} FROM sites WHERE active OR $1 ORDER BY number, id",
                SITE_COLUMNS
            ))
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
            Ok(sites)
        })
        .await
    }

    async fn find_candidates(
        &self,
        min_length_ft: i32,
        site_type: Option<SiteType>,
    ) -> Result<Vec<Site>, StorageError> {
        with_timeout(self.timeout, async {
            let sites = sqlx::query_as::<_, Site>(&format!(
                r#"
                SELECT {}
                FROM sites
                WHERE active
                  AND max_length_ft >= $1
                  AND ($2::text IS NULL OR site_type = $2::text)
                "#,
                SITE_COLUMNS
            ))
            .bind(min_length_ft)
            .bind(site_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?;
            Ok(sites)
        })
        .await
    }

    async fn active_number_taken(&self, number: i32, exclude_id: Option<i32>) -> Result<bool, StorageError> {
        with_timeout(self.timeout, async {
            let exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM sites WHERE active AND number = $1 AND ($2::int IS NULL OR id <> $2))",
            )
            .bind(number)
            .bind(exclude_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists.unwrap_or(false))
        })
        .await
    }

    async fn insert(&self, site: &NewSite) -> Result<Site, StorageError> {
        with_timeout(self.timeout, async {
            let created = sqlx::query_as::<_, Site>(&format!(
                r#"
                INSERT INTO sites (number, site_type, max_length_ft, active, description)
                VALUES ($1, $2, $3, TRUE, $4)
                RETURNING {}
                "#,
                SITE_COLUMNS
            ))
            .bind(site.number)
            .bind(site.site_type)
            .bind(site.max_length_ft)
            .bind(&site.description)
            .fetch_one(&self.pool)
            .await?;
            Ok(created)
        })
        .await
    }

    async fn update(&self, site: &Site) -> Result<Option<Site>, StorageError> {
        with_timeout(self.timeout, async {
            let updated = sqlx::query_as::<_, Site>(&format!(
                r#"
                UPDATE sites
                SET number = $1,
                    site_type = $2,
                    max_length_ft = $3,
                    active = $4,
                    description = $5
                WHERE id = $6
                RETURNING {}
                "#,
                SITE_COLUMNS
            ))
            .bind(site.number)
            .bind(site.site_type)
            .bind(site.max_length_ft)
            .bind(site.active)
            .bind(&site.description)
            .bind(site.id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(updated)
        })
        .await
    }
}
