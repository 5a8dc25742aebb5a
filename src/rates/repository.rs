use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::db::{with_timeout, StorageError};
use crate::rates::{NewRatePlan, RatePlan};

const RATE_PLAN_COLUMNS: &str = "id, site_type, nightly_rate, start_date, end_date, active, created_at";

/// Persistence interface for rate plans
#[async_trait]
pub trait RatePlanStore: Send + Sync {
    /// Plans ordered by site type then start date
    async fn list(&self, include_inactive: bool) -> Result<Vec<RatePlan>, StorageError>;

    async fn insert(&self, plan: &NewRatePlan) -> Result<RatePlan, StorageError>;

    /// Retire a plan; historical plans stay in the table
    async fn deactivate(&self, id: i32) -> Result<Option<RatePlan>, StorageError>;
}

#[derive(Clone)]
pub struct PgRatePlanStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgRatePlanStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RatePlanStore for PgRatePlanStore {
    async fn list(&self, include_inactive: bool) -> Result<Vec<RatePlan>, StorageError> {
        with_timeout(self.timeout, async {
            let plans = sqlx::query_as::<_, RatePlan>(&format!(
                "SELECT {} FROM rate_plans WHERE active OR $1 ORDER BY site_type, start_date, id",
                RATE_PLAN_COLUMNS
            ))
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
            Ok(plans)
        })
        .await
    }

    async fn insert(&self, plan: &NewRatePlan) -> Result<RatePlan, StorageError> {
        with_timeout(self.timeout, async {
            let created = sqlx::query_as::<_, RatePlan>(&format!(
                r#"
                INSERT INTO rate_plans (site_type, nightly_rate, start_date, end_date, active)
                VALUES ($1, $2, $3, $4, TRUE)
                RETURNING {}
                "#,
                RATE_PLAN_COLUMNS
            ))
            .bind(plan.site_type)
            .bind(plan.nightly_rate)
            .bind(plan.start_date)
            .bind(plan.end_date)
            .fetch_one(&self.pool)
            .await?;
            Ok(created)
        })
        .await
    }

    async fn deactivate(&self, id: i32) -> Result<Option<RatePlan>, StorageError> {
        with_timeout(self.timeout, async {
            let plan = sqlx::query_as::<_, RatePlan>(&format!(
                "UPDATE rate_plans SET active = FALSE WHERE id = $1 RETURNING {}",
                RATE_PLAN_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(plan)
        })
        .await
    }
}
