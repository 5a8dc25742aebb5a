use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::db::{with_timeout, StorageError};
use crate::events::{NewSpecialEvent, SpecialEvent};

/// Persistence interface for special events
#[async_trait]
pub trait SpecialEventStore: Send + Sync {
    /// Events ordered by start date
    async fn list(&self) -> Result<Vec<SpecialEvent>, StorageError>;

    async fn insert(&self, event: &NewSpecialEvent) -> Result<SpecialEvent, StorageError>;

    /// Returns false when no event had the id
    async fn delete(&self, id: i32) -> Result<bool, StorageError>;
}

#[derive(Clone)]
pub struct PgSpecialEventStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgSpecialEventStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl SpecialEventStore for PgSpecialEventStore {
    async fn list(&self) -> Result<Vec<SpecialEvent>, StorageError> {
        with_timeout(self.timeout, async {
            let events = sqlx::query_as::<_, SpecialEvent>(
                "SELECT id, name, start_date, end_date, created_at FROM special_events ORDER BY start_date, id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(events)
        })
        .await
    }

    async fn insert(&self, event: &NewSpecialEvent) -> Result<SpecialEvent, StorageError> {
        with_timeout(self.timeout, async {
            let created = sqlx::query_as::<_, SpecialEvent>(
                r#"
                INSERT INTO special_events (name, start_date, end_date)
                VALUES ($1, $2, $3)
                RETURNING id, name, start_date, end_date, created_at
                "#,
            )
            .bind(&event.name)
            .bind(event.start_date)
            .bind(event.end_date)
            .fetch_one(&self.pool)
            .await?;
            Ok(created)
        })
        .await
    }

    async fn delete(&self, id: i32) -> Result<bool, StorageError> {
        with_timeout(self.timeout, async {
            let result = sqlx::query("DELETE FROM special_events WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
