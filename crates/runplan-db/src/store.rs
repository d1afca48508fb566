//! The persistence seam used by the CLI and the HTTP server.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{NewSchedule, ScheduleListing, StoredSchedule};
use crate::queries::schedules;

/// `store(schedule) -> id` and `fetch(id) -> schedule | absent`, plus a
/// listing for the CLI.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn store(&self, new: NewSchedule) -> Result<StoredSchedule>;

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredSchedule>>;

    /// Newest first, at most `limit` entries.
    async fn list(&self, limit: usize) -> Result<Vec<ScheduleListing>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ScheduleStore) {}
};

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgScheduleStore {
    pool: PgPool,
}

impl PgScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn store(&self, new: NewSchedule) -> Result<StoredSchedule> {
        let row = schedules::insert_schedule(&self.pool, &new).await?;
        debug!(id = %row.id, weeks = row.total_weeks, "stored schedule");
        Ok(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredSchedule>> {
        schedules::get_schedule(&self.pool, id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ScheduleListing>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        schedules::list_schedules(&self.pool, limit).await
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Process-local store for `serve --memory` and tests. Contents are lost on
/// exit.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    rows: RwLock<Vec<StoredSchedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn store(&self, new: NewSchedule) -> Result<StoredSchedule> {
        let row = StoredSchedule {
            id: Uuid::new_v4(),
            title: new.title,
            total_weeks: new.total_weeks,
            request: new.request,
            schedule: new.schedule,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(row.clone());
        debug!(id = %row.id, "stored schedule in memory");
        Ok(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<StoredSchedule>> {
        Ok(self.rows.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ScheduleListing>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .map(ScheduleListing::from)
            .collect())
    }
}
