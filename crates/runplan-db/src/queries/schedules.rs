//! Database query functions for the `schedules` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewSchedule, ScheduleListing, StoredSchedule};

/// Insert a schedule. Returns the row with its generated id and timestamp.
pub async fn insert_schedule(pool: &PgPool, new: &NewSchedule) -> Result<StoredSchedule> {
    let row = sqlx::query_as::<_, StoredSchedule>(
        "INSERT INTO schedules (title, total_weeks, request, schedule) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&new.title)
    .bind(new.total_weeks)
    .bind(&new.request)
    .bind(&new.schedule)
    .fetch_one(pool)
    .await
    .context("failed to insert schedule")?;

    Ok(row)
}

pub async fn get_schedule(pool: &PgPool, id: Uuid) -> Result<Option<StoredSchedule>> {
    let row = sqlx::query_as::<_, StoredSchedule>("SELECT * FROM schedules WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch schedule")?;

    Ok(row)
}

/// Most recent schedules first.
pub async fn list_schedules(pool: &PgPool, limit: i64) -> Result<Vec<ScheduleListing>> {
    let rows = sqlx::query_as::<_, ScheduleListing>(
        "SELECT id, title, total_weeks, created_at \
         FROM schedules \
         ORDER BY created_at DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list schedules")?;

    Ok(rows)
}

