//! Connection pool, database bootstrap and migrations for the schedule store.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/runplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open a pool against the schedule database, sized by `config`.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to schedule database at {}", config.database_url))?;
    debug!(
        max_connections = config.max_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "schedule database pool ready"
    );
    Ok(pool)
}

/// Apply pending migrations. Returns how many the binary embeds.
///
/// Already-applied migrations are skipped, so this is safe on every start.
pub async fn run_migrations(pool: &PgPool) -> Result<usize> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run schedule migrations")?;

    let embedded = MIGRATOR.iter().count();
    info!(embedded, "schedule migrations up to date");
    Ok(embedded)
}

/// Names usable in an unparameterized `CREATE DATABASE`.
fn checked_database_name(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        bail!("database name {name:?} must be 1-63 ASCII letters, digits, '_' or '-'");
    }
    Ok(name)
}

/// Create the schedule database if it is missing.
///
/// Connects to the `postgres` maintenance database on the same server with a
/// single connection and the configured acquire timeout. Returns whether the
/// database was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config
        .database_name()
        .context("database URL has no database name")
        .and_then(checked_database_name)?;

    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.maintenance_url())
        .await
        .context("failed to connect to maintenance database")?;

    let result = async {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(db_name)
                .fetch_one(&maint_pool)
                .await
                .context("failed to query pg_database")?;
        if exists {
            return Ok(false);
        }
        maint_pool
            .execute(format!("CREATE DATABASE \"{db_name}\"").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        anyhow::Ok(true)
    }
    .await;

    maint_pool.close().await;
    let created = result?;
    info!(db = db_name, created, "schedule database present");
    Ok(created)
}

/// What `runplan db-init` reports about the `schedules` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStats {
    pub schedules: i64,
    pub newest: Option<DateTime<Utc>>,
}

pub async fn schedule_stats(pool: &PgPool) -> Result<ScheduleStats> {
    let (schedules, newest): (i64, Option<DateTime<Utc>>) =
        sqlx::query_as("SELECT COUNT(*), MAX(created_at) FROM schedules")
            .fetch_one(pool)
            .await
            .context("failed to read schedule stats")?;
    Ok(ScheduleStats { schedules, newest })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_hyphenated_names() {
        assert_eq!(checked_database_name("runplan").unwrap(), "runplan");
        assert_eq!(checked_database_name("runplan-dev_2").unwrap(), "runplan-dev_2");
    }

    #[test]
    fn rejects_names_that_would_break_the_statement() {
        assert!(checked_database_name("").is_err());
        assert!(checked_database_name("plans\"; DROP TABLE x; --").is_err());
        assert!(checked_database_name("plans db").is_err());
        assert!(checked_database_name(&"x".repeat(64)).is_err());
    }

    #[test]
    fn embeds_the_schedules_migration() {
        assert!(MIGRATOR.iter().any(|m| m.description.contains("schedules")));
    }
}
