//! Shared test utilities for runplan tests.
//!
//! - [`ScriptedGenerator`] stands in for a language model.
//! - [`fixtures`] builds sample requests and model replies.
//! - The PostgreSQL helpers give each test its own database in a shared
//!   instance.
//!
//! Two PostgreSQL modes:
//! - **`RUNPLAN_TEST_PG_URL`** set: use that server directly.
//! - **No env var**: spin up a container via testcontainers, shared per
//!   test binary through a `OnceCell`.

pub mod fixtures;
pub mod generator;

pub use fixtures::{sample_reply, sample_request, sample_schedule_json};
pub use generator::{Scripted, ScriptedGenerator};

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use runplan_db::pool;

/// Environment variable pointing at an externally managed server.
pub const TEST_PG_URL_ENV: &str = "RUNPLAN_TEST_PG_URL";

struct SharedPg {
    base_url: String,
    /// Held to keep the container alive. `None` when using an external URL.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

async fn init_shared_pg() -> SharedPg {
    if let Ok(url) = std::env::var(TEST_PG_URL_ENV) {
        return SharedPg {
            base_url: url.trim_end_matches('/').to_string(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedPg {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Server root URL (no database name) of the shared PostgreSQL.
pub async fn pg_url() -> &'static str {
    &SHARED_PG.get_or_init(init_shared_pg).await.base_url
}

async fn maintenance_pool() -> PgPool {
    let url = format!("{}/postgres", pg_url().await);
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("failed to connect to maintenance database")
}

/// Create a uniquely named database with migrations applied.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] afterwards.
pub async fn create_test_db() -> (PgPool, String) {
    let maint = maintenance_pool().await;
    let db_name = format!("runplan_test_{}", Uuid::new_v4().simple());
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create temp database {db_name}: {e}"));
    maint.close().await;

    let url = format!("{}/{db_name}", pg_url().await);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to temp database {db_name}: {e}"));

    pool::run_migrations(&pool)
        .await
        .expect("migrations should succeed");

    (pool, db_name)
}

/// Drop a database created by [`create_test_db`]. Safe to call twice.
pub async fn drop_test_db(db_name: &str) {
    let maint = maintenance_pool().await;
    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint.execute(terminate.as_str()).await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}
