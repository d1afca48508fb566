//! PostgreSQL persistence for generated schedules.
//!
//! The pipeline only needs `store` and `fetch`; see [`store::ScheduleStore`].
//! Schedules and requests are kept as JSON documents so this crate does not
//! depend on the pipeline's types.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use config::DbConfig;
pub use models::{NewSchedule, ScheduleListing, StoredSchedule};
pub use store::{MemoryScheduleStore, PgScheduleStore, ScheduleStore};
