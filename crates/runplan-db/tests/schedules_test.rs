//! PostgreSQL-backed tests for migrations and the `schedules` queries.
//!
//! Ignored by default: they need Docker (testcontainers) or a server at
//! `RUNPLAN_TEST_PG_URL`. Run with `cargo test -- --ignored`.

use serde_json::json;
use uuid::Uuid;

use runplan_db::pool;
use runplan_db::queries::schedules;
use runplan_db::{NewSchedule, PgScheduleStore, ScheduleStore};
use runplan_test_utils::{create_test_db, drop_test_db, sample_schedule_json};

fn new_schedule(title: &str) -> NewSchedule {
    NewSchedule {
        title: title.to_string(),
        total_weeks: 6,
        request: json!({ "goal": "10 kilometer", "trainingWeeks": 6 }),
        schedule: sample_schedule_json(6, "Light"),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn migrations_create_schedules_table() {
    let (pool, db_name) = create_test_db().await;

    let stats = pool::schedule_stats(&pool).await.unwrap();
    assert_eq!(stats.schedules, 0);
    assert_eq!(stats.newest, None);

    // Running again is a no-op.
    assert_eq!(pool::run_migrations(&pool).await.unwrap(), 1);

    let stored = schedules::insert_schedule(&pool, &new_schedule("counted"))
        .await
        .unwrap();
    let stats = pool::schedule_stats(&pool).await.unwrap();
    assert_eq!(stats.schedules, 1);
    assert_eq!(stats.newest, Some(stored.created_at));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn insert_get_and_list() {
    let (pool, db_name) = create_test_db().await;

    let first = schedules::insert_schedule(&pool, &new_schedule("first"))
        .await
        .unwrap();
    let second = schedules::insert_schedule(&pool, &new_schedule("second"))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let fetched = schedules::get_schedule(&pool, first.id)
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(fetched.title, "first");
    assert_eq!(fetched.schedule["weeks"].as_array().map(Vec::len), Some(6));
    assert_eq!(fetched.request["trainingWeeks"], 6);

    assert!(
        schedules::get_schedule(&pool, Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );

    let listed = schedules::list_schedules(&pool, 10).await.unwrap();
    assert_eq!(listed.len(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn pg_store_roundtrip() {
    let (pool, db_name) = create_test_db().await;
    let store = PgScheduleStore::new(pool.clone());

    let stored = store.store(new_schedule("stored")).await.unwrap();
    let fetched = store.fetch(stored.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, stored.id);
    assert_eq!(store.list(1).await.unwrap().len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}
