use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `schedules` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchedule {
    pub id: Uuid,
    pub title: String,
    pub total_weeks: i32,
    /// The request the schedule was generated from.
    pub request: serde_json::Value,
    /// The validated schedule document.
    pub schedule: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Listing columns only, without the JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleListing {
    pub id: Uuid,
    pub title: String,
    pub total_weeks: i32,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub title: String,
    pub total_weeks: i32,
    pub request: serde_json::Value,
    pub schedule: serde_json::Value,
}

impl From<&StoredSchedule> for ScheduleListing {
    fn from(s: &StoredSchedule) -> Self {
        Self {
            id: s.id,
            title: s.title.clone(),
            total_weeks: s.total_weeks,
            created_at: s.created_at,
        }
    }
}
