//! The strict schedule schema handed to persistence and presentation.
//!
//! These types are only ever built by the validator, which guarantees every
//! invariant documented here. They serialize to the same camelCase shape the
//! model is asked to produce.

use serde::{Deserialize, Serialize};

use super::intensity::Intensity;

/// A fully repaired training schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedSchedule {
    pub title: String,
    pub overview: String,
    pub runner_profile: RunnerProfile,
    pub summary: ScheduleSummary,
    /// `weeks[i].week_number == i + 1` for every week.
    pub weeks: Vec<TrainingWeek>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerProfile {
    pub experience: String,
    pub current_fitness: String,
    pub health_status: String,
    pub training_history: String,
    pub strengths: Vec<String>,
    pub considerations: Vec<String>,
    pub motivation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub goal: String,
    pub target_distance: String,
    pub duration: String,
    pub training_method: String,
    pub total_weeks: u32,
    pub coach_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingWeek {
    pub week_number: u32,
    pub focus: String,
    pub week_summary: WeekSummary,
    pub days: Vec<TrainingDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub total_distance: String,
    pub total_duration: String,
    pub training_days: u32,
}

/// One session. `duration` and `distance` cover the whole session including
/// warm-up and cool-down, and may be ranges ("45-50 min").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDay {
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub session_type: String,
    pub description: String,
    pub intensity: Intensity,
    pub duration: String,
    pub distance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_details: Option<WorkoutDetails>,
}

/// Structured breakdown of a session. Every part is optional except the
/// technical data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<IntervalSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_body: Option<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strides: Option<Strides>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<Segment>,
    pub technical_data: TechnicalData,
}

/// A continuous block of running (warm-up, main body, cool-down).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSet {
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub target_pace: String,
    pub recovery: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strides {
    pub count: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalData {
    /// Rate of perceived exertion, always within 1..=10.
    pub rpe: u8,
    pub training_effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
}

impl ValidatedSchedule {
    /// Iterate over every day of every week.
    pub fn days(&self) -> impl Iterator<Item = &TrainingDay> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }
}
