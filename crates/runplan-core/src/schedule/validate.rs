//! Schedule validator with field-level repair.
//!
//! Parses the extracted JSON and builds a [`ValidatedSchedule`]:
//! - `title`, `overview` and a `weeks` array are required. Their absence is
//!   the only fatal path.
//! - `runnerProfile` and `summary` are filled field by field when missing or
//!   of the wrong type. `summary.totalWeeks` always equals `weeks.len()`.
//! - Weeks are re-indexed `1..=N`; a missing `weekSummary` is synthesized and
//!   `trainingDays` defaults to the number of days.
//! - Every day's intensity is normalized into one of the six canonical values.
//! - `workoutDetails.technicalData.rpe` is clamped into `1..=10`, defaulting
//!   from the normalized intensity.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::intensity::Intensity;
use super::types::{
    IntervalSet, RunnerProfile, ScheduleSummary, Segment, Strides, TechnicalData, TrainingDay,
    TrainingWeek, ValidatedSchedule, WeekSummary, WorkoutDetails,
};

/// Errors that stop validation. Everything else is repaired.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed JSON in model reply: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("invalid schedule structure: {0}")]
    InvalidScheduleStructure(String),
}

/// Counts of what the validator had to fix, for logging and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Fields that were missing or of the wrong type and got a default.
    pub defaulted_fields: usize,
    /// Weeks whose `weekNumber` was missing or out of sequence.
    pub reindexed_weeks: usize,
    /// Intensities that were not already a canonical value.
    pub normalized_intensities: usize,
    /// Day entries that were not objects and were dropped.
    pub dropped_days: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.defaulted_fields + self.reindexed_weeks + self.normalized_intensities + self.dropped_days
    }
}

/// Parse and repair a candidate JSON string.
pub fn validate_schedule(candidate: &str) -> Result<ValidatedSchedule, ValidationError> {
    repair_schedule(candidate).map(|(schedule, _)| schedule)
}

/// Like [`validate_schedule`], also returning what was repaired.
pub fn repair_schedule(
    candidate: &str,
) -> Result<(ValidatedSchedule, RepairReport), ValidationError> {
    let value: Value = serde_json::from_str(candidate)?;
    let mut repairs = RepairReport::default();
    let schedule = build_schedule(&value, &mut repairs)?;

    debug!(
        weeks = schedule.weeks.len(),
        defaulted = repairs.defaulted_fields,
        reindexed = repairs.reindexed_weeks,
        normalized = repairs.normalized_intensities,
        dropped_days = repairs.dropped_days,
        "validated schedule"
    );

    Ok((schedule, repairs))
}

fn build_schedule(
    value: &Value,
    repairs: &mut RepairReport,
) -> Result<ValidatedSchedule, ValidationError> {
    let root = value.as_object().ok_or_else(|| {
        ValidationError::InvalidScheduleStructure("top-level value is not an object".into())
    })?;

    let title = required_string(root, "title")?;
    let overview = required_string(root, "overview")?;
    let raw_weeks = match root.get("weeks") {
        Some(Value::Array(weeks)) => weeks,
        Some(_) => {
            return Err(ValidationError::InvalidScheduleStructure(
                "\"weeks\" is not an array".into(),
            ));
        }
        None => {
            return Err(ValidationError::InvalidScheduleStructure(
                "missing \"weeks\"".into(),
            ));
        }
    };

    let weeks: Vec<TrainingWeek> = raw_weeks
        .iter()
        .enumerate()
        .map(|(index, week)| build_week(index, week, repairs))
        .collect();

    let runner_profile = build_runner_profile(root.get("runnerProfile"), repairs);
    let summary = build_summary(root.get("summary"), weeks.len(), repairs);

    Ok(ValidatedSchedule {
        title,
        overview,
        runner_profile,
        summary,
        weeks,
    })
}

fn required_string(root: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    match root.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::InvalidScheduleStructure(format!(
            "{key:?} is not a string"
        ))),
        None => Err(ValidationError::InvalidScheduleStructure(format!(
            "missing {key:?}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Top-level sub-objects
// ---------------------------------------------------------------------------

fn build_runner_profile(value: Option<&Value>, repairs: &mut RepairReport) -> RunnerProfile {
    let empty = Map::new();
    let obj = object_or_default(value, &empty, repairs);
    RunnerProfile {
        experience: text_field(obj, "experience", repairs),
        current_fitness: text_field(obj, "currentFitness", repairs),
        health_status: text_field(obj, "healthStatus", repairs),
        training_history: text_field(obj, "trainingHistory", repairs),
        strengths: list_field(obj, "strengths", repairs),
        considerations: list_field(obj, "considerations", repairs),
        motivation: text_field(obj, "motivation", repairs),
    }
}

fn build_summary(
    value: Option<&Value>,
    week_count: usize,
    repairs: &mut RepairReport,
) -> ScheduleSummary {
    let empty = Map::new();
    let obj = object_or_default(value, &empty, repairs);
    let expected = week_count as u32;
    let total_weeks = match obj.get("totalWeeks").and_then(as_count) {
        Some(n) if n == expected => n,
        Some(n) => {
            debug!(reported = n, actual = expected, "summary.totalWeeks disagrees with weeks");
            repairs.defaulted_fields += 1;
            expected
        }
        None => {
            repairs.defaulted_fields += 1;
            expected
        }
    };
    ScheduleSummary {
        goal: text_field(obj, "goal", repairs),
        target_distance: text_field(obj, "targetDistance", repairs),
        duration: text_field(obj, "duration", repairs),
        training_method: text_field(obj, "trainingMethod", repairs),
        total_weeks,
        coach_strategy: text_field(obj, "coachStrategy", repairs),
    }
}

// ---------------------------------------------------------------------------
// Weeks and days
// ---------------------------------------------------------------------------

fn build_week(index: usize, value: &Value, repairs: &mut RepairReport) -> TrainingWeek {
    let empty = Map::new();
    let obj = object_or_default(Some(value), &empty, repairs);

    let week_number = index as u32 + 1;
    if obj.get("weekNumber").and_then(as_count) != Some(week_number) {
        repairs.reindexed_weeks += 1;
    }

    let days: Vec<TrainingDay> = match obj.get("days") {
        Some(Value::Array(raw_days)) => raw_days
            .iter()
            .filter_map(|d| match d.as_object() {
                Some(day) => Some(build_day(day, repairs)),
                None => {
                    repairs.dropped_days += 1;
                    None
                }
            })
            .collect(),
        _ => {
            repairs.defaulted_fields += 1;
            Vec::new()
        }
    };

    let week_summary = match obj.get("weekSummary").and_then(Value::as_object) {
        Some(summary) => WeekSummary {
            total_distance: text_field(summary, "totalDistance", repairs),
            total_duration: text_field(summary, "totalDuration", repairs),
            training_days: match summary.get("trainingDays").and_then(as_count) {
                Some(n) => n,
                None => {
                    repairs.defaulted_fields += 1;
                    days.len() as u32
                }
            },
        },
        None => {
            repairs.defaulted_fields += 1;
            WeekSummary {
                total_distance: String::new(),
                total_duration: String::new(),
                training_days: days.len() as u32,
            }
        }
    };

    TrainingWeek {
        week_number,
        focus: text_field(obj, "focus", repairs),
        week_summary,
        days,
    }
}

fn build_day(obj: &Map<String, Value>, repairs: &mut RepairReport) -> TrainingDay {
    let raw_intensity = obj.get("intensity").and_then(as_text).unwrap_or_default();
    let intensity = Intensity::normalize(&raw_intensity);
    if raw_intensity != intensity.as_str() {
        repairs.normalized_intensities += 1;
    }

    let workout_details = obj
        .get("workoutDetails")
        .and_then(Value::as_object)
        .map(|details| build_workout_details(details, intensity, repairs));

    TrainingDay {
        day: text_field(obj, "day", repairs),
        date: obj.get("date").and_then(as_text),
        session_type: text_field(obj, "type", repairs),
        description: text_field(obj, "description", repairs),
        intensity,
        duration: text_field(obj, "duration", repairs),
        distance: text_field(obj, "distance", repairs),
        workout_details,
    }
}

fn build_workout_details(
    obj: &Map<String, Value>,
    intensity: Intensity,
    repairs: &mut RepairReport,
) -> WorkoutDetails {
    let technical_data = match obj.get("technicalData").and_then(Value::as_object) {
        Some(tech) => TechnicalData {
            rpe: match tech.get("rpe").and_then(as_rpe) {
                Some(rpe) => rpe,
                None => {
                    repairs.defaulted_fields += 1;
                    intensity.default_rpe()
                }
            },
            training_effect: text_field(tech, "trainingEffect", repairs),
            surface: tech.get("surface").and_then(as_text),
        },
        None => {
            repairs.defaulted_fields += 1;
            TechnicalData {
                rpe: intensity.default_rpe(),
                training_effect: String::new(),
                surface: None,
            }
        }
    };

    WorkoutDetails {
        warmup: obj.get("warmup").and_then(as_segment),
        interval: obj
            .get("interval")
            .and_then(Value::as_object)
            .map(|i| IntervalSet {
                reps: i.get("reps").and_then(as_count).unwrap_or(1).max(1),
                distance: i.get("distance").and_then(as_text),
                duration: i.get("duration").and_then(as_text),
                target_pace: text_field(i, "targetPace", repairs),
                recovery: text_field(i, "recovery", repairs),
            }),
        main_body: obj.get("mainBody").and_then(as_segment),
        strides: obj
            .get("strides")
            .and_then(Value::as_object)
            .map(|s| Strides {
                count: s.get("count").and_then(as_count).unwrap_or(0),
                description: text_field(s, "description", repairs),
            }),
        cooldown: obj.get("cooldown").and_then(as_segment),
        technical_data,
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn object_or_default<'a>(
    value: Option<&'a Value>,
    empty: &'a Map<String, Value>,
    repairs: &mut RepairReport,
) -> &'a Map<String, Value> {
    match value.and_then(Value::as_object) {
        Some(obj) => obj,
        None => {
            repairs.defaulted_fields += 1;
            empty
        }
    }
}

/// Strings pass through; numbers and booleans are rendered. Anything else is absent.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str, repairs: &mut RepairReport) -> String {
    match obj.get(key).and_then(as_text) {
        Some(s) => s,
        None => {
            repairs.defaulted_fields += 1;
            String::new()
        }
    }
}

/// An array of strings; a lone string becomes a one-element list.
fn list_field(obj: &Map<String, Value>, key: &str, repairs: &mut RepairReport) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(as_text).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => {
            repairs.defaulted_fields += 1;
            Vec::new()
        }
    }
}

/// Non-negative whole numbers, also accepted as numeric strings.
fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RPE as a number or the first number inside a string ("6-7" -> 6),
/// rounded and clamped into 1..=10.
fn as_rpe(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let digits: String = s
                .trim_start()
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()?
        }
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(1.0, 10.0) as u8)
}

fn as_segment(value: &Value) -> Option<Segment> {
    match value {
        Value::Object(obj) => Some(Segment {
            description: obj.get("description").and_then(as_text).unwrap_or_default(),
            duration: obj.get("duration").and_then(as_text),
            distance: obj.get("distance").and_then(as_text),
        }),
        Value::String(s) => Some(Segment {
            description: s.clone(),
            ..Segment::default()
        }),
        _ => None,
    }
}
