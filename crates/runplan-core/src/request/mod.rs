//! The schedule request: everything a runner tells us before a plan is generated.
//!
//! The same camelCase JSON shape is accepted by the HTTP endpoint and by the
//! `runplan generate` request file. Closed vocabularies (goal, focus, experience,
//! planning mode, weekday, language, gender) are enums; free-form answers stay
//! strings and are rendered as a placeholder in the prompt when left empty.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::method::TrainingMethod;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Distance or fitness target the plan builds towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "5 kilometer")]
    FiveK,
    #[serde(rename = "10 kilometer")]
    TenK,
    #[serde(rename = "15 kilometer")]
    FifteenK,
    #[serde(rename = "half marathon")]
    HalfMarathon,
    #[serde(rename = "marathon")]
    Marathon,
    #[serde(rename = "fitness")]
    Fitness,
}

impl Goal {
    /// Wire name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveK => "5 kilometer",
            Self::TenK => "10 kilometer",
            Self::FifteenK => "15 kilometer",
            Self::HalfMarathon => "half marathon",
            Self::Marathon => "marathon",
            Self::Fitness => "fitness",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the runner wants to finish comfortably or race for a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Recreational,
    Performance,
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recreational => "recreational",
            Self::Performance => "performance",
        };
        f.write_str(s)
    }
}

/// Self-reported running experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// How training days are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningMode {
    /// The model picks the training days.
    Auto,
    /// The runner picked the days in `selected_days`.
    Manual,
}

impl fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// Output language for every human-readable string in the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Nl,
    #[default]
    En,
}

impl Language {
    /// Language name as it is spelled out to the model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nl => "Dutch",
            Self::En => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Nl => "nl",
            Self::En => "en",
        };
        f.write_str(s)
    }
}

/// Optional gender, only used to give the model context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Day of the week, serialized as lowercase English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Localized day name, used when listing selected days in the prompt.
    pub fn localized(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, Self::Monday) => "Monday",
            (Language::En, Self::Tuesday) => "Tuesday",
            (Language::En, Self::Wednesday) => "Wednesday",
            (Language::En, Self::Thursday) => "Thursday",
            (Language::En, Self::Friday) => "Friday",
            (Language::En, Self::Saturday) => "Saturday",
            (Language::En, Self::Sunday) => "Sunday",
            (Language::Nl, Self::Monday) => "maandag",
            (Language::Nl, Self::Tuesday) => "dinsdag",
            (Language::Nl, Self::Wednesday) => "woensdag",
            (Language::Nl, Self::Thursday) => "donderdag",
            (Language::Nl, Self::Friday) => "vrijdag",
            (Language::Nl, Self::Saturday) => "zaterdag",
            (Language::Nl, Self::Sunday) => "zondag",
        }
    }
}

impl FromStr for Weekday {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            other => Err(RequestError::InvalidWeekday(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A recent race or time trial, used to calibrate paces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentPerformance {
    pub distance: String,
    pub time: String,
}

/// Everything the runner submitted. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub goal: Goal,
    pub focus: Focus,
    #[serde(default)]
    pub target_time: Option<String>,
    pub experience: ExperienceLevel,
    /// Current runs per week, as answered (e.g. "2-3").
    #[serde(default)]
    pub weekly_frequency: String,
    #[serde(default)]
    pub health_status: String,
    #[serde(default)]
    pub recent_performance: Option<RecentPerformance>,
    pub start_date: NaiveDate,
    pub training_days_per_week: u8,
    pub training_weeks: u16,
    pub planning_mode: PlanningMode,
    #[serde(default)]
    pub selected_days: Vec<Weekday>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age_bracket: Option<String>,
    #[serde(default)]
    pub training_method: Option<TrainingMethod>,
}

/// Errors for requests that cannot be turned into a meaningful prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("trainingWeeks must be at least 1")]
    NoTrainingWeeks,

    #[error("trainingDaysPerWeek must be between 1 and 7, got {0}")]
    InvalidDaysPerWeek(u8),

    #[error("manual planning mode requires at least one selected day")]
    NoSelectedDays,

    #[error("invalid weekday {0:?}")]
    InvalidWeekday(String),
}

impl ScheduleRequest {
    /// Boundary check run before prompting.
    ///
    /// Only rejects requests that make the prompt self-contradictory; all
    /// optional fields are left alone.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.training_weeks == 0 {
            return Err(RequestError::NoTrainingWeeks);
        }
        if !(1..=7).contains(&self.training_days_per_week) {
            return Err(RequestError::InvalidDaysPerWeek(
                self.training_days_per_week,
            ));
        }
        if self.planning_mode == PlanningMode::Manual && self.selected_days.is_empty() {
            return Err(RequestError::NoSelectedDays);
        }
        Ok(())
    }
}
