//! The validated schedule schema, the intensity classifier, and the validator
//! that repairs model output into the schema.

pub mod intensity;
pub mod types;
pub mod validate;

pub use intensity::Intensity;
pub use types::{
    IntervalSet, RunnerProfile, ScheduleSummary, Segment, Strides, TechnicalData, TrainingDay,
    TrainingWeek, ValidatedSchedule, WeekSummary, WorkoutDetails,
};
pub use validate::{RepairReport, ValidationError, repair_schedule, validate_schedule};
