//! Core of runplan: turns a runner's request into a validated training
//! schedule by prompting a language model and repairing its reply.

pub mod extract;
pub mod generation;
pub mod method;
pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod schedule;

pub use generation::{GenerationClient, GenerationError, RetryPolicy, TextGenerator};
pub use method::TrainingMethod;
pub use orchestrator::{Orchestrator, OrchestratorConfig, PipelineError, repair_reply};
pub use request::ScheduleRequest;
pub use schedule::{Intensity, ValidatedSchedule};
