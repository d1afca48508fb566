//! Text generation: the backend trait, concrete backends, and the retrying
//! client the orchestrator drives.

pub mod client;
pub mod command;
pub mod gemini;
pub mod trait_def;

pub use client::{AttemptError, GenerationClient, GenerationError, RetryPolicy};
pub use command::CommandGenerator;
pub use gemini::GeminiGenerator;
pub use trait_def::TextGenerator;
