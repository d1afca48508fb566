//! Sequences the pipeline: request check, prompt, generation, extraction,
//! validation.
//!
//! Holds no per-call state; an `Orchestrator` can be shared behind an `Arc`
//! and driven by any number of concurrent requests.

use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::extract::{ExtractError, extract_json};
use crate::generation::{GenerationClient, GenerationError, RetryPolicy, TextGenerator};
use crate::prompt;
use crate::request::{RequestError, ScheduleRequest};
use crate::schedule::{RepairReport, ValidatedSchedule, ValidationError, repair_schedule};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Model name passed to the generator on every call.
    pub model: String,
    /// Retry policy for empty replies and transport failures.
    pub retry: RetryPolicy,
    /// Extra full generation rounds allowed when a reply cannot be turned
    /// into a schedule (no JSON, malformed JSON, missing required fields).
    pub invalid_reply_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
            invalid_reply_retries: 0,
        }
    }
}

/// The first error any stage produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PipelineError {
    /// Whether the model replied but the reply was unusable.
    pub fn is_invalid_reply(&self) -> bool {
        matches!(self, Self::Extract(_) | Self::Validation(_))
    }
}

/// Extract and validate a raw model reply.
pub fn repair_reply(raw: &str) -> Result<ValidatedSchedule, PipelineError> {
    repair_reply_with_report(raw).map(|(schedule, _)| schedule)
}

/// Like [`repair_reply`], also returning what the validator repaired.
pub fn repair_reply_with_report(
    raw: &str,
) -> Result<(ValidatedSchedule, RepairReport), PipelineError> {
    let candidate = extract_json(raw)?;
    Ok(repair_schedule(&candidate)?)
}

/// Runs schedule generation end to end.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: GenerationClient,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: OrchestratorConfig) -> Self {
        let client = GenerationClient::new(generator, config.retry.clone());
        Self { client, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The prompt [`Self::generate`] would send, without calling the model.
    pub fn build_prompt(&self, request: &ScheduleRequest) -> String {
        prompt::build_prompt(request)
    }

    /// Generate a validated schedule for `request`.
    ///
    /// `cancel` and the configured deadline abort the call at any point,
    /// including between invalid-reply rounds.
    pub async fn generate(
        &self,
        request: &ScheduleRequest,
        cancel: &CancellationToken,
    ) -> Result<ValidatedSchedule, PipelineError> {
        request.validate()?;

        let started = Instant::now();
        let prompt = prompt::build_prompt(request);
        let deadline = self.config.retry.deadline.map(|d| started + d);
        let mut round = 0u32;

        loop {
            let raw = self
                .client
                .generate_until(&self.config.model, &prompt, cancel, deadline)
                .await?;

            match repair_reply_with_report(&raw) {
                Ok((schedule, report)) => {
                    info!(
                        model = %self.config.model,
                        backend = self.client.generator_name(),
                        max_attempts = self.client.policy().max_retries.max(1),
                        weeks = schedule.weeks.len(),
                        repairs = report.total(),
                        rounds = round + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "schedule generated"
                    );
                    return Ok(schedule);
                }
                Err(e) if round < self.config.invalid_reply_retries => {
                    round += 1;
                    warn!(
                        round,
                        max_rounds = self.config.invalid_reply_retries,
                        error = %e,
                        "unusable model reply, regenerating"
                    );
                }
                Err(e) => {
                    warn!(error = %e, reply_chars = raw.len(), "unusable model reply");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::request::{ExperienceLevel, Focus, Goal, Language, PlanningMode};
    use crate::schedule::Intensity;

    struct ReplayGenerator {
        replies: Mutex<VecDeque<String>>,
        calls: AtomicU32,
    }

    impl ReplayGenerator {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ReplayGenerator {
        fn name(&self) -> &str {
            "replay"
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    const GOOD_REPLY: &str = "```json\n{\"title\": \"T\", \"overview\": \"O\", \"weeks\": [{\"days\": [{\"intensity\": \"laag\"}]}]}\n```";

    fn request() -> ScheduleRequest {
        ScheduleRequest {
            goal: Goal::FiveK,
            focus: Focus::Recreational,
            target_time: None,
            experience: ExperienceLevel::Beginner,
            weekly_frequency: String::new(),
            health_status: String::new(),
            recent_performance: None,
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            training_days_per_week: 3,
            training_weeks: 1,
            planning_mode: PlanningMode::Auto,
            selected_days: Vec::new(),
            language: Language::En,
            gender: None,
            age_bracket: None,
            training_method: None,
        }
    }

    #[test]
    fn repair_reply_extracts_and_validates() {
        let schedule = repair_reply(GOOD_REPLY).unwrap();
        assert_eq!(schedule.title, "T");
        assert_eq!(schedule.weeks[0].days[0].intensity, Intensity::Light);
    }

    #[test]
    fn repair_reply_error_kinds() {
        assert!(matches!(
            repair_reply("sorry, no plan"),
            Err(PipelineError::Extract(ExtractError::NoJsonFound))
        ));
        assert!(matches!(
            repair_reply("{title}"),
            Err(PipelineError::Validation(ValidationError::MalformedJson(_)))
        ));
        assert!(matches!(
            repair_reply("{\"title\": \"t\"}"),
            Err(PipelineError::Validation(
                ValidationError::InvalidScheduleStructure(_)
            ))
        ));

        // Cut off mid-reply: inner objects are balanced, the outer one is not.
        let truncated = r#"{"title": "t", "overview": "o", "weeks": [{"days": [{"intensity": "easy", "workoutDetails": {"technicalData": {"rpe": 3}}}"#;
        assert!(matches!(
            repair_reply(truncated),
            Err(PipelineError::Extract(ExtractError::NoJsonFound))
        ));

        let trailing_comma = r#"{"title": "t", "overview": "o", "runnerProfile": {"experience": "x"}, "weeks": [],}"#;
        assert!(matches!(
            repair_reply(&format!("```json\n{trailing_comma}\n```")),
            Err(PipelineError::Validation(ValidationError::MalformedJson(_)))
        ));
    }

    #[tokio::test]
    async fn invalid_request_never_calls_model() {
        let generator = ReplayGenerator::new(&[GOOD_REPLY]);
        let orchestrator = Orchestrator::new(generator.clone(), OrchestratorConfig::default());
        let mut req = request();
        req.training_weeks = 0;

        let err = orchestrator
            .generate(&req, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidRequest(RequestError::NoTrainingWeeks)
        ));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parse_failure_is_terminal_by_default() {
        let generator = ReplayGenerator::new(&["{\"broken\": ", GOOD_REPLY]);
        let orchestrator = Orchestrator::new(generator.clone(), OrchestratorConfig::default());

        let err = orchestrator
            .generate(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_invalid_reply(), "got: {err}");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_reply_retries_regenerate() {
        let generator = ReplayGenerator::new(&["no json here", GOOD_REPLY]);
        let config = OrchestratorConfig {
            invalid_reply_retries: 1,
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(generator.clone(), config);

        let schedule = orchestrator
            .generate(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(schedule.summary.total_weeks, 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_calling() {
        let generator = ReplayGenerator::new(&[GOOD_REPLY]);
        let orchestrator = Orchestrator::new(generator.clone(), OrchestratorConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator.generate(&request(), &cancel).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Generation(GenerationError::Cancelled)
        ));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn client_carries_generator_and_retry_policy() {
        let mut config = OrchestratorConfig::default();
        config.retry.max_retries = 5;
        let orchestrator = Orchestrator::new(ReplayGenerator::new(&[]), config);
        assert_eq!(orchestrator.client.generator_name(), "replay");
        assert_eq!(orchestrator.client.policy(), &orchestrator.config().retry);
        assert_eq!(orchestrator.client.policy().max_retries, 5);
    }

    #[test]
    fn build_prompt_matches_free_function() {
        let orchestrator =
            Orchestrator::new(ReplayGenerator::new(&[]), OrchestratorConfig::default());
        assert_eq!(
            orchestrator.build_prompt(&request()),
            prompt::build_prompt(&request())
        );
    }
}
