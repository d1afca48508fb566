//! Bounded retry around a [`TextGenerator`].
//!
//! An attempt ends in success, an empty reply, or a transport failure. The
//! last two are retried up to `max_retries` total calls, waiting
//! `base_delay * attempt` in between. Cancellation and the optional overall
//! deadline abort both an in-flight call and a backoff wait.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::trait_def::TextGenerator;

/// Default number of calls per generation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base backoff between attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How hard the client tries before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first. Zero is treated as one.
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `base_delay * n` before attempt `n + 1`.
    pub base_delay: Duration,
    /// Overall budget for the whole call, backoff included.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            deadline: None,
        }
    }
}

/// Why a single attempt failed. Always retried while budget remains.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("model returned an empty reply")]
    EmptyReply,

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

/// Terminal outcome of [`GenerationClient::generate`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: AttemptError,
    },

    #[error("generation cancelled")]
    Cancelled,

    #[error("generation deadline exceeded")]
    DeadlineExceeded,
}

/// Retrying wrapper around an injected generator.
///
/// Holds no per-call state; one client can serve any number of concurrent
/// calls.
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("generator", &self.generator.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Generate with the policy's own deadline, measured from now.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        let deadline = self.policy.deadline.map(|d| Instant::now() + d);
        self.generate_until(model, prompt, cancel, deadline).await
    }

    /// Generate against an absolute deadline shared with the caller.
    pub async fn generate_until(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let started = Instant::now();
            debug!(attempt, max_attempts, backend = self.generator.name(), "requesting generation");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = wait_for_deadline(deadline) => return Err(GenerationError::DeadlineExceeded),
                reply = self.generator.generate(model, prompt) => reply,
            };

            let error = match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(
                        attempt,
                        chars = text.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Ok(_) => AttemptError::EmptyReply,
                Err(e) => AttemptError::Transport(e),
            };
            warn!(attempt, max_attempts, error = %error, "generation attempt failed");

            if attempt >= max_attempts {
                return Err(GenerationError::Exhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.policy.base_delay * attempt;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = wait_for_deadline(deadline) => return Err(GenerationError::DeadlineExceeded),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
