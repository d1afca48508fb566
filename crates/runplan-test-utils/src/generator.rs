//! A [`TextGenerator`] that replays a script, for driving the pipeline
//! without a model.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use runplan_core::TextGenerator;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this text (may be empty).
    Reply(String),
    /// Fail with a transport error carrying this message.
    Fail(String),
}

impl Scripted {
    fn into_result(self) -> Result<String> {
        match self {
            Self::Reply(text) => Ok(text),
            Self::Fail(msg) => Err(anyhow!(msg)),
        }
    }
}

/// Replays queued outcomes in order, then repeats `fallback` forever.
///
/// Records every prompt it receives and counts calls.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    delay: Option<Duration>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Script that fails once exhausted.
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Scripted::Fail("script exhausted".to_string()),
            delay: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_fallback(Scripted::Reply(reply.into()))
    }

    /// Every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_fallback(Scripted::Fail(message.into()))
    }

    pub fn with_fallback(mut self, fallback: Scripted) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sleep before answering, to simulate model latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _model: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        next.unwrap_or_else(|| self.fallback.clone()).into_result()
    }
}
