//! Local CLI backend: pipes the prompt into a subprocess (e.g. `claude -p`)
//! and returns its stdout.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::trait_def::TextGenerator;

/// Argument placeholder replaced with the model name.
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// Runs `program args...` once per call with the prompt on stdin.
///
/// The child is killed if the call is dropped (cancellation, deadline).
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn resolved_args(&self, model: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(MODEL_PLACEHOLDER, model))
            .collect()
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    fn name(&self) -> &str {
        &self.program
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let args = self.resolved_args(model);
        debug!(program = %self.program, ?args, "spawning generator command");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {:?}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("child stdin was not captured")?;
        let prompt = prompt.as_bytes().to_vec();
        let write = async move {
            let result = stdin.write_all(&prompt).await;
            drop(stdin);
            match result {
                // The command may exit without reading its input.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.with_context(|| format!("failed to wait for {:?}", self.program))?;
        written.with_context(|| format!("failed to write prompt to {:?}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{:?} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout)
            .with_context(|| format!("{:?} wrote non-UTF-8 output", self.program))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prompt_is_sent_on_stdin() {
        let generator = CommandGenerator::new("cat", vec![]);
        let reply = generator.generate("m", "{\"title\": \"x\"}").await.unwrap();
        assert_eq!(reply, "{\"title\": \"x\"}");
    }

    #[tokio::test]
    async fn model_placeholder_is_substituted() {
        let generator = CommandGenerator::new("echo", vec!["model={model}".into()]);
        let reply = generator.generate("gemini-2.5-pro", "ignored").await.unwrap();
        assert_eq!(reply.trim(), "model=gemini-2.5-pro");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let generator = CommandGenerator::new(
            "sh",
            vec!["-c".into(), "echo 'quota exceeded' >&2; exit 3".into()],
        );
        let err = generator.generate("m", "p").await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("quota exceeded"), "got: {msg}");
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let generator = CommandGenerator::new("runplan-no-such-binary", vec![]);
        let err = generator.generate("m", "p").await.unwrap_err();
        assert!(format!("{err:#}").contains("failed to spawn"));
    }
}
