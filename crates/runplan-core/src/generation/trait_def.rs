//! The `TextGenerator` trait: the single call the pipeline needs from a
//! language model.
//!
//! Each backend (HTTP API, local CLI) implements this trait. It is
//! object-safe so a backend can be injected as `Arc<dyn TextGenerator>` and
//! swapped for a scripted stub in tests.

use anyhow::Result;
use async_trait::async_trait;

/// One text-completion call: `generate(model, prompt) -> text`.
///
/// Implementations return whatever the model produced, including an empty
/// string; deciding whether a reply is usable is the caller's job. Errors are
/// transport failures (network, process, API status).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt` to `model` and return the raw reply text.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

// Compile-time assertion: TextGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
            Ok(format!("{model}: {prompt}"))
        }
    }

    #[tokio::test]
    async fn generator_is_usable_as_trait_object() {
        let generator: Box<dyn TextGenerator> = Box::new(EchoGenerator);
        assert_eq!(generator.name(), "echo");
        let reply = generator.generate("m", "hello").await.unwrap();
        assert_eq!(reply, "m: hello");
    }
}
