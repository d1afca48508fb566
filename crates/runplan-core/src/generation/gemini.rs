//! Google Gemini backend over the Generative Language REST API.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::trait_def::TextGenerator;

/// Generative Language API root.
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Environment variable holding the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Calls `models/{model}:generateContent` with the prompt as a single user turn.
#[derive(Clone)]
pub struct GeminiGenerator {
    api_key: String,
    base_url: String,
    temperature: Option<f32>,
    client: Client,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
            temperature: None,
            client: Client::new(),
        }
    }

    /// Build from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(GEMINI_API_KEY_ENV)
            .with_context(|| format!("{GEMINI_API_KEY_ENV} is not set"))?;
        Ok(Self::new(key))
    }

    /// Point at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn build_request<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        }
    }
}

/// Concatenate the text parts of the first candidate.
///
/// A response without candidates (e.g. a blocked prompt) yields an empty
/// string, which the retry loop treats as an empty reply.
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(err) = response.error {
        bail!("Gemini API error: {}", err.message);
    }
    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        return Ok(String::new());
    };
    if let Some(reason) = &candidate.finish_reason {
        debug!(finish_reason = %reason, "Gemini candidate finished");
    }
    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default())
}

/// Prefer the API's own error message over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<GenerateContentResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.trim().to_string(), |e| e.message)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = self.build_url(model);
        debug!(model, prompt_chars = prompt.len(), "sending request to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read Gemini response body")?;

        if !status.is_success() {
            error!(%status, "Gemini API error");
            bail!("Gemini API error ({status}): {}", error_message(&body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).context("failed to parse Gemini response")?;
        extract_text(parsed)
    }
}
