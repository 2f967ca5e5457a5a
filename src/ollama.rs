//! Ollama HTTP gateway — the single point of contact with the local
//! text-generation service.
//!
//! Every failure mode is a typed [`GenerateError`] value; callers (the
//! response cascade, the report narrator) decide how to degrade. Nothing in
//! this module panics on a network problem, and no error crosses a module
//! boundary as anything other than a `Result`.

use std::sync::Mutex;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{self, GenerationProfile};

/// Errors from the generation service.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cannot reach Ollama at {0} — is the server running?")]
    ConnectionFailed(String),

    #[error("generation timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("Ollama returned status {status}: {body}")]
    BadResponse { status: u16, body: String },

    #[error("malformed Ollama payload: {0}")]
    MalformedPayload(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Text generation seam.
///
/// The engine, the response cascade, and the report narrator all talk to the
/// model through this trait so tests can script every outcome.
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return cleaned text (reasoning spans removed).
    fn generate(&self, prompt: &str, profile: &GenerationProfile) -> Result<String, GenerateError>;

    /// Names of models the service currently has available.
    fn list_models(&self) -> Result<Vec<String>, GenerateError>;
}

/// Remove private reasoning spans (`<think>…</think>`) from model output.
///
/// Reasoning models interleave scratch content with the reply; the entire
/// span, markers included, is dropped and surrounding whitespace trimmed.
pub fn strip_reasoning(text: &str) -> String {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
    re.replace_all(text, "").trim().to_string()
}

// ═══════════════════════════════════════════════════════════
// OllamaClient
// ═══════════════════════════════════════════════════════════

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

/// Blocking HTTP client for a local Ollama instance.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Create a client pointing at the given base URL.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Client for the default local instance, honoring `OLLAMA_BASE_URL`.
    pub fn from_env() -> Self {
        Self::new(&config::ollama_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error, timeout_secs: u64) -> GenerateError {
        if e.is_connect() {
            GenerateError::ConnectionFailed(self.base_url.clone())
        } else if e.is_timeout() {
            GenerateError::TimedOut {
                seconds: timeout_secs,
            }
        } else {
            GenerateError::HttpClient(e.to_string())
        }
    }
}

impl TextGenerator for OllamaClient {
    fn generate(&self, prompt: &str, profile: &GenerationProfile) -> Result<String, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &profile.model,
            prompt,
            stream: false,
            temperature: profile.temperature,
        };

        tracing::debug!(model = %profile.model, prompt_chars = prompt.len(), "sending prompt to Ollama");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(profile.timeout_secs))
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e, profile.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerateError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| GenerateError::MalformedPayload(e.to_string()))?;

        let cleaned = strip_reasoning(&parsed.response);
        tracing::debug!(response_chars = cleaned.len(), "received Ollama response");
        Ok(cleaned)
    }

    fn list_models(&self) -> Result<Vec<String>, GenerateError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .map_err(|e| self.map_send_error(e, 5))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerateError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| GenerateError::MalformedPayload(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

// ═══════════════════════════════════════════════════════════
// MockGenerator
// ═══════════════════════════════════════════════════════════

/// Scriptable generator for tests — returns queued outcomes in order, then
/// repeats the last one. Captures every prompt it is given.
pub struct MockGenerator {
    script: Mutex<Vec<Result<String, GenerateError>>>,
    prompts: Mutex<Vec<String>>,
    models: Vec<String>,
}

impl MockGenerator {
    /// Always succeed with the same text.
    pub fn always(text: &str) -> Self {
        Self::script(vec![Ok(text.to_string())])
    }

    /// Play back the given outcomes one call at a time.
    pub fn script(outcomes: Vec<Result<String, GenerateError>>) -> Self {
        assert!(!outcomes.is_empty(), "script needs at least one outcome");
        Self {
            script: Mutex::new(outcomes),
            prompts: Mutex::new(Vec::new()),
            models: vec![config::DEFAULT_CHAT_MODEL.to_string()],
        }
    }

    /// The most recent prompt seen, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("lock poisoned").last().cloned()
    }

    /// How many generation calls were made.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("lock poisoned").len()
    }

    /// Always fail with a connection error.
    pub fn unreachable() -> Self {
        Self::script(vec![Err(GenerateError::ConnectionFailed(
            "http://localhost:11434".to_string(),
        ))])
    }

    fn clone_outcome(outcome: &Result<String, GenerateError>) -> Result<String, GenerateError> {
        match outcome {
            Ok(text) => Ok(text.clone()),
            Err(GenerateError::ConnectionFailed(url)) => {
                Err(GenerateError::ConnectionFailed(url.clone()))
            }
            Err(GenerateError::TimedOut { seconds }) => {
                Err(GenerateError::TimedOut { seconds: *seconds })
            }
            Err(GenerateError::BadResponse { status, body }) => Err(GenerateError::BadResponse {
                status: *status,
                body: body.clone(),
            }),
            Err(GenerateError::MalformedPayload(msg)) => {
                Err(GenerateError::MalformedPayload(msg.clone()))
            }
            Err(GenerateError::HttpClient(msg)) => Err(GenerateError::HttpClient(msg.clone())),
        }
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str, _profile: &GenerationProfile) -> Result<String, GenerateError> {
        self.prompts
            .lock()
            .expect("lock poisoned")
            .push(prompt.to_string());
        let mut script = self.script.lock().expect("lock poisoned");
        let outcome = if script.len() > 1 {
            script.remove(0)
        } else {
            Self::clone_outcome(&script[0])
        };
        outcome.map(|text| strip_reasoning(&text))
    }

    fn list_models(&self) -> Result<Vec<String>, GenerateError> {
        Ok(self.models.clone())
    }
}
