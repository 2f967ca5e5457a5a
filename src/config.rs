//! Application-level constants and generation tuning.
//!
//! Model ids, tier timeouts, and sampling temperatures follow the values the
//! engine was tuned against on a local Ollama instance. Everything here can be
//! overridden through environment variables so deployments can swap models
//! without rebuilding.

/// Application-level constants
pub const APP_NAME: &str = "Solace";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter: engine at info, HTTP internals quiet.
pub fn default_log_filter() -> String {
    "solace=info,reqwest=warn".to_string()
}

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default chat/generation model.
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-r1:1.5b";

/// Chunks retrieved per query.
pub const RETRIEVAL_TOP_K: usize = 3;

/// Mean rating a keyword needs before it becomes a style hint.
pub const STYLE_HINT_THRESHOLD: f64 = 4.0;

/// Generation tuning for one tier of the response cascade.
#[derive(Debug, Clone)]
pub struct GenerationProfile {
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Engine-wide generation configuration.
///
/// Per-tier profiles: retrieval-augmented generation runs cooler than open
/// supportive chat, and report narration gets a longer timeout because it
/// consumes the whole timeline.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub rag: GenerationProfile,
    pub direct: GenerationProfile,
    pub report: GenerationProfile,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let model = std::env::var("SOLACE_CHAT_MODEL")
            .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        Self {
            rag: GenerationProfile {
                model: model.clone(),
                temperature: 0.2,
                timeout_secs: 30,
            },
            direct: GenerationProfile {
                model: model.clone(),
                temperature: 0.7,
                timeout_secs: 30,
            },
            report: GenerationProfile {
                model,
                temperature: 0.3,
                timeout_secs: 60,
            },
        }
    }
}

/// Resolve the Ollama base URL from the environment.
pub fn ollama_base_url() -> String {
    std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string())
}
