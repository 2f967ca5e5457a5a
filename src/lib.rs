//! Solace — conversation orchestration for a mental-health support chat.
//!
//! A single [`ChatEngine`] drives every session through a structured
//! clinical intake, records answers on a per-session timeline, then hands
//! the conversation to a retrieval-augmented generation cascade that
//! adapts its style to community feedback. Bindings (HTTP, CLI) sit on
//! top of the engine; this crate owns no transport.

pub mod config;
pub mod engine;
pub mod feedback;
pub mod flow;
pub mod knowledge;
pub mod ollama;
pub mod rag;
pub mod report;
pub mod timeline;

pub use engine::{ChatEngine, EngineError, TimelineView, TurnOutcome};
pub use feedback::FeedbackStats;
pub use flow::{FlowState, CLINICAL_QUESTIONS};
pub use ollama::{GenerateError, OllamaClient, TextGenerator};
pub use rag::{ResponseTier, RetrievalIndex};
pub use timeline::TimelineEntry;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the engine.
///
/// `RUST_LOG` wins when set; otherwise the crate default applies.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
