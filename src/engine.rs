//! Engine facade — the boundary the HTTP/CLI layer binds to.
//!
//! One `ChatEngine` serves every session. It is `Send + Sync`; bindings run
//! each incoming turn on its own worker so one session's blocking
//! generation call never stalls another session's turn. Shared state (the
//! conversation log, the session map, the timelines) is serialized behind
//! its own lock; nothing is held across a network round-trip.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::feedback::{self, ConversationLog, ConversationRecord, FeedbackError, FeedbackStats};
use crate::flow::{SessionStore, TurnPlan};
use crate::knowledge;
use crate::ollama::TextGenerator;
use crate::rag::{ResponseTier, RetrievalIndex, SupportResponder};
use crate::report;
use crate::timeline::{TimelineEntry, TimelineStore};

/// The only failure a caller ever sees; everything else degrades to text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<FeedbackError> for EngineError {
    fn from(e: FeedbackError) -> Self {
        EngineError::InvalidInput(e.to_string())
    }
}

/// Result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response_text: String,
    /// Stable id for later feedback correlation.
    pub conversation_id: usize,
    /// True through the introduction, every question, and the closing line.
    pub in_clinical_flow: bool,
    /// Which cascade tier produced the text; `None` for scripted turns.
    pub tier_used: Option<ResponseTier>,
    pub elapsed_ms: u64,
}

/// A session's timeline with its narrated report.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub entries: Vec<TimelineEntry>,
    pub narrative_report: String,
}

/// Conversation orchestration engine.
pub struct ChatEngine {
    sessions: SessionStore,
    timelines: TimelineStore,
    log: ConversationLog,
    responder: SupportResponder,
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl ChatEngine {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        index: RetrievalIndex,
        config: GenerationConfig,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            timelines: TimelineStore::new(),
            log: ConversationLog::new(),
            responder: SupportResponder::new(Arc::clone(&generator), index, config.clone()),
            generator,
            config,
        }
    }

    /// Engine with the built-in reference corpus loaded.
    pub fn with_builtin_corpus(generator: Arc<dyn TextGenerator>) -> Self {
        let mut index = RetrievalIndex::with_default_embedder();
        index.load_documents(&knowledge::builtin_corpus());
        Self::new(generator, index, GenerationConfig::default())
    }

    /// Handle one user turn. Always returns text.
    pub fn submit_turn(&self, session_id: &str, user_message: &str) -> TurnOutcome {
        let started = Instant::now();

        let outcome = match self.sessions.advance(session_id) {
            TurnPlan::Scripted {
                text,
                record_against,
            } => {
                self.timelines.record(session_id, record_against, user_message);
                let conversation_id = self.log.append(user_message, text);
                TurnOutcome {
                    response_text: text.to_string(),
                    conversation_id,
                    in_clinical_flow: true,
                    tier_used: None,
                    elapsed_ms: 0,
                }
            }
            TurnPlan::Freeform => {
                let hints = feedback::derive_style_hints(&self.log.snapshot());
                let reply = self.responder.respond(user_message, &hints);
                let conversation_id = self.log.append(user_message, &reply.text);
                TurnOutcome {
                    response_text: reply.text,
                    conversation_id,
                    in_clinical_flow: false,
                    tier_used: Some(reply.tier),
                    elapsed_ms: 0,
                }
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            session_id,
            conversation_id = outcome.conversation_id,
            in_clinical_flow = outcome.in_clinical_flow,
            tier = ?outcome.tier_used,
            elapsed_ms,
            "turn complete"
        );
        TurnOutcome {
            elapsed_ms,
            ..outcome
        }
    }

    /// Rate a response 1–5. Resubmission overwrites the previous rating.
    pub fn submit_feedback(&self, conversation_id: usize, rating: u8) -> Result<(), EngineError> {
        self.log.set_rating(conversation_id, rating)?;
        Ok(())
    }

    /// A session's timeline plus its (possibly LLM-narrated) report.
    pub fn get_timeline(&self, session_id: &str) -> TimelineView {
        let entries = self.timelines.snapshot(session_id);
        let narrative_report = report::enhance(&entries, &*self.generator, &self.config.report);
        TimelineView {
            entries,
            narrative_report,
        }
    }

    /// Aggregate feedback statistics across every conversation.
    pub fn get_aggregate_stats(&self) -> FeedbackStats {
        feedback::aggregate_stats(&self.log.snapshot())
    }

    /// One logged exchange, if the id exists.
    pub fn get_conversation(&self, conversation_id: usize) -> Option<ConversationRecord> {
        self.log.get(conversation_id)
    }

    /// Whether the generation service is reachable and has models.
    pub fn health_check(&self) -> bool {
        match self.generator.list_models() {
            Ok(models) => !models.is_empty(),
            Err(e) => {
                tracing::warn!(error = %e, "generation service health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{CLINICAL_QUESTIONS, CLOSING_TEXT, INTRODUCTION_TEXT};
    use crate::ollama::{GenerateError, MockGenerator};
    use crate::rag::prompt::APOLOGY_FALLBACK;

    fn engine_with(generator: Arc<MockGenerator>) -> ChatEngine {
        ChatEngine::with_builtin_corpus(generator)
    }

    /// Drive a session through introduction, all questions, and closing.
    fn complete_intake(engine: &ChatEngine, session_id: &str) {
        for _ in 0..CLINICAL_QUESTIONS.len() + 2 {
            engine.submit_turn(session_id, "an answer");
        }
    }

    #[test]
    fn first_turn_is_the_introduction() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let outcome = engine.submit_turn("user-1", "hello");

        assert_eq!(outcome.response_text, INTRODUCTION_TEXT);
        assert!(outcome.in_clinical_flow);
        assert_eq!(outcome.tier_used, None);
        assert_eq!(outcome.conversation_id, 0);
    }

    #[test]
    fn intake_walks_every_question_then_closes_then_frees() {
        let engine = engine_with(Arc::new(MockGenerator::always("generated reply")));
        let n = CLINICAL_QUESTIONS.len();

        engine.submit_turn("user-1", "hello"); // introduction
        for i in 0..n {
            let outcome = engine.submit_turn("user-1", &format!("answer {i}"));
            assert_eq!(outcome.response_text, CLINICAL_QUESTIONS[i].text);
            assert!(outcome.in_clinical_flow);
        }

        let closing = engine.submit_turn("user-1", "final answer");
        assert_eq!(closing.response_text, CLOSING_TEXT);
        assert!(closing.in_clinical_flow);

        // The (N+2)-th call onward never reissues a clinical question
        let freeform = engine.submit_turn("user-1", "let's talk");
        assert!(!freeform.in_clinical_flow);
        assert!(freeform.tier_used.is_some());
        assert_eq!(freeform.response_text, "generated reply");
    }

    #[test]
    fn every_answer_lands_on_the_timeline_in_order() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let n = CLINICAL_QUESTIONS.len();

        engine.submit_turn("user-1", "hello");
        for i in 0..n {
            engine.submit_turn("user-1", &format!("answer to question {i}"));
        }
        // The last question's answer arrives on the closing turn
        engine.submit_turn("user-1", &format!("answer to question {}", n - 1));

        let entries = engine.get_timeline("user-1").entries;
        assert_eq!(entries.len(), n);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.question_id, CLINICAL_QUESTIONS[i].id);
        }
    }

    #[test]
    fn introduction_turn_records_no_timeline_entry() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        engine.submit_turn("user-1", "hello");
        engine.submit_turn("user-1", "not recorded yet");
        assert!(engine.get_timeline("user-1").entries.is_empty());
    }

    #[test]
    fn conversation_ids_are_dense_across_sessions() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let a = engine.submit_turn("alice", "hi").conversation_id;
        let b = engine.submit_turn("bob", "hi").conversation_id;
        let c = engine.submit_turn("alice", "answer").conversation_id;
        assert_eq!((a, b, c), (0, 1, 2));
    }

    #[test]
    fn feedback_rejects_out_of_range_and_unknown() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let id = engine.submit_turn("user-1", "hello").conversation_id;

        assert!(matches!(
            engine.submit_feedback(id, 0),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.submit_feedback(id, 6),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.submit_feedback(999, 3),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(engine.submit_feedback(id, 5).is_ok());
    }

    #[test]
    fn feedback_resubmission_overwrites() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let id = engine.submit_turn("user-1", "hello").conversation_id;

        engine.submit_feedback(id, 2).unwrap();
        engine.submit_feedback(id, 4).unwrap();

        let stats = engine.get_aggregate_stats();
        assert_eq!(stats.total_rated, 1);
        assert_eq!(stats.rating_histogram, [0, 0, 0, 1, 0]);
        assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_tier_reaches_the_caller() {
        let engine = engine_with(Arc::new(MockGenerator::unreachable()));
        complete_intake(&engine, "user-1");

        let outcome = engine.submit_turn("user-1", "talk to me");
        assert_eq!(outcome.tier_used, Some(ResponseTier::Fallback));
        assert_eq!(outcome.response_text, APOLOGY_FALLBACK);
    }

    #[test]
    fn freeform_prompts_carry_learned_style_hints() {
        let generator = Arc::new(MockGenerator::always(
            "I understand, and I want to support you.",
        ));
        let engine = engine_with(Arc::clone(&generator));
        complete_intake(&engine, "user-1");

        let first = engine.submit_turn("user-1", "I feel overwhelmed");
        engine.submit_feedback(first.conversation_id, 5).unwrap();

        engine.submit_turn("user-1", "still overwhelmed");
        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("these elements land well"));
        assert!(prompt.contains("understand"));
    }

    #[test]
    fn freeform_prompts_are_neutral_without_feedback() {
        let generator = Arc::new(MockGenerator::always("A calm reply."));
        let engine = engine_with(Arc::clone(&generator));
        complete_intake(&engine, "user-1");

        engine.submit_turn("user-1", "I feel overwhelmed");
        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("warm, balanced, and supportive tone"));
    }

    #[test]
    fn scripted_turns_never_touch_the_generator() {
        let generator = Arc::new(MockGenerator::always("ok"));
        let engine = engine_with(Arc::clone(&generator));
        complete_intake(&engine, "user-1");
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn timeline_report_degrades_when_generation_fails() {
        let engine = engine_with(Arc::new(MockGenerator::script(vec![Err(
            GenerateError::TimedOut { seconds: 60 },
        )])));
        complete_intake(&engine, "user-1");

        let view = engine.get_timeline("user-1");
        assert!(view.narrative_report.starts_with("CLINICAL ASSESSMENT SUMMARY"));
        assert_eq!(view.entries.len(), CLINICAL_QUESTIONS.len());
    }

    #[test]
    fn concurrent_turns_keep_sessions_and_ids_consistent() {
        use std::thread;

        let engine = Arc::new(engine_with(Arc::new(MockGenerator::always("ok"))));
        let mut handles = Vec::new();

        for worker in 0..4 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let session = format!("user-{worker}");
                (0..10)
                    .map(|i| engine.submit_turn(&session, &format!("msg {i}")).conversation_id)
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 40, "conversation ids must never collide");

        // Each session advanced through its own flow independently
        for worker in 0..4 {
            let entries = engine.get_timeline(&format!("user-{worker}")).entries;
            assert_eq!(entries.len(), CLINICAL_QUESTIONS.len());
        }
    }

    #[test]
    fn health_check_reflects_generator_state() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        assert!(engine.health_check());
    }

    #[test]
    fn turn_outcome_serializes_for_the_boundary() {
        let engine = engine_with(Arc::new(MockGenerator::always("ok")));
        let outcome = engine.submit_turn("user-1", "hello");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"conversation_id\":0"));
        assert!(json.contains("\"in_clinical_flow\":true"));
        assert!(json.contains("\"tier_used\":null"));
    }
}
