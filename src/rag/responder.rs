//! Three-tier response cascade.
//!
//! Tier order: retrieval-augmented generation, direct generation, fixed
//! apology. A tier is abandoned immediately on timeout or connection
//! failure — no in-tier retries — and the tier that actually produced the
//! returned text is always reported, so "was retrieval used" stays honest.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::index::RetrievalIndex;
use super::prompt::{build_direct_prompt, build_rag_prompt, APOLOGY_FALLBACK};
use crate::config::{GenerationConfig, RETRIEVAL_TOP_K};
use crate::ollama::{strip_reasoning, TextGenerator};

/// Which tier produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTier {
    Rag,
    Direct,
    Fallback,
}

/// A reply plus the tier that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReply {
    pub text: String,
    pub tier: ResponseTier,
}

/// Runs the cascade over a generator and a retrieval index.
pub struct SupportResponder {
    generator: Arc<dyn TextGenerator>,
    index: RetrievalIndex,
    config: GenerationConfig,
}

impl SupportResponder {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        index: RetrievalIndex,
        config: GenerationConfig,
    ) -> Self {
        Self {
            generator,
            index,
            config,
        }
    }

    pub fn index(&self) -> &RetrievalIndex {
        &self.index
    }

    /// Produce a reply. Never fails: the last tier is a fixed string.
    pub fn respond(&self, user_message: &str, style_hints: &[&str]) -> GeneratedReply {
        if let Some(reply) = self.try_rag_tier(user_message, style_hints) {
            return reply;
        }
        if let Some(reply) = self.try_direct_tier(user_message, style_hints) {
            return reply;
        }

        tracing::warn!("all generation tiers failed — serving fixed fallback");
        GeneratedReply {
            text: APOLOGY_FALLBACK.to_string(),
            tier: ResponseTier::Fallback,
        }
    }

    fn try_rag_tier(&self, user_message: &str, style_hints: &[&str]) -> Option<GeneratedReply> {
        if !self.index.is_ready() {
            tracing::debug!("retrieval index not loaded — skipping RAG tier");
            return None;
        }

        let chunks = self.index.query(user_message, RETRIEVAL_TOP_K);
        if chunks.is_empty() {
            tracing::debug!("no relevant chunks — skipping RAG tier");
            return None;
        }

        let prompt = build_rag_prompt(user_message, &chunks, style_hints);
        match self.generator.generate(&prompt, &self.config.rag) {
            Ok(text) => {
                let text = strip_reasoning(&text);
                if text.is_empty() {
                    tracing::warn!("RAG tier returned empty text — demoting to direct");
                    None
                } else {
                    tracing::info!(chunks = chunks.len(), "reply produced by RAG tier");
                    Some(GeneratedReply {
                        text,
                        tier: ResponseTier::Rag,
                    })
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "RAG tier generation failed — demoting to direct");
                None
            }
        }
    }

    fn try_direct_tier(&self, user_message: &str, style_hints: &[&str]) -> Option<GeneratedReply> {
        let prompt = build_direct_prompt(user_message, style_hints);
        match self.generator.generate(&prompt, &self.config.direct) {
            Ok(text) => {
                let text = strip_reasoning(&text);
                if text.is_empty() {
                    tracing::warn!("direct tier returned empty text");
                    None
                } else {
                    Some(GeneratedReply {
                        text,
                        tier: ResponseTier::Direct,
                    })
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "direct tier generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge;
    use crate::ollama::{GenerateError, MockGenerator};
    use crate::rag::index::RetrievalIndex;

    /// A query whose tokens overlap the built-in anxiety material.
    const RELEVANT_QUERY: &str = "excessive worry fear nervousness interferes with daily activities";

    fn loaded_index() -> RetrievalIndex {
        let mut index = RetrievalIndex::with_default_embedder();
        index.load_documents(&knowledge::builtin_corpus());
        index
    }

    fn responder(generator: MockGenerator, index: RetrievalIndex) -> SupportResponder {
        SupportResponder::new(Arc::new(generator), index, GenerationConfig::default())
    }

    #[test]
    fn retrieval_plus_generation_reports_rag_tier() {
        let responder = responder(MockGenerator::always("That sounds hard."), loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Rag);
        assert_eq!(reply.text, "That sounds hard.");
    }

    #[test]
    fn empty_retrieval_reports_direct_tier() {
        let responder = responder(MockGenerator::always("I'm here with you."), loaded_index());
        let reply = responder.respond("zzzqqq xyzzyx", &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
    }

    #[test]
    fn unloaded_index_skips_straight_to_direct() {
        let responder = responder(
            MockGenerator::always("Listening."),
            RetrievalIndex::with_default_embedder(),
        );
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
    }

    #[test]
    fn rag_failure_demotes_to_direct() {
        let generator = MockGenerator::script(vec![
            Err(GenerateError::TimedOut { seconds: 30 }),
            Ok("Direct reply.".to_string()),
        ]);
        let responder = responder(generator, loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
        assert_eq!(reply.text, "Direct reply.");
    }

    #[test]
    fn both_tiers_failing_serves_fixed_apology() {
        let responder = responder(MockGenerator::unreachable(), loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Fallback);
        assert_eq!(reply.text, APOLOGY_FALLBACK);
    }

    #[test]
    fn empty_generation_counts_as_tier_failure() {
        // RAG tier yields only whitespace, direct tier succeeds
        let generator = MockGenerator::script(vec![
            Ok("   \n  ".to_string()),
            Ok("Something real.".to_string()),
        ]);
        let responder = responder(generator, loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
    }

    #[test]
    fn reasoning_spans_are_stripped_on_every_tier() {
        let generator = MockGenerator::script(vec![
            Ok("<think>retrieval context is rich</think>  RAG answer.".to_string()),
        ]);
        let responder = responder(generator, loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.text, "RAG answer.");

        let generator = MockGenerator::always("<think>\nscratch\n</think>\nDirect answer.");
        let responder = SupportResponder::new(
            Arc::new(generator),
            RetrievalIndex::with_default_embedder(),
            GenerationConfig::default(),
        );
        let reply = responder.respond("hello", &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
        assert_eq!(reply.text, "Direct answer.");
    }

    #[test]
    fn reply_entirely_reasoning_demotes_tier() {
        // The model emitted only scratch content; after stripping it's empty
        let generator = MockGenerator::script(vec![
            Ok("<think>nothing but scratch</think>".to_string()),
            Ok("Recovered.".to_string()),
        ]);
        let responder = responder(generator, loaded_index());
        let reply = responder.respond(RELEVANT_QUERY, &[]);
        assert_eq!(reply.tier, ResponseTier::Direct);
        assert_eq!(reply.text, "Recovered.");
    }

    #[test]
    fn tier_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ResponseTier::Rag).unwrap(), "\"rag\"");
        assert_eq!(
            serde_json::to_string(&ResponseTier::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
