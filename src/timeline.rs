//! Per-session timeline of answered intake questions.
//!
//! Entries are append-only and strictly insertion-ordered; nothing is ever
//! reordered or deduplicated, even if a user repeats themselves.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::flow::ClinicalQuestion;

/// One answered question on a session's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: NaiveDateTime,
    pub question_id: String,
    pub question_text: String,
    pub response_text: String,
    pub tag: String,
    pub category: String,
}

/// Owns every session's timeline. Recording is keyed by session id; each
/// timeline grows monotonically for the life of the process.
pub struct TimelineStore {
    timelines: Mutex<HashMap<String, Vec<TimelineEntry>>>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self {
            timelines: Mutex::new(HashMap::new()),
        }
    }

    /// Append the user's answer against the question it replies to.
    ///
    /// `question` is `None` on turns with no prior question (the
    /// introduction), which records nothing.
    pub fn record(
        &self,
        session_id: &str,
        question: Option<&ClinicalQuestion>,
        response_text: &str,
    ) {
        let Some(question) = question else {
            return;
        };

        let entry = TimelineEntry {
            timestamp: chrono::Local::now().naive_local(),
            question_id: question.id.to_string(),
            question_text: question.text.to_string(),
            response_text: response_text.to_string(),
            tag: question.tag.to_string(),
            category: question.category.to_string(),
        };

        tracing::debug!(session_id, question_id = question.id, "timeline entry recorded");

        let mut timelines = self.timelines.lock().expect("lock poisoned");
        timelines
            .entry(session_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Every entry for a session, in insertion order. Empty for unknown
    /// sessions.
    pub fn snapshot(&self, session_id: &str) -> Vec<TimelineEntry> {
        let timelines = self.timelines.lock().expect("lock poisoned");
        timelines.get(session_id).cloned().unwrap_or_default()
    }

    pub fn entry_count(&self, session_id: &str) -> usize {
        let timelines = self.timelines.lock().expect("lock poisoned");
        timelines.get(session_id).map_or(0, Vec::len)
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}
