//! Conversation log and feedback-driven style learning.
//!
//! Every exchange lands in a global append-only log whose position is the
//! stable conversation id. Users rate responses 1–5; ratings are aggregated
//! per style keyword (a fixed vocabulary matched case-insensitively against
//! the rated response) and keywords whose mean rating clears the threshold
//! become style hints for future prompts.
//!
//! Aggregates are derived from the log on demand rather than kept as a
//! separate mutable map, so re-rating a conversation overwrites its
//! contribution instead of duplicating it.

use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::STYLE_HINT_THRESHOLD;

/// Errors from the feedback-submission boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("unknown conversation id {0}")]
    UnknownConversation(usize),
}

/// One logged exchange. Its index in the log is its conversation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub timestamp: NaiveDateTime,
    pub user_message: String,
    pub bot_response: String,
    pub feedback_rating: Option<u8>,
}

/// Fixed vocabulary of style keywords, in enumeration order. Matching is
/// case-insensitive substring search over the bot response, so stems like
/// "valid" also catch "validate" and "validation".
pub const STYLE_VOCABULARY: &[&str] = &[
    "understand",
    "feel",
    "valid",
    "support",
    "advice",
    "suggest",
    "resource",
    "coping",
    "strategy",
    "mindful",
    "breathing",
    "strength",
];

/// Ratings accumulated for one vocabulary keyword.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordPattern {
    pub keyword: &'static str,
    pub ratings: Vec<u8>,
}

impl KeywordPattern {
    pub fn mean(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.ratings.iter().map(|&r| u64::from(r)).sum();
        sum as f64 / self.ratings.len() as f64
    }
}

/// Aggregate feedback statistics across the whole log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total_rated: usize,
    pub average_rating: f64,
    /// Counts for ratings 1 through 5, in order.
    pub rating_histogram: [u64; 5],
}

// ═══════════════════════════════════════════════════════════
// ConversationLog
// ═══════════════════════════════════════════════════════════

/// Global append-only exchange log.
///
/// Id assignment happens under the same lock as the append, so ids are
/// dense, zero-based, and never reused even under concurrent turns.
pub struct ConversationLog {
    records: Mutex<Vec<ConversationRecord>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Append an exchange and return its conversation id.
    pub fn append(&self, user_message: &str, bot_response: &str) -> usize {
        let mut records = self.records.lock().expect("lock poisoned");
        let id = records.len();
        records.push(ConversationRecord {
            timestamp: chrono::Local::now().naive_local(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            feedback_rating: None,
        });
        id
    }

    /// Attach a rating to an exchange. Re-rating overwrites.
    pub fn set_rating(&self, conversation_id: usize, rating: u8) -> Result<(), FeedbackError> {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }

        let mut records = self.records.lock().expect("lock poisoned");
        let record = records
            .get_mut(conversation_id)
            .ok_or(FeedbackError::UnknownConversation(conversation_id))?;
        record.feedback_rating = Some(rating);
        tracing::info!(conversation_id, rating, "feedback recorded");
        Ok(())
    }

    pub fn get(&self, conversation_id: usize) -> Option<ConversationRecord> {
        let records = self.records.lock().expect("lock poisoned");
        records.get(conversation_id).cloned()
    }

    pub fn snapshot(&self) -> Vec<ConversationRecord> {
        self.records.lock().expect("lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Learning
// ═══════════════════════════════════════════════════════════

/// Build keyword rating patterns from the log, in vocabulary order.
///
/// A rated conversation contributes its rating to every keyword its bot
/// response contains.
pub fn keyword_patterns(records: &[ConversationRecord]) -> Vec<KeywordPattern> {
    STYLE_VOCABULARY
        .iter()
        .map(|&keyword| {
            let ratings = records
                .iter()
                .filter_map(|record| {
                    let rating = record.feedback_rating?;
                    record
                        .bot_response
                        .to_lowercase()
                        .contains(keyword)
                        .then_some(rating)
                })
                .collect();
            KeywordPattern { keyword, ratings }
        })
        .collect()
}

/// Keywords whose mean rating clears the threshold, in vocabulary order.
///
/// Empty when nothing qualifies; the prompt builder then falls back to a
/// neutral style directive.
pub fn derive_style_hints(records: &[ConversationRecord]) -> Vec<&'static str> {
    keyword_patterns(records)
        .into_iter()
        .filter(|p| !p.ratings.is_empty() && p.mean() >= STYLE_HINT_THRESHOLD)
        .map(|p| p.keyword)
        .collect()
}

/// Aggregate rating statistics across the log.
pub fn aggregate_stats(records: &[ConversationRecord]) -> FeedbackStats {
    let mut histogram = [0u64; 5];
    let mut sum = 0u64;
    let mut total = 0usize;

    for record in records {
        if let Some(rating) = record.feedback_rating {
            histogram[usize::from(rating) - 1] += 1;
            sum += u64::from(rating);
            total += 1;
        }
    }

    FeedbackStats {
        total_rated: total,
        average_rating: if total == 0 {
            0.0
        } else {
            sum as f64 / total as f64
        },
        rating_histogram: histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(bot_response: &str, rating: u8) -> ConversationRecord {
        ConversationRecord {
            timestamp: chrono::Local::now().naive_local(),
            user_message: "msg".into(),
            bot_response: bot_response.into(),
            feedback_rating: Some(rating),
        }
    }

    #[test]
    fn append_assigns_dense_zero_based_ids() {
        let log = ConversationLog::new();
        assert_eq!(log.append("a", "b"), 0);
        assert_eq!(log.append("c", "d"), 1);
        assert_eq!(log.append("e", "f"), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn set_rating_rejects_out_of_range() {
        let log = ConversationLog::new();
        let id = log.append("hi", "hello");
        assert_eq!(log.set_rating(id, 0), Err(FeedbackError::InvalidRating(0)));
        assert_eq!(log.set_rating(id, 6), Err(FeedbackError::InvalidRating(6)));
        assert!(log.set_rating(id, 5).is_ok());
    }

    #[test]
    fn set_rating_rejects_unknown_id() {
        let log = ConversationLog::new();
        assert_eq!(
            log.set_rating(7, 3),
            Err(FeedbackError::UnknownConversation(7))
        );
    }

    #[test]
    fn rerating_overwrites_instead_of_duplicating() {
        let log = ConversationLog::new();
        let id = log.append("hi", "I understand how you feel");
        log.set_rating(id, 2).unwrap();
        log.set_rating(id, 5).unwrap();

        let stats = aggregate_stats(&log.snapshot());
        assert_eq!(stats.total_rated, 1);
        assert_eq!(stats.rating_histogram, [0, 0, 0, 0, 1]);

        // The keyword pattern only carries the latest rating
        let patterns = keyword_patterns(&log.snapshot());
        let understand = patterns.iter().find(|p| p.keyword == "understand").unwrap();
        assert_eq!(understand.ratings, vec![5]);
    }

    #[test]
    fn appends_assign_unique_ids_under_concurrency() {
        use std::sync::Arc;
        use std::thread;

        let log = Arc::new(ConversationLog::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let log = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                (0..50).map(|_| log.append("u", "b")).collect::<Vec<_>>()
            }));
        }

        let mut ids: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(log.len(), 400);
    }

    #[test]
    fn keyword_matching_is_case_insensitive_substring() {
        let records = vec![rated("I VALIDATE your experience", 5)];
        let patterns = keyword_patterns(&records);
        let valid = patterns.iter().find(|p| p.keyword == "valid").unwrap();
        assert_eq!(valid.ratings, vec![5]);
    }

    #[test]
    fn unrated_records_contribute_nothing() {
        let mut record = rated("I understand", 4);
        record.feedback_rating = None;
        let hints = derive_style_hints(&[record]);
        assert!(hints.is_empty());
    }

    #[test]
    fn hints_follow_vocabulary_order_not_score_order() {
        // "support" scores higher than "understand" but comes later in the
        // vocabulary, so "understand" is still listed first.
        let records = vec![
            rated("I understand you", 4),
            rated("here is some support", 5),
        ];
        let hints = derive_style_hints(&records);
        assert_eq!(hints, vec!["understand", "support"]);
    }

    #[test]
    fn mean_exactly_four_qualifies() {
        let records = vec![rated("coping ideas", 3), rated("coping ideas", 5)];
        assert_eq!(derive_style_hints(&records), vec!["coping"]);
    }

    #[test]
    fn mean_just_below_four_does_not_qualify() {
        // 99×4 + 1×3 → mean 3.99
        let mut records: Vec<_> = (0..99).map(|_| rated("try breathing", 4)).collect();
        records.push(rated("try breathing", 3));
        assert!(derive_style_hints(&records).is_empty());
    }

    #[test]
    fn no_ratings_yields_no_hints() {
        assert!(derive_style_hints(&[]).is_empty());
    }

    #[test]
    fn one_response_can_feed_multiple_keywords() {
        let records = vec![rated("I understand; try a coping strategy", 5)];
        assert_eq!(
            derive_style_hints(&records),
            vec!["understand", "coping", "strategy"]
        );
    }

    #[test]
    fn stats_histogram_and_average() {
        let records = vec![
            rated("a", 1),
            rated("b", 5),
            rated("c", 5),
            rated("d", 3),
        ];
        let stats = aggregate_stats(&records);
        assert_eq!(stats.total_rated, 4);
        assert_eq!(stats.rating_histogram, [1, 0, 1, 0, 2]);
        assert!((stats.average_rating - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_empty_log() {
        let stats = aggregate_stats(&[]);
        assert_eq!(stats.total_rated, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.rating_histogram, [0; 5]);
    }
}
