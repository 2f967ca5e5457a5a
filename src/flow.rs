//! Clinical conversation flow — the fixed intake questionnaire and the
//! per-session state machine that sequences it.
//!
//! A session walks NotStarted → Asking → Closing → Freeform, one step per
//! turn. The index never decreases and never skips; once a session is past
//! the closing line it stays in freeform dialogue for the life of the
//! process.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

/// One question of the fixed intake sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClinicalQuestion {
    pub id: &'static str,
    pub text: &'static str,
    pub tag: &'static str,
    pub category: &'static str,
}

/// The intake questionnaire, asked in order. Defined at build time, never
/// mutated.
pub const CLINICAL_QUESTIONS: &[ClinicalQuestion] = &[
    ClinicalQuestion {
        id: "presenting_issue",
        text: "What brings you in today, and what are the main challenges you're experiencing?",
        tag: "presenting_issue",
        category: "current_concerns",
    },
    ClinicalQuestion {
        id: "mood_changes",
        text: "Have you noticed changes in your mood, energy, or sleep patterns recently—such as feeling very down, anxious, or unusually energetic?",
        tag: "mood",
        category: "symptoms",
    },
    ClinicalQuestion {
        id: "unusual_experiences",
        text: "Have you ever experienced things like hearing voices, seeing things others don't, or feeling that your thoughts are disorganized?",
        tag: "unusual_experiences",
        category: "symptoms",
    },
    ClinicalQuestion {
        id: "functional_impact",
        text: "How are these issues affecting your daily life, relationships, and work or school?",
        tag: "impact",
        category: "functioning",
    },
    ClinicalQuestion {
        id: "past_events",
        text: "Can you share any significant past events or stressors (like trauma or major life changes) that might be contributing to your current feelings?",
        tag: "trauma",
        category: "history",
    },
    ClinicalQuestion {
        id: "strengths",
        text: "What personal strengths or support systems do you rely on when things get tough?",
        tag: "strengths",
        category: "resources",
    },
    ClinicalQuestion {
        id: "goals",
        text: "What would you like to achieve from our work together?",
        tag: "goals",
        category: "treatment_planning",
    },
];

/// Opening message shown on a session's first turn.
pub const INTRODUCTION_TEXT: &str = "Hello, I'm here to support you on your mental health journey. I'd like to understand your experiences better by asking some questions that will help create a timeline of your concerns and strengths.\n\nThis conversation will help us identify patterns and develop strategies tailored to your needs. Feel free to share as much or as little as you're comfortable with, and know that everything you share is confidential.\n\nLet's start with understanding what brings you here today.";

/// Closing line after the last question has been answered.
pub const CLOSING_TEXT: &str = "Thank you for sharing your experiences with me. Based on what you've shared, I can now offer more personalized support. Is there anything specific you'd like to focus on today?";

/// Where a session is in the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    NotStarted,
    Asking(usize),
    Closing,
    Freeform,
}

/// Per-session flow state. One per distinct user id, created on first
/// access, never deleted.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    /// −1 before the introduction; advances by exactly one per turn.
    pub question_index: i64,
}

impl Session {
    fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            question_index: -1,
        }
    }

    pub fn state(&self) -> FlowState {
        let n = CLINICAL_QUESTIONS.len() as i64;
        match self.question_index {
            i if i < 0 => FlowState::NotStarted,
            i if i < n => FlowState::Asking(i as usize),
            i if i == n => FlowState::Closing,
            _ => FlowState::Freeform,
        }
    }
}

/// What the engine should do with the current turn.
#[derive(Debug, Clone, Copy)]
pub enum TurnPlan {
    /// Serve fixed text from the intake script.
    Scripted {
        text: &'static str,
        /// The question whose answer just arrived, if any. The introduction
        /// has no prior question; question k's answer arrives with turn k+2.
        record_against: Option<&'static ClinicalQuestion>,
    },
    /// Hand off to free-form generation.
    Freeform,
}

/// Owns every session's flow state. Sessions are created implicitly and
/// touched only under the map lock, so turns for different users never
/// interleave their indices.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Advance the session by one turn and return the plan for it.
    ///
    /// Unknown session ids are created at index −1: the first call always
    /// yields the introduction.
    pub fn advance(&self, session_id: &str) -> TurnPlan {
        let mut sessions = self.sessions.lock().expect("lock poisoned");
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id));

        let plan = match session.state() {
            FlowState::NotStarted => {
                tracing::info!(session_id, "starting clinical intake");
                TurnPlan::Scripted {
                    text: INTRODUCTION_TEXT,
                    record_against: None,
                }
            }
            FlowState::Asking(i) => TurnPlan::Scripted {
                text: CLINICAL_QUESTIONS[i].text,
                record_against: if i > 0 {
                    Some(&CLINICAL_QUESTIONS[i - 1])
                } else {
                    None
                },
            },
            FlowState::Closing => {
                tracing::info!(session_id, "clinical intake complete");
                TurnPlan::Scripted {
                    text: CLOSING_TEXT,
                    record_against: CLINICAL_QUESTIONS.last(),
                }
            }
            FlowState::Freeform => TurnPlan::Freeform,
        };

        session.question_index += 1;
        plan
    }

    /// Current index for a session, if it exists.
    pub fn question_index(&self, session_id: &str) -> Option<i64> {
        let sessions = self.sessions.lock().expect("lock poisoned");
        sessions.get(session_id).map(|s| s.question_index)
    }

    /// Whether the session is still inside the scripted intake (introduction
    /// through closing line).
    pub fn in_clinical_flow(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock().expect("lock poisoned");
        match sessions.get(session_id) {
            // Index has already advanced past the served prompt, so the
            // closing turn itself sits at n + 1.
            Some(s) => s.question_index <= CLINICAL_QUESTIONS.len() as i64 + 1,
            None => true,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
