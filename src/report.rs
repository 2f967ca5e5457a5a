//! Clinical report generation from an intake timeline.
//!
//! `summarize` is pure and always available; `enhance` layers an optional
//! LLM narration on top and degrades back to the structured summary on any
//! generation problem. The caller never sees an error from this module.

use crate::config::GenerationProfile;
use crate::ollama::{strip_reasoning, TextGenerator};
use crate::timeline::TimelineEntry;

pub const INSUFFICIENT_DATA: &str = "Insufficient data to generate a clinical summary.";

/// Appended to every LLM-narrated report.
pub const REPORT_DISCLAIMER: &str = "---\nThis narrative was generated by a language model from the intake timeline. It is not a diagnosis; a qualified clinician should review it.";

/// A narrative under this length is treated as a failed generation.
const MIN_NARRATIVE_CHARS: usize = 80;

/// Presence-based impression rules: if any entry carries one of the listed
/// categories, the suggestion is emitted. Order here is output order.
const IMPRESSION_RULES: &[(&[&str], &str)] = &[
    (&["symptoms"], "Assess severity and duration of reported symptoms"),
    (
        &["trauma", "history"],
        "Explore trauma history and its connection to current symptoms",
    ),
    (&["functioning"], "Evaluate functional impairment across domains"),
    (
        &["resources"],
        "Leverage identified strengths in treatment planning",
    ),
];

/// Build the structured assessment summary.
///
/// Entries are grouped by category in first-seen order; within a category
/// they keep timeline order.
pub fn summarize(entries: &[TimelineEntry]) -> String {
    if entries.is_empty() {
        return INSUFFICIENT_DATA.to_string();
    }

    let mut categories: Vec<(&str, Vec<&TimelineEntry>)> = Vec::new();
    for entry in entries {
        match categories
            .iter_mut()
            .find(|(name, _)| *name == entry.category.as_str())
        {
            Some((_, group)) => group.push(entry),
            None => categories.push((entry.category.as_str(), vec![entry])),
        }
    }

    let mut summary = String::from("CLINICAL ASSESSMENT SUMMARY\n\n");

    for (name, group) in &categories {
        summary.push_str(&format!("{}:\n", format_category(name)));
        for entry in group {
            summary.push_str(&format!("- Question: {}\n", entry.question_text));
            summary.push_str(&format!("  Response: {}\n\n", entry.response_text));
        }
    }

    summary.push_str("CLINICAL IMPRESSIONS:\n");
    summary.push_str("Based on the information provided, consider the following areas for further exploration:\n");

    for (triggers, suggestion) in IMPRESSION_RULES {
        let present = categories
            .iter()
            .any(|(name, _)| triggers.contains(name));
        if present {
            summary.push_str(&format!("- {suggestion}\n"));
        }
    }

    summary
}

/// Narrate the timeline with the generation service.
///
/// Returns the structured summary unchanged when the timeline is empty, the
/// generation fails, or the narrative comes back implausibly short.
pub fn enhance(
    entries: &[TimelineEntry],
    generator: &dyn TextGenerator,
    profile: &GenerationProfile,
) -> String {
    let summary = summarize(entries);
    if entries.is_empty() {
        return summary;
    }

    let prompt = build_narrative_prompt(entries, &summary);
    match generator.generate(&prompt, profile) {
        Ok(text) => {
            let narrative = strip_reasoning(&text);
            if narrative.len() < MIN_NARRATIVE_CHARS {
                tracing::warn!(
                    chars = narrative.len(),
                    "narrative too short — keeping structured summary"
                );
                summary
            } else {
                format!("{narrative}\n\n{REPORT_DISCLAIMER}")
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "report narration failed — keeping structured summary");
            summary
        }
    }
}

fn build_narrative_prompt(entries: &[TimelineEntry], summary: &str) -> String {
    let mut prompt = String::from(
        "You are assisting a mental health professional. Using the structured intake summary and the raw question/answer record below, write a concise narrative report of the person's presentation, history, strengths, and goals. Plain, compassionate clinical language; no diagnoses.\n\n",
    );
    prompt.push_str("Structured summary:\n");
    prompt.push_str(summary);
    prompt.push_str("\nQuestion/answer record:\n");
    for entry in entries {
        prompt.push_str(&format!("Q: {}\nA: {}\n", entry.question_text, entry.response_text));
    }
    prompt
}

fn format_category(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
