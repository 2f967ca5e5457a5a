//! Prompt construction for the response cascade.

use super::index::RetrievedChunk;

pub const SUPPORT_SYSTEM_PROMPT: &str = r#"You are a supportive mental health chatbot designed to provide empathetic responses.
Remember these guidelines:
- Prioritize empathy and emotional support in your responses
- Validate the user's feelings and experiences
- Avoid diagnostic language or making promises about outcomes
- Suggest helpful coping strategies when appropriate
- Be mindful of serious concerns that might require professional help
- Ensure users feel heard and respected, reinforcing autonomy in their healing journey

Your responses should be warm, evidence-based, and adaptable to different emotional states.
Always validate the user's feelings and guide them toward self-reflection and professional resources where necessary."#;

/// Served when every generation tier has failed. Fixed text; the fallback
/// tier itself can never fail.
pub const APOLOGY_FALLBACK: &str =
    "I apologize, but I'm having trouble responding right now. Please try again in a moment.";

/// Turn feedback-derived style hints into a prompt directive.
///
/// With no hints the directive is a neutral tone instruction.
pub fn style_directive(hints: &[&str]) -> String {
    if hints.is_empty() {
        "Respond in a warm, balanced, and supportive tone.".to_string()
    } else {
        format!(
            "Past feedback shows these elements land well with this community: {}. Emphasize them where they fit naturally.",
            hints.join(", ")
        )
    }
}

/// Prompt for the direct tier: system guidance + style + user message.
pub fn build_direct_prompt(user_message: &str, hints: &[&str]) -> String {
    format!(
        "{SUPPORT_SYSTEM_PROMPT}\n\n{}\n\nRespond with empathy and understanding to the following message: {user_message}",
        style_directive(hints)
    )
}

/// Prompt for the RAG tier: retrieved reference material + style + message.
pub fn build_rag_prompt(user_message: &str, chunks: &[RetrievedChunk], hints: &[&str]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a supportive mental health assistant.\n\
         Use the following information to answer the user's message accurately and with empathy.\n\
         If the retrieved information doesn't provide an answer, rely on your general knowledge but be transparent about it.\n\n\
         {}\n\n\
         User message: {user_message}\n\n\
         Retrieved information:\n{context}\n\n\
         Your response should be supportive, compassionate, and helpful.\n\
         If appropriate, suggest coping strategies or resources while acknowledging the user's feelings.",
        style_directive(hints)
    )
}
