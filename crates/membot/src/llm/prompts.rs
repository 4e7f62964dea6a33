//! Prompt templates shared by the chat and summary calls

use crate::memory::{Role, Turn};

/// System preamble identifying the assistant
///
/// Placeholders: {name}, {personality}
pub const SYSTEM_PREAMBLE: &str = "You are {name}, {personality}";

/// Progressive summarization prompt
///
/// Placeholders: {summary} - the digest so far, {new_lines} - lines to fold in
pub const SUMMARY_PROMPT: &str = r#"Progressively summarize the lines of conversation provided, adding onto the previous summary and returning a new summary.

Current summary:
{summary}

New lines of conversation:
{new_lines}

New summary:"#;

/// Flattened conversation used when history is not sent as structured messages
///
/// Placeholders: {history}, {input}
pub const TRANSCRIPT_PROMPT: &str = r#"Current conversation:
{history}
Human: {input}"#;

pub fn system_preamble(name: &str, personality: &str) -> String {
    SYSTEM_PREAMBLE
        .replace("{name}", name)
        .replace("{personality}", personality)
}

pub fn summary_prompt(existing_digest: &str, new_text: &str) -> String {
    SUMMARY_PROMPT
        .replace("{summary}", existing_digest)
        .replace("{new_lines}", &format!("Human: {new_text}"))
}

/// Render turns as `Human: ...` / `AI: ...` lines
pub fn format_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| match t.role {
            Role::Human => format!("Human: {}", t.content),
            Role::Assistant => format!("AI: {}", t.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn transcript_prompt(history: &[Turn], input: &str) -> String {
    TRANSCRIPT_PROMPT
        .replace("{history}", &format_transcript(history))
        .replace("{input}", input)
}
