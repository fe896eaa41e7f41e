//! Builds the chat transcript sent to the configured LLM backend from a
//! fetched diff bundle.

use llm_stream::ChatMessage;
use scm::DiffBundle;

const SYSTEM_PROMPT: &str = r#"You are a senior code reviewer.
Respond with a single JSON object matching this shape:
{"summary": string, "issues": [{"file": string, "startLine": number, "severity": "critical"|"major"|"minor"|"info", "title": string, "suggestion"?: string, "confidence"?: number, "suggestedFix"?: {"removedLines": [string], "addedLines": [string]}}], "nonBlockingNotes": [{"file": string, "line": number, "text": string}]}
Only comment on lines actually touched by the diff. Be concise and specific; do not invent issues."#;

pub fn build_messages(bundle: &DiffBundle) -> Vec<ChatMessage> {
    let description = bundle.meta.description.as_deref().unwrap_or("(no description)");
    let user = format!(
        "# Change Request\nTitle: {}\nDescription: {}\n\n# Diff\n```diff\n{}\n```\n",
        bundle.meta.title, description, bundle.raw_text
    );
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}
