//! Fixed instruction templates, one per intent.
//!
//! Each template demands a pure JSON payload; parse.rs tolerates fenced
//! or prose-wrapped output anyway.

pub const SYSTEM_INSTRUCTIONS: &str = "You are a task board assistant. \
Always respond with plain JSON only, no markdown formatting, code blocks, \
or commentary.";

pub const GENERATE_INSTRUCTIONS: &str = r#"Analyze the following request and create a list of specific, actionable tasks.
Respond with ONLY a JSON array where each object has:
- "title": clear, concise task title (max 50 chars)
- "description": detailed explanation (max 200 chars)
- "priority": "high", "medium", or "low"
- "estimatedTime": estimated completion time in minutes (positive integer)
- "status": "todo"
Optionally include "assigneeName" when the request names who should do a task.

Example: [{"title":"Task 1","description":"Description 1","priority":"high","estimatedTime":30,"status":"todo"}]"#;

pub const ASSIGN_INSTRUCTIONS: &str = r#"The following request asks to assign existing tasks to a team member.
Respond with ONLY a JSON object:
- "assigneeName": the team member's name as written in the request
- "scope": "all", "column", or "titles"
- when scope is "column": "column" with the column named in the request
- when scope is "titles": "titles" with an array of the task titles mentioned

Examples:
{"assigneeName":"Jane Doe","scope":"column","column":"in progress"}
{"assigneeName":"John","scope":"titles","titles":["login bug","deploy"]}"#;

pub const DELETE_INSTRUCTIONS: &str = r#"The following request asks to delete existing tasks.
Respond with ONLY a JSON object:
- "scope": "all", "column", "titles", or "lastN"
- when scope is "column": "column" with the column named in the request
- when scope is "titles": "titles" with an array of the task titles mentioned
- when scope is "lastN": "count" with how many of the most recent tasks to delete

Examples:
{"scope":"column","column":"done"}
{"scope":"lastN","count":3}"#;

/// Build the user prompt for an intent: the instruction template followed
/// by the raw request.
pub fn build_prompt(instructions: &str, message: &str) -> String {
    format!("{}\n\nRequest: {}", instructions, message)
}
