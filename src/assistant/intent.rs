//! Intent routing and the structured payloads expected from the model.

use crate::types::Priority;
use serde::Deserialize;

/// Which kind of instruction a chat message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Produce new tasks from a description of work.
    Generate,
    /// Assign existing tasks to a team member.
    Assign,
    /// Remove existing tasks.
    Delete,
}

const ASSIGN_KEYWORDS: &[&str] = &[
    "assign",
    "give to",
    "set assignee",
    "delegate",
    "should be done by",
    "is responsible for",
];

const DELETE_KEYWORDS: &[&str] = &[
    "delete",
    "remove",
    "get rid of",
    "clear out",
    "drop the",
];

/// Route a chat message to an intent by keyword. Delete wins over assign
/// so "remove the tasks assigned to Jane" is not treated as an assignment.
pub fn route_intent(message: &str) -> IntentKind {
    let lower = message.to_lowercase();

    if DELETE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        IntentKind::Delete
    } else if ASSIGN_KEYWORDS.iter().any(|k| lower.contains(k)) {
        IntentKind::Assign
    } else {
        IntentKind::Generate
    }
}

/// A task produced by the generate intent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Estimated completion time in minutes. Must be positive.
    pub estimated_time: i64,
    /// Free-form column reference; canonicalized before use.
    pub status: Option<String>,
    /// Team member to assign the task to, by name.
    pub assignee_name: Option<String>,
}

/// Which tasks an assign/delete intent targets, as emitted by the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum SelectionPayload {
    /// Every task on the board.
    All,
    /// Every task in one column (free-form column reference).
    Column { column: String },
    /// Tasks whose titles contain any of these fragments.
    Titles { titles: Vec<String> },
    /// The N most recently created tasks. Delete only.
    LastN { count: usize },
}

/// Payload for the assign intent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPayload {
    pub assignee_name: String,
    #[serde(flatten)]
    pub selection: SelectionPayload,
}

/// Payload for the delete intent.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePayload {
    #[serde(flatten)]
    pub selection: SelectionPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_requests_route_to_generate() {
        assert_eq!(route_intent("plan a launch party"), IntentKind::Generate);
        assert_eq!(route_intent("break down the migration work"), IntentKind::Generate);
    }

    #[test]
    fn assignment_phrasings_route_to_assign() {
        assert_eq!(
            route_intent("Assign all tasks in progress to Jane Doe"),
            IntentKind::Assign
        );
        assert_eq!(route_intent("the login bug should be done by John"), IntentKind::Assign);
    }

    #[test]
    fn delete_wins_over_assign() {
        assert_eq!(
            route_intent("remove the tasks assigned to Jane"),
            IntentKind::Delete
        );
        assert_eq!(route_intent("delete the last 3 tasks"), IntentKind::Delete);
    }

    #[test]
    fn selection_payload_deserializes_all_scopes() {
        let all: SelectionPayload = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert!(matches!(all, SelectionPayload::All));

        let column: SelectionPayload =
            serde_json::from_str(r#"{"scope":"column","column":"in progress"}"#).unwrap();
        assert!(matches!(column, SelectionPayload::Column { .. }));

        let last: SelectionPayload =
            serde_json::from_str(r#"{"scope":"lastN","count":3}"#).unwrap();
        assert!(matches!(last, SelectionPayload::LastN { count: 3 }));
    }

    #[test]
    fn assign_payload_requires_assignee_name() {
        let err = serde_json::from_str::<AssignPayload>(r#"{"scope":"all"}"#);
        assert!(err.is_err());
    }
}
