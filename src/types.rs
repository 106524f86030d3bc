//! Core types for the task board.

use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Workflow stage of a task. Doubles as the partition key for
/// per-column position ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "inProgress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Done => "done",
        }
    }

    /// Strict parse of the wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "inProgress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Map a free-form column reference ("In Progress", "to-do", "doing", ...)
/// to the status enum. Chat input and LLM output both go through here so
/// that column naming drift never silently selects the wrong column.
pub fn canonicalize_status(input: &str) -> Option<TaskStatus> {
    let normalized: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    match normalized.as_str() {
        "todo" | "backlog" | "open" => Some(TaskStatus::Todo),
        "inprogress" | "doing" | "wip" | "started" => Some(TaskStatus::InProgress),
        "done" | "complete" | "completed" | "finished" | "closed" => Some(TaskStatus::Done),
        _ => None,
    }
}

/// A task row as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// Estimated completion time in minutes.
    pub estimated_time: Option<i64>,
    pub status: TaskStatus,
    /// Zero-based rank within the status column.
    pub position: i64,
    pub assignee_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task joined with its assignee's display fields, as returned by
/// the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithAssignee {
    #[serde(flatten)]
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_avatar: Option<String>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub estimated_time: Option<i64>,
    #[serde(default)]
    pub status: TaskStatus,
}

/// A board user. Read-only from this subsystem's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_str() {
        for p in [Priority::High, Priority::Medium, Priority::Low] {
            assert_eq!(Priority::parse(p.as_str()), Some(p));
        }
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn status_strict_parse_rejects_variants() {
        assert_eq!(TaskStatus::parse("inProgress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("in progress"), None);
        assert_eq!(TaskStatus::parse("IN_PROGRESS"), None);
    }

    #[test]
    fn canonicalize_accepts_common_spellings() {
        assert_eq!(canonicalize_status("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(canonicalize_status("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(canonicalize_status("TO DO"), Some(TaskStatus::Todo));
        assert_eq!(canonicalize_status("Completed"), Some(TaskStatus::Done));
        assert_eq!(canonicalize_status("doing"), Some(TaskStatus::InProgress));
    }

    #[test]
    fn canonicalize_rejects_unknown_columns() {
        assert_eq!(canonicalize_status("archived"), None);
        assert_eq!(canonicalize_status(""), None);
    }
}
