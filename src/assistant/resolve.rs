//! Resolution of parsed intents against the live board.
//!
//! Nothing here mutates the store. Resolution turns names and free-form
//! references into concrete ids, and fails loudly when it cannot, so the
//! caller only applies a fully-resolved intent.

use super::AssistantError;
use super::intent::SelectionPayload;
use crate::db::Database;
use crate::types::{TaskStatus, User, canonicalize_status};

/// A selection with its column reference canonicalized and its bounds
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Column(TaskStatus),
    Titles(Vec<String>),
    LastN(usize),
}

/// Validate a selection payload from the model.
pub fn resolve_selection(payload: SelectionPayload) -> Result<Selection, AssistantError> {
    match payload {
        SelectionPayload::All => Ok(Selection::All),
        SelectionPayload::Column { column } => canonicalize_status(&column)
            .map(Selection::Column)
            .ok_or_else(|| {
                AssistantError::Resolve(format!("Unknown column: \"{}\"", column))
            }),
        SelectionPayload::Titles { titles } => {
            let titles: Vec<String> = titles
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if titles.is_empty() {
                return Err(AssistantError::Resolve(
                    "No task titles were given".to_string(),
                ));
            }
            Ok(Selection::Titles(titles))
        }
        SelectionPayload::LastN { count } => {
            if count == 0 {
                return Err(AssistantError::Resolve(
                    "Asked to act on zero tasks".to_string(),
                ));
            }
            Ok(Selection::LastN(count))
        }
    }
}

/// Resolve an assignee name to a user, case-insensitive exact match
/// first, then substring. No match fails the whole intent.
pub fn resolve_assignee(db: &Database, name: &str) -> Result<User, AssistantError> {
    db.find_user_by_name(name)?
        .ok_or_else(|| AssistantError::Resolve(format!("No team member matches \"{}\"", name)))
}

/// Expand a selection into concrete task ids.
///
/// Title matching is case-insensitive substring, fuzzy by design: every
/// task whose title contains any given fragment is selected. An empty
/// result is an error, so an intent never "succeeds" by doing nothing.
pub fn select_task_ids(db: &Database, selection: &Selection) -> Result<Vec<i64>, AssistantError> {
    let tasks = db.list_tasks()?;

    let ids: Vec<i64> = match selection {
        Selection::All => tasks.iter().map(|t| t.task.id).collect(),
        Selection::Column(status) => tasks
            .iter()
            .filter(|t| t.task.status == *status)
            .map(|t| t.task.id)
            .collect(),
        Selection::Titles(fragments) => {
            let fragments: Vec<String> =
                fragments.iter().map(|f| f.to_lowercase()).collect();
            tasks
                .iter()
                .filter(|t| {
                    let title = t.task.title.to_lowercase();
                    fragments.iter().any(|f| title.contains(f))
                })
                .map(|t| t.task.id)
                .collect()
        }
        Selection::LastN(count) => {
            let mut recent: Vec<&crate::types::Task> =
                tasks.iter().map(|t| &t.task).collect();
            recent.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
            });
            recent.iter().take(*count).map(|t| t.id).collect()
        }
    };

    if ids.is_empty() {
        return Err(AssistantError::Resolve(
            "No tasks match that selection".to_string(),
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewTask, Priority};

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_tasks(&[
            NewTask {
                title: "Fix login bug".to_string(),
                description: None,
                priority: Priority::High,
                estimated_time: Some(30),
                status: TaskStatus::Todo,
            },
            NewTask {
                title: "Write docs".to_string(),
                description: None,
                priority: Priority::Low,
                estimated_time: Some(60),
                status: TaskStatus::InProgress,
            },
            NewTask {
                title: "Deploy to staging".to_string(),
                description: None,
                priority: Priority::Medium,
                estimated_time: Some(15),
                status: TaskStatus::InProgress,
            },
        ])
        .unwrap();
        db
    }

    #[test]
    fn column_selection_is_canonicalized() {
        let selection = resolve_selection(SelectionPayload::Column {
            column: "In Progress".to_string(),
        })
        .unwrap();
        assert_eq!(selection, Selection::Column(TaskStatus::InProgress));

        let err = resolve_selection(SelectionPayload::Column {
            column: "icebox".to_string(),
        });
        assert!(matches!(err, Err(AssistantError::Resolve(_))));
    }

    #[test]
    fn column_selection_picks_only_that_column() {
        let db = seeded_db();
        let ids =
            select_task_ids(&db, &Selection::Column(TaskStatus::InProgress)).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn title_matching_is_case_insensitive_substring() {
        let db = seeded_db();
        let ids = select_task_ids(
            &db,
            &Selection::Titles(vec!["LOGIN".to_string(), "docs".to_string()]),
        )
        .unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let db = seeded_db();
        let err = select_task_ids(&db, &Selection::Titles(vec!["nonexistent".to_string()]));
        assert!(matches!(err, Err(AssistantError::Resolve(_))));
    }

    #[test]
    fn last_n_takes_most_recent() {
        let db = seeded_db();
        let ids = select_task_ids(&db, &Selection::LastN(2)).unwrap();
        // Same created_at ms is possible in a batch; id order breaks the tie.
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn unmatched_assignee_is_an_error() {
        let db = seeded_db();
        db.insert_user("Jane Doe", "jane@example.com", None).unwrap();

        assert_eq!(resolve_assignee(&db, "jane").unwrap().name, "Jane Doe");
        assert!(matches!(
            resolve_assignee(&db, "Nobody"),
            Err(AssistantError::Resolve(_))
        ));
    }
}
