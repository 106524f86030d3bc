//! End-to-end assistant tests with a scripted completion provider.
//!
//! The provider is swapped for a canned implementation so the full
//! pipeline (routing, parsing, resolution, store mutation) runs without
//! any network access.

use async_trait::async_trait;
use std::sync::Arc;
use taskboard::assistant::provider::{CompletionProvider, ImageAttachment, ProviderError};
use taskboard::assistant::{Assistant, AssistantError};
use taskboard::db::Database;
use taskboard::types::{NewTask, Priority, TaskStatus};

/// Provider that returns a fixed response for every completion.
struct CannedProvider {
    response: String,
}

impl CannedProvider {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn complete(
        &self,
        _instructions: &str,
        _prompt: &str,
        _image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError> {
        Ok(self.response.clone())
    }
}

/// Provider that always fails, for error-path tests.
struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn complete(
        &self,
        _instructions: &str,
        _prompt: &str,
        _image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Api("provider down".to_string()))
    }
}

fn new_task(title: &str, status: TaskStatus) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: None,
        priority: Priority::Medium,
        estimated_time: Some(30),
        status,
    }
}

fn board_with_tasks() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.create_tasks(&[
        new_task("Fix login bug", TaskStatus::InProgress),
        new_task("Write release notes", TaskStatus::InProgress),
        new_task("Archive old sprints", TaskStatus::Done),
    ])
    .unwrap();
    db
}

#[tokio::test]
async fn generate_creates_tasks_from_fenced_json() {
    let db = Database::open_in_memory().unwrap();
    let response = r#"Here are your tasks:
```json
[
  {"title":"Book venue","description":"Find and reserve a venue","priority":"high","estimatedTime":60,"status":"todo"},
  {"title":"Send invites","description":"Email the team","priority":"low","estimatedTime":15,"status":"todo"}
]
```"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let reply = assistant.handle("plan a launch party", None).await.unwrap();

    assert!(reply.board_changed);
    assert_eq!(reply.created.len(), 2);
    assert!(reply.message.contains("Book venue"));

    let tasks = db.list_tasks().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].task.position, 0);
    assert_eq!(tasks[1].task.position, 1);
}

#[tokio::test]
async fn generate_with_named_assignee_resolves_before_creating() {
    let db = Database::open_in_memory().unwrap();
    let user = db.insert_user("Jane Doe", "jane@example.com", None).unwrap();
    let response = r#"[{"title":"Review PR","description":"Look over the change","priority":"medium","estimatedTime":20,"status":"todo","assigneeName":"jane"}]"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    assistant.handle("have jane review the PR", None).await.unwrap();

    let tasks = db.list_tasks().unwrap();
    assert_eq!(tasks[0].task.assignee_id, Some(user.id));
}

#[tokio::test]
async fn generate_with_unknown_assignee_creates_nothing() {
    let db = Database::open_in_memory().unwrap();
    let response = r#"[{"title":"Review PR","description":"d","priority":"medium","estimatedTime":20,"status":"todo","assigneeName":"Nobody"}]"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let err = assistant.handle("have nobody review the PR", None).await;

    assert!(matches!(err, Err(AssistantError::Resolve(_))));
    assert!(db.list_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn generate_rejects_invalid_priority_payload() {
    let db = Database::open_in_memory().unwrap();
    let response =
        r#"[{"title":"x","description":"d","priority":"urgent","estimatedTime":10,"status":"todo"}]"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let err = assistant.handle("make a task", None).await;

    assert!(matches!(err, Err(AssistantError::Parse(_))));
    assert!(db.list_tasks().unwrap().is_empty());
}

#[tokio::test]
async fn assign_column_to_matched_user() {
    let db = board_with_tasks();
    let user = db.insert_user("Jane Doe", "jane@example.com", None).unwrap();
    let response = r#"{"assigneeName":"Jane Doe","scope":"column","column":"in progress"}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let reply = assistant
        .handle("assign all tasks in progress to Jane Doe", None)
        .await
        .unwrap();

    assert!(reply.message.contains("2 task(s)"));
    assert!(reply.message.contains("Jane Doe"));

    let assigned: Vec<_> = db
        .list_tasks()
        .unwrap()
        .into_iter()
        .filter(|t| t.task.assignee_id == Some(user.id))
        .collect();
    assert_eq!(assigned.len(), 2);
    assert!(assigned.iter().all(|t| t.task.status == TaskStatus::InProgress));
}

#[tokio::test]
async fn assign_by_recency_scope_is_rejected() {
    let db = board_with_tasks();
    db.insert_user("Jane Doe", "jane@example.com", None).unwrap();
    let response = r#"{"assigneeName":"Jane Doe","scope":"lastN","count":2}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let err = assistant.handle("assign the latest tasks to Jane", None).await;

    assert!(matches!(err, Err(AssistantError::Resolve(_))));
    assert!(db.list_tasks().unwrap().iter().all(|t| t.task.assignee_id.is_none()));
}

#[tokio::test]
async fn assign_with_no_matching_user_mutates_nothing() {
    let db = board_with_tasks();
    let response = r#"{"assigneeName":"Jane Doe","scope":"all"}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let err = assistant.handle("assign everything to Jane Doe", None).await;

    match err {
        Err(AssistantError::Resolve(msg)) => assert!(msg.contains("Jane Doe")),
        other => panic!("expected resolve error, got {:?}", other.map(|r| r.message)),
    }
    assert!(db.list_tasks().unwrap().iter().all(|t| t.task.assignee_id.is_none()));
}

#[tokio::test]
async fn delete_by_title_fragments_uses_all_matches() {
    let db = board_with_tasks();
    let response = r#"{"scope":"titles","titles":["login","release"]}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let reply = assistant
        .handle("delete the login and release tasks", None)
        .await
        .unwrap();

    assert!(reply.message.contains("Deleted 2"));
    let remaining = db.list_tasks().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].task.title, "Archive old sprints");
    assert_eq!(remaining[0].task.position, 0);
}

#[tokio::test]
async fn delete_last_n_takes_most_recent_tasks() {
    let db = board_with_tasks();
    let response = r#"{"scope":"lastN","count":2}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    assistant.handle("delete the last 2 tasks", None).await.unwrap();

    let remaining = db.list_tasks().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].task.title, "Fix login bug");
}

#[tokio::test]
async fn delete_with_unknown_column_mutates_nothing() {
    let db = board_with_tasks();
    let response = r#"{"scope":"column","column":"icebox"}"#;
    let assistant = Assistant::new(db.clone(), CannedProvider::new(response));

    let err = assistant.handle("delete everything in the icebox", None).await;

    assert!(matches!(err, Err(AssistantError::Resolve(_))));
    assert_eq!(db.list_tasks().unwrap().len(), 3);
}

#[tokio::test]
async fn provider_failure_aborts_the_whole_intent() {
    let db = board_with_tasks();
    let assistant = Assistant::new(db.clone(), Arc::new(FailingProvider));

    let err = assistant.handle("delete everything", None).await;

    assert!(matches!(err, Err(AssistantError::Provider(_))));
    assert_eq!(db.list_tasks().unwrap().len(), 3);
}

#[tokio::test]
async fn non_json_response_is_a_parse_error() {
    let db = board_with_tasks();
    let assistant = Assistant::new(
        db.clone(),
        CannedProvider::new("Sorry, I cannot help with that."),
    );

    let err = assistant.handle("delete everything", None).await;

    assert!(matches!(err, Err(AssistantError::Parse(_))));
    assert_eq!(db.list_tasks().unwrap().len(), 3);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let assistant = Assistant::new(db, CannedProvider::new("[]"));

    let err = assistant.handle("   ", None).await;

    assert!(matches!(err, Err(AssistantError::Resolve(_))));
}
