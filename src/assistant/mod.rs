//! LLM-driven chat assistant.
//!
//! Turns free-text instructions into one of three structured intents
//! (generate, assign, delete), each backed by a fixed prompt template and
//! a typed JSON payload. A provider error, malformed payload, or failed
//! resolution aborts the whole intent; store mutations are only issued
//! once the intent is fully validated and resolved.

pub mod intent;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod resolve;

use crate::db::Database;
use crate::types::{NewTask, Task, TaskStatus, canonicalize_status};
use intent::{AssignPayload, DeletePayload, GeneratedTask, IntentKind, route_intent};
use parse::{AssistantParseError, extract_payload};
use provider::{CompletionProvider, ImageAttachment, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure anywhere along the intent pipeline. Surfaced to the end user
/// as a chat message; never accompanied by a partial board mutation.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] AssistantParseError),

    #[error("{0}")]
    Resolve(String),

    #[error("Task store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Outcome of a handled chat message.
#[derive(Debug)]
pub struct AssistantReply {
    /// Chat text shown to the user.
    pub message: String,
    /// Tasks created by a generate intent, if any.
    pub created: Vec<Task>,
    /// Whether the board changed and the client should re-fetch.
    pub board_changed: bool,
}

/// The assistant bridge: routes a message to an intent, runs the
/// provider, and replays the resolved intent as ordinary store calls.
#[derive(Clone)]
pub struct Assistant {
    db: Database,
    provider: Arc<dyn CompletionProvider>,
}

impl Assistant {
    pub fn new(db: Database, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { db, provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Handle one chat message end to end.
    pub async fn handle(
        &self,
        message: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AssistantReply, AssistantError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AssistantError::Resolve(
                "Please provide a non-empty request".to_string(),
            ));
        }

        let kind = route_intent(message);
        debug!(?kind, provider = self.provider.name(), "handling chat message");

        match kind {
            IntentKind::Generate => self.handle_generate(message, image).await,
            IntentKind::Assign => self.handle_assign(message, image).await,
            IntentKind::Delete => self.handle_delete(message, image).await,
        }
    }

    async fn complete(
        &self,
        instructions: &str,
        message: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, AssistantError> {
        let prompt = prompts::build_prompt(instructions, message);
        let text = self
            .provider
            .complete(prompts::SYSTEM_INSTRUCTIONS, &prompt, image)
            .await?;
        Ok(text)
    }

    async fn handle_generate(
        &self,
        message: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AssistantReply, AssistantError> {
        let text = self
            .complete(prompts::GENERATE_INSTRUCTIONS, message, image)
            .await?;
        let generated: Vec<GeneratedTask> = extract_payload(&text)?;

        if generated.is_empty() {
            return Err(AssistantError::Resolve(
                "The request did not yield any tasks".to_string(),
            ));
        }

        // Validate everything, including assignee names, before any insert.
        let mut inputs = Vec::with_capacity(generated.len());
        let mut assignees: Vec<Option<i64>> = Vec::with_capacity(generated.len());

        for task in &generated {
            if task.title.trim().is_empty() {
                return Err(AssistantParseError::Validation(
                    "A generated task has an empty title".to_string(),
                )
                .into());
            }
            if task.estimated_time <= 0 {
                return Err(AssistantParseError::Validation(format!(
                    "Task \"{}\" has an invalid estimatedTime",
                    task.title
                ))
                .into());
            }

            let status = match task.status.as_deref() {
                None => TaskStatus::Todo,
                Some(s) => canonicalize_status(s).ok_or_else(|| {
                    AssistantParseError::Validation(format!("Unknown status: \"{}\"", s))
                })?,
            };

            let assignee = match task.assignee_name.as_deref() {
                Some(name) => Some(resolve::resolve_assignee(&self.db, name)?.id),
                None => None,
            };
            assignees.push(assignee);

            inputs.push(NewTask {
                title: task.title.trim().to_string(),
                description: Some(task.description.clone()),
                priority: task.priority,
                estimated_time: Some(task.estimated_time),
                status,
            });
        }

        let created = self.db.create_tasks(&inputs)?;
        for (task, assignee) in created.iter().zip(&assignees) {
            if let Some(user_id) = assignee {
                self.db.assign_task(task.id, Some(*user_id))?;
            }
        }

        info!(count = created.len(), "assistant created tasks");

        let titles: Vec<String> =
            created.iter().map(|t| format!("- {}", t.title)).collect();
        Ok(AssistantReply {
            message: format!(
                "I've created {} task(s) based on your request:\n{}",
                created.len(),
                titles.join("\n")
            ),
            created,
            board_changed: true,
        })
    }

    async fn handle_assign(
        &self,
        message: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AssistantReply, AssistantError> {
        let text = self
            .complete(prompts::ASSIGN_INSTRUCTIONS, message, image)
            .await?;
        let payload: AssignPayload = extract_payload(&text)?;

        let user = resolve::resolve_assignee(&self.db, &payload.assignee_name)?;
        let selection = resolve::resolve_selection(payload.selection)?;

        // The assign prompt never asks for a recency scope; if the model
        // emits one anyway, fail rather than guess which tasks were meant.
        if matches!(selection, resolve::Selection::LastN(_)) {
            return Err(AssistantError::Resolve(
                "Assignment by recency is not supported; name the tasks or a column"
                    .to_string(),
            ));
        }

        let ids = resolve::select_task_ids(&self.db, &selection)?;

        for id in &ids {
            self.db.assign_task(*id, Some(user.id))?;
        }

        info!(count = ids.len(), user = %user.name, "assistant assigned tasks");

        Ok(AssistantReply {
            message: format!("Assigned {} task(s) to {}.", ids.len(), user.name),
            created: Vec::new(),
            board_changed: true,
        })
    }

    async fn handle_delete(
        &self,
        message: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AssistantReply, AssistantError> {
        let text = self
            .complete(prompts::DELETE_INSTRUCTIONS, message, image)
            .await?;
        let payload: DeletePayload = extract_payload(&text)?;

        let selection = resolve::resolve_selection(payload.selection)?;
        let ids = resolve::select_task_ids(&self.db, &selection)?;

        let deleted = self.db.delete_tasks(&ids)?;

        info!(count = deleted.len(), "assistant deleted tasks");

        Ok(AssistantReply {
            message: format!("Deleted {} task(s).", deleted.len()),
            created: Vec::new(),
            board_changed: true,
        })
    }
}
