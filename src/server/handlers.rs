//! Task API handlers.
//!
//! Thin transactional wrappers over the store: validate input, call the
//! corresponding store operation, and wrap the result in the uniform
//! `{success, ...}` envelope. Store rows that are missing map to 404,
//! unexpected store failures to 500 via [`ApiError`].

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Html;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::templates;
use crate::assistant::provider::ImageAttachment;
use crate::error::{ApiError, ApiResult};
use crate::types::{NewTask, Task, TaskWithAssignee, User, canonicalize_status};

/// Board page.
pub async fn board_page() -> Html<&'static str> {
    Html(templates::BOARD_TEMPLATE)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct TasksResponse {
    success: bool,
    tasks: Vec<TaskWithAssignee>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    success: bool,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
pub struct TaskResponse {
    success: bool,
    task: Task,
}

#[derive(Serialize)]
pub struct OkResponse {
    success: bool,
}

/// GET /api/tasks — all tasks joined with assignee info.
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<TasksResponse>> {
    let tasks = state.db.list_tasks()?;
    Ok(Json(TasksResponse {
        success: true,
        tasks,
    }))
}

/// Create accepts a single task or an array of tasks.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CreateBody {
    One(NewTask),
    Many(Vec<NewTask>),
}

/// POST /api/tasks — create one or many, appended to their columns.
pub async fn create_tasks(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Json<CreatedResponse>> {
    let inputs = match body {
        CreateBody::One(task) => vec![task],
        CreateBody::Many(tasks) => tasks,
    };

    if inputs.is_empty() {
        return Err(ApiError::missing_field("tasks"));
    }
    for input in &inputs {
        if input.title.trim().is_empty() {
            return Err(ApiError::missing_field("title"));
        }
    }

    let tasks = state.db.create_tasks(&inputs)?;
    Ok(Json(CreatedResponse {
        success: true,
        tasks,
    }))
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub position: Option<i64>,
}

/// PUT /api/tasks/{id}/status — move a task, optionally to an exact slot.
pub async fn update_status(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<TaskResponse>> {
    let status = canonicalize_status(&body.status)
        .ok_or_else(|| ApiError::invalid_value("status", format!("Unknown status: {}", body.status)))?;

    if body.position.is_some_and(|p| p < 0) {
        return Err(ApiError::invalid_value("position", "position must be non-negative"));
    }

    let task = state
        .db
        .move_task(task_id, status, body.position)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

#[derive(Deserialize)]
pub struct PriorityBody {
    pub priority: String,
}

/// PUT /api/tasks/{id}/priority
pub async fn update_priority(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<PriorityBody>,
) -> ApiResult<Json<TaskResponse>> {
    let priority = crate::types::Priority::parse(&body.priority)
        .ok_or_else(|| ApiError::invalid_value("priority", "Invalid priority value"))?;

    let task = state
        .db
        .update_priority(task_id, priority)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    /// `null` unassigns.
    pub assignee_id: Option<i64>,
}

/// PUT /api/tasks/{id}/assign
pub async fn assign_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<AssignBody>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .db
        .assign_task(task_id, body.assignee_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

#[derive(Deserialize)]
pub struct ContentBody {
    pub title: String,
    pub description: Option<String>,
}

/// PUT /api/tasks/{id} — title and description.
pub async fn update_content(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<ContentBody>,
) -> ApiResult<Json<TaskResponse>> {
    if body.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }

    let task = state
        .db
        .update_content(task_id, body.title.trim(), body.description.as_deref())?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

#[derive(Deserialize)]
pub struct PositionEntry {
    pub id: i64,
    pub position: i64,
}

#[derive(Deserialize)]
pub struct PositionsBody {
    pub status: String,
    pub positions: Vec<PositionEntry>,
}

/// PUT /api/tasks/positions — bulk reorder after a client-side drag.
pub async fn reorder_positions(
    State(state): State<AppState>,
    Json(body): Json<PositionsBody>,
) -> ApiResult<Json<OkResponse>> {
    let status = canonicalize_status(&body.status)
        .ok_or_else(|| ApiError::invalid_value("status", format!("Unknown status: {}", body.status)))?;

    if body.positions.is_empty() {
        return Err(ApiError::missing_field("positions"));
    }

    let pairs: Vec<(i64, i64)> = body.positions.iter().map(|p| (p.id, p.position)).collect();
    state.db.reorder_column(status, &pairs)?;
    Ok(Json(OkResponse { success: true }))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .db
        .delete_task(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteBody {
    pub task_ids: Vec<i64>,
}

#[derive(Serialize)]
pub struct BulkDeleteResponse {
    success: bool,
    tasks: Vec<Task>,
}

/// POST /api/tasks/delete — bulk delete.
pub async fn delete_tasks_bulk(
    State(state): State<AppState>,
    Json(body): Json<BulkDeleteBody>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    if body.task_ids.is_empty() {
        return Err(ApiError::invalid_value("taskIds", "Invalid task IDs provided"));
    }

    let tasks = state.db.delete_tasks(&body.task_ids)?;
    Ok(Json(BulkDeleteResponse {
        success: true,
        tasks,
    }))
}

#[derive(Serialize)]
pub struct UsersResponse {
    success: bool,
    users: Vec<User>,
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = state.db.list_users()?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBody {
    pub media_type: String,
    pub data_base64: String,
}

#[derive(Deserialize)]
pub struct ChatBody {
    pub message: String,
    pub image: Option<ImageBody>,
}

/// Assistant replies are always HTTP 200; failures are chat-level and
/// carry `success: false` with the error text for the message stream.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    success: bool,
    reply: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tasks: Vec<Task>,
    board_changed: bool,
}

/// POST /api/assistant — one chat turn.
pub async fn assistant_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Json<ChatResponse> {
    let Some(assistant) = &state.assistant else {
        return Json(ChatResponse {
            success: false,
            reply: "No AI provider configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY."
                .to_string(),
            tasks: Vec::new(),
            board_changed: false,
        });
    };

    let image = match body.image {
        None => None,
        Some(img) => {
            // Reject bad attachments before spending a provider call.
            if BASE64.decode(&img.data_base64).is_err() {
                return Json(ChatResponse {
                    success: false,
                    reply: "Error: attached image is not valid base64".to_string(),
                    tasks: Vec::new(),
                    board_changed: false,
                });
            }
            Some(ImageAttachment {
                media_type: img.media_type,
                data_base64: img.data_base64,
            })
        }
    };

    match assistant.handle(&body.message, image.as_ref()).await {
        Ok(reply) => Json(ChatResponse {
            success: true,
            reply: reply.message,
            tasks: reply.created,
            board_changed: reply.board_changed,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "assistant intent failed");
            Json(ChatResponse {
                success: false,
                reply: format!("Error: {}", err),
                tasks: Vec::new(),
                board_changed: false,
            })
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantStatusResponse {
    success: bool,
    configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'static str>,
}

/// GET /api/assistant/status — provider presence probe for the UI.
pub async fn assistant_status(State(state): State<AppState>) -> Json<AssistantStatusResponse> {
    Json(AssistantStatusResponse {
        success: true,
        configured: state.assistant.is_some(),
        provider: state.assistant.as_ref().map(|a| a.provider_name()),
    })
}
