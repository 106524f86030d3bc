//! HTTP server for the task API and the board page.

pub mod handlers;
pub mod templates;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assistant::Assistant;
use crate::db::Database;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The task store.
    pub db: Database,
    /// Chat assistant; `None` when no provider key is configured.
    pub assistant: Option<Assistant>,
}

impl AppState {
    pub fn new(db: Database, assistant: Option<Assistant>) -> Self {
        Self { db, assistant }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Board page
        .route("/", get(handlers::board_page))
        // Task API
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_tasks),
        )
        .route("/api/tasks/positions", put(handlers::reorder_positions))
        .route("/api/tasks/delete", post(handlers::delete_tasks_bulk))
        .route(
            "/api/tasks/{task_id}",
            put(handlers::update_content).delete(handlers::delete_task),
        )
        .route("/api/tasks/{task_id}/status", put(handlers::update_status))
        .route("/api/tasks/{task_id}/priority", put(handlers::update_priority))
        .route("/api/tasks/{task_id}/assign", put(handlers::assign_task))
        // Users
        .route("/api/users", get(handlers::list_users))
        // Assistant
        .route("/api/assistant", post(handlers::assistant_chat))
        .route("/api/assistant/status", get(handlers::assistant_status))
        // Health
        .route("/api/health", get(handlers::health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task board listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
