// src/server/mod.rs

//! HTTP surface: task submission, status polling, and generated-doc
//! readback over axum.

pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;
use handlers::{
    delete_task_handler, get_config_handler, get_docs_handler, get_summary_handler,
    health_handler, list_tasks_handler, start_analysis_handler, task_status_handler,
    update_config_handler,
};

/// Main router. Every handler reads shared state; the pipeline runs in
/// spawned tasks so submission never blocks on generation.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))

        // Task lifecycle
        .route("/analyze", post(start_analysis_handler))
        .route("/status", get(list_tasks_handler))
        .route("/status/{task_id}", get(task_status_handler))
        .route("/status/{task_id}", delete(delete_task_handler))

        // Generated documentation readback
        .route("/docs", get(get_docs_handler))
        .route("/summary", get(get_summary_handler))

        // Runtime configuration
        .route("/config", get(get_config_handler).put(update_config_handler))

        .with_state(app_state)
}
