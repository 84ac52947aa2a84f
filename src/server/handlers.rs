// src/server/handlers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigOverrides, ConfigUpdate};
use crate::state::AppState;
use crate::writer::artifact_root;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub project_path: String,
    pub model: Option<String>,
    pub overwrite: Option<bool>,
    pub docs_directory: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub task_id: Uuid,
    pub status: &'static str,
    pub message: String,
}

/// POST /analyze - allocate a task and spawn the pipeline. Returns the
/// task id immediately; progress is observable through /status.
pub async fn start_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let project_path = PathBuf::from(&request.project_path);
    if !project_path.is_dir() {
        warn!("Rejected analysis request for {}", request.project_path);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Not a directory: {}", request.project_path)
            })),
        )
            .into_response();
    }

    let overrides = ConfigOverrides {
        model: request.model,
        overwrite: request.overwrite,
        docs_directory: request.docs_directory,
    };

    let task_id = app_state.tasks.create(project_path, overrides).await;

    let pipeline = app_state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(task_id).await;
    });

    info!("Accepted analysis request, task {}", task_id);
    Json(AnalyzeResponse {
        task_id,
        status: "pending",
        message: "Documentation generation started".to_string(),
    })
    .into_response()
}

/// GET /status/{task_id} - point-in-time task snapshot.
pub async fn task_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> impl IntoResponse {
    match app_state.tasks.get(task_id).await {
        Some(task) => Json(task).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Task not found: {task_id}") })),
        )
            .into_response(),
    }
}

/// GET /status - every known task.
pub async fn list_tasks_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks = app_state.tasks.get_all().await;
    Json(json!({
        "count": tasks.len(),
        "tasks": tasks,
    }))
}

/// DELETE /status/{task_id} - remove a task record.
pub async fn delete_task_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> impl IntoResponse {
    if app_state.tasks.delete(task_id).await {
        Json(json!({ "message": format!("Task deleted: {task_id}") })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Task not found: {task_id}") })),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
pub struct ProjectQuery {
    pub project_path: String,
    /// Docs directory name, for projects generated with an override.
    pub docs_directory: Option<String>,
}

#[derive(Serialize)]
pub struct DocFileEntry {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
}

/// GET /docs?project_path= - list the generated documentation files for
/// a project, including the root-level README and SUMMARY.
pub async fn get_docs_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ProjectQuery>,
) -> impl IntoResponse {
    let project_path = PathBuf::from(&params.project_path);
    if !project_path.is_dir() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("Not a directory: {}", params.project_path)
            })),
        )
            .into_response();
    }

    let mut files = Vec::new();

    for name in ["README.md", "SUMMARY.md"] {
        push_doc_entry(&mut files, &project_path.join(name));
    }

    let docs_dir_name = match &params.docs_directory {
        Some(name) => name.clone(),
        None => app_state.config.read().await.docs_directory.clone(),
    };
    let docs_dir = artifact_root(&project_path, &docs_dir_name);
    if let Ok(entries) = std::fs::read_dir(&docs_dir) {
        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();
        for path in paths {
            push_doc_entry(&mut files, &path);
        }
    }

    Json(json!({
        "project_path": params.project_path,
        "count": files.len(),
        "files": files,
    }))
    .into_response()
}

fn push_doc_entry(files: &mut Vec<DocFileEntry>, path: &std::path::Path) {
    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.is_file() {
            files.push(DocFileEntry {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: path.to_string_lossy().to_string(),
                size_bytes: metadata.len(),
            });
        }
    }
}

/// GET /summary?project_path= - the first content line of SUMMARY.md,
/// skipping headings and blanks.
pub async fn get_summary_handler(
    Query(params): Query<ProjectQuery>,
) -> impl IntoResponse {
    let summary_path = PathBuf::from(&params.project_path).join("SUMMARY.md");

    let content = match std::fs::read_to_string(&summary_path) {
        Ok(content) => content,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": format!("No summary found for {}", params.project_path)
                })),
            )
                .into_response();
        }
    };

    let summary = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .unwrap_or("")
        .to_string();

    Json(json!({
        "project_path": params.project_path,
        "summary": summary,
    }))
    .into_response()
}

/// GET /health
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = app_state.config.read().await.ollama_model.clone();
    Json(json!({
        "status": "healthy",
        "service": "docsmith",
        "version": env!("CARGO_PKG_VERSION"),
        "model": model,
    }))
}

/// GET /config - the live configuration.
pub async fn get_config_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = app_state.config.read().await.clone();
    Json(json!({
        "config": config,
        "message": "Current configuration retrieved",
    }))
}

/// PUT /config - apply a partial update to the live configuration.
/// Omitted fields keep their values; bind address, sweep interval, and
/// log level are fixed at startup and ignored here.
pub async fn update_config_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    let mut config = app_state.config.write().await;
    config.apply_update(&update);
    info!("Runtime configuration updated");
    Json(json!({
        "config": config.clone(),
        "message": "Configuration updated successfully",
    }))
}
