// src/tasks/mod.rs

//! Task registry and lifecycle management for async documentation runs.
//!
//! The registry is the single source of truth for task existence and state.
//! All mutations go through `TaskManager::update`, serialized behind one
//! lock, so pollers never observe a half-written task.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConfigOverrides;

/// Task execution status.
///
/// `pending -> running -> {completed, failed}`; the terminal states are
/// sticky - no update moves a task out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Condensed analysis facts attached to a successful result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub name: String,
    pub total_files: usize,
    pub total_lines: usize,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
}

/// Terminal payload of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub project_path: PathBuf,
    pub analysis: AnalysisSummary,
    /// Artifact name -> location on disk
    pub written_files: HashMap<String, String>,
    pub summary: Option<String>,
}

/// One documentation generation run, observable by pollers.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub task_id: Uuid,
    pub project_path: PathBuf,
    #[serde(skip_serializing_if = "ConfigOverrides::is_empty")]
    pub config_overrides: ConfigOverrides,
    pub status: TaskStatus,
    pub progress: u8,
    pub current_step: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub result: Option<TaskResult>,
}

impl Task {
    fn new(task_id: Uuid, project_path: PathBuf, config_overrides: ConfigOverrides) -> Self {
        Self {
            task_id,
            project_path,
            config_overrides,
            status: TaskStatus::Pending,
            progress: 0,
            current_step: None,
            message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            result: None,
        }
    }
}

/// Partial field update for a task. Omitted fields retain prior values.
#[derive(Debug, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub progress: Option<u8>,
    pub current_step: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result: Option<TaskResult>,
}

/// Manages the collection of documentation generation tasks.
pub struct TaskManager {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self { tasks: RwLock::new(HashMap::new()) }
    }

    /// Create a new pending task and return its id. Never blocks on
    /// generation - this is a pure in-memory allocation.
    pub async fn create(&self, project_path: PathBuf, overrides: ConfigOverrides) -> Uuid {
        let task_id = Uuid::new_v4();
        let task = Task::new(task_id, project_path.clone(), overrides);

        self.tasks.write().await.insert(task_id, task);
        info!("Created task {} for project: {}", task_id, project_path.display());
        task_id
    }

    /// Point-in-time snapshot of a single task. Absence is a normal outcome.
    pub async fn get(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&task_id).cloned()
    }

    /// Point-in-time copy of every task.
    pub async fn get_all(&self) -> HashMap<Uuid, Task> {
        self.tasks.read().await.clone()
    }

    /// Atomically claim a pending task for execution, transitioning it to
    /// running under the write lock. Returns the claimed snapshot, or
    /// `None` when the task is missing or was already claimed - at most
    /// one caller ever receives `Some` for a given task.
    pub async fn claim(&self, task_id: Uuid) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&task_id)?;
        if task.status != TaskStatus::Pending {
            warn!(
                "Task {} is {:?}, refusing to claim it again",
                task_id, task.status
            );
            return None;
        }

        task.status = TaskStatus::Running;
        task.started_at = Some(Utc::now());
        Some(task.clone())
    }

    /// Apply a partial update to a task.
    ///
    /// Updates for unknown ids are dropped with a diagnostic - the pipeline
    /// must not crash because its task was swept mid-run. Terminal statuses
    /// and their timestamps are write-once; late updates still apply the
    /// advisory fields (progress, step, message).
    pub async fn update(&self, task_id: Uuid, update: TaskUpdate) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&task_id) else {
            warn!("Task {} not found, dropping update", task_id);
            return;
        };

        if let Some(status) = update.status {
            if task.status.is_terminal() {
                if status != task.status {
                    warn!(
                        "Task {} is already {:?}, ignoring transition to {:?}",
                        task_id, task.status, status
                    );
                }
            } else {
                task.status = status;
                if status == TaskStatus::Running && task.started_at.is_none() {
                    task.started_at = Some(Utc::now());
                }
                if status.is_terminal() && task.completed_at.is_none() {
                    task.completed_at = Some(Utc::now());
                }
            }
        }

        if let Some(progress) = update.progress {
            // Advisory only; the orchestrator is responsible for sane values
            if progress < task.progress {
                warn!(
                    "Task {} progress regressed: {} -> {}",
                    task_id, task.progress, progress
                );
            }
            task.progress = progress.min(100);
        }
        if let Some(step) = update.current_step {
            task.current_step = Some(step);
        }
        if let Some(message) = update.message {
            task.message = Some(message);
        }
        if let Some(error) = update.error {
            if task.result.is_some() {
                warn!("Task {} already has a result, refusing to set error", task_id);
            } else {
                task.error = Some(error);
            }
        }
        if let Some(result) = update.result {
            if task.error.is_some() {
                warn!("Task {} already has an error, refusing to set result", task_id);
            } else {
                task.result = Some(result);
            }
        }

        debug!(
            "Task {} updated: {:?} - {}",
            task_id,
            task.status,
            task.message.as_deref().unwrap_or("")
        );
    }

    /// Remove a task. Returns whether it existed.
    pub async fn delete(&self, task_id: Uuid) -> bool {
        let existed = self.tasks.write().await.remove(&task_id).is_some();
        if existed {
            info!("Deleted task {}", task_id);
        }
        existed
    }

    /// Remove every task older than `max_age`, regardless of status.
    /// Callers are responsible for choosing a safe cadence and age.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::hours(24));

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| task.created_at > cutoff);
        let removed = before - tasks.len();

        if removed > 0 {
            info!("Cleaned up {} old tasks", removed);
        }
        removed
    }

    /// Spawn the periodic sweep loop.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        max_age: Duration,
    ) -> JoinHandle<()> {
        let manager = self.clone();

        tokio::spawn(async move {
            info!(
                "Task sweeper started (interval: {:?}, max age: {:?})",
                interval, max_age
            );

            let mut interval_timer = time::interval(interval);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;
                manager.sweep(max_age).await;
            }
        })
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
