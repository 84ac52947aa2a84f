// src/state.rs

//! Shared application state handed to every HTTP handler.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::DocsmithConfig;
use crate::llm::LlmProvider;
use crate::pipeline::DocumentationPipeline;
use crate::tasks::TaskManager;

pub struct AppState {
    /// Live configuration, shared with the pipeline. PUT /config updates
    /// it at runtime; each run snapshots it at claim time.
    pub config: Arc<RwLock<DocsmithConfig>>,
    pub tasks: Arc<TaskManager>,
    pub pipeline: Arc<DocumentationPipeline>,
}

/// Wire the registry and the pipeline together. No singletons: every
/// collaborator is constructed here and injected.
pub fn create_app_state(
    config: DocsmithConfig,
    provider: Arc<dyn LlmProvider>,
) -> Arc<AppState> {
    let config = Arc::new(RwLock::new(config));
    let tasks = Arc::new(TaskManager::new());
    let pipeline = Arc::new(DocumentationPipeline::new(
        config.clone(),
        tasks.clone(),
        provider,
    ));

    Arc::new(AppState { config, tasks, pipeline })
}
