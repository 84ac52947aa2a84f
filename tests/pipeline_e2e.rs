// tests/pipeline_e2e.rs

//! End-to-end pipeline runs against a stubbed generation backend.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use docsmith::config::{ConfigOverrides, DocsmithConfig};
use docsmith::llm::{DocKind, GenerationContext, LlmProvider, TextGenerator};
use docsmith::pipeline::DocumentationPipeline;
use docsmith::state::create_app_state;
use docsmith::tasks::{TaskManager, TaskStatus};

/// Backend stub: deterministic text, optional per-kind failures, and a
/// call counter for asserting that no generation happens on early exits.
#[derive(Debug)]
struct StubGenerator {
    fail_kinds: HashSet<DocKind>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, kind: DocKind, context: &GenerationContext<'_>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_kinds.contains(&kind) {
            return Err(anyhow!("stubbed backend failure"));
        }
        // The summary echoes the overview it was given, so tests can see
        // that earlier stage output survived later failures
        if kind == DocKind::Summary {
            return Ok(format!(
                "Summary built from: {}",
                context.overview.unwrap_or("no overview")
            ));
        }
        Ok(format!(
            "# {} of {}\n\nGenerated {} text.\n",
            kind.label(),
            context.analysis.name,
            kind.label()
        ))
    }
}

struct StubProvider {
    fail_kinds: HashSet<DocKind>,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn new() -> Self {
        Self { fail_kinds: HashSet::new(), calls: Arc::new(AtomicUsize::new(0)) }
    }

    fn failing(kinds: impl IntoIterator<Item = DocKind>) -> Self {
        Self {
            fail_kinds: kinds.into_iter().collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    async fn connect(&self, _config: &DocsmithConfig) -> Result<Arc<dyn TextGenerator>> {
        Ok(Arc::new(StubGenerator {
            fail_kinds: self.fail_kinds.clone(),
            calls: self.calls.clone(),
        }))
    }
}

fn test_config() -> DocsmithConfig {
    let mut config = DocsmithConfig::from_env();
    config.overwrite_existing = false;
    config
}

fn pipeline_with(provider: StubProvider) -> (Arc<TaskManager>, DocumentationPipeline) {
    let tasks = Arc::new(TaskManager::new());
    let pipeline = DocumentationPipeline::new(
        Arc::new(RwLock::new(test_config())),
        tasks.clone(),
        Arc::new(provider),
    );
    (tasks, pipeline)
}

fn ten_line_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source: String = (1..=10).map(|n| format!("value_{n} = {n}\n")).collect();
    fs::write(dir.path().join("metrics.py"), source).unwrap();
    dir
}

#[tokio::test]
async fn test_successful_run_completes_with_result() {
    let dir = ten_line_project();
    let (tasks, pipeline) = pipeline_with(StubProvider::new());

    let id = tasks
        .create(dir.path().to_path_buf(), ConfigOverrides::default())
        .await;
    pipeline.run(id).await;

    let task = tasks.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.progress, 100);
    assert!(task.started_at.is_some());
    assert!(task.completed_at.is_some());
    assert!(task.error.is_none());

    let result = task.result.expect("completed task carries a result");
    assert_eq!(result.analysis.total_files, 1);
    assert_eq!(result.analysis.total_lines, 10);
    assert_eq!(result.analysis.languages, vec!["Python".to_string()]);
    assert!(result.analysis.frameworks.is_empty());
    assert!(result.written_files.contains_key("README.md"));

    assert!(dir.path().join("README.md").exists());
    assert!(dir.path().join("docs/INDEX.md").exists());
}

#[tokio::test]
async fn test_invalid_path_fails_without_generation() {
    let provider = StubProvider::new();
    let calls = provider.calls.clone();
    let (tasks, pipeline) = pipeline_with(provider);

    let missing = PathBuf::from("/nonexistent/docsmith-test-project");
    let id = tasks.create(missing.clone(), ConfigOverrides::default()).await;
    pipeline.run(id).await;

    let task = tasks.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.message.as_deref(), Some("Documentation generation failed"));
    assert!(task.result.is_none());
    assert!(task.completed_at.is_some());

    let error = task.error.expect("failed task carries an error");
    assert!(error.contains("/nonexistent/docsmith-test-project"));

    // The backend is never consulted when scanning fails
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_tasks_are_independent() {
    let good = ten_line_project();
    let (tasks, pipeline) = pipeline_with(StubProvider::new());
    let pipeline = Arc::new(pipeline);

    let good_id = tasks
        .create(good.path().to_path_buf(), ConfigOverrides::default())
        .await;
    let bad_id = tasks
        .create(PathBuf::from("/nonexistent/other"), ConfigOverrides::default())
        .await;

    let (p1, p2) = (pipeline.clone(), pipeline.clone());
    let (r1, r2) = tokio::join!(p1.run(good_id), p2.run(bad_id));
    let _ = (r1, r2);

    let good_task = tasks.get(good_id).await.unwrap();
    let bad_task = tasks.get(bad_id).await.unwrap();

    assert_eq!(good_task.status, TaskStatus::Completed);
    assert!(good_task.result.is_some());
    assert_eq!(bad_task.status, TaskStatus::Failed);
    assert!(bad_task.result.is_none());
}

#[tokio::test]
async fn test_duplicate_run_is_rejected() {
    let dir = ten_line_project();
    let provider = StubProvider::new();
    let calls = provider.calls.clone();
    let (tasks, pipeline) = pipeline_with(provider);

    let id = tasks
        .create(dir.path().to_path_buf(), ConfigOverrides::default())
        .await;
    pipeline.run(id).await;

    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > 0);
    let completed_at = tasks.get(id).await.unwrap().completed_at;

    // A second invocation against the same task is a no-op
    pipeline.run(id).await;
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert_eq!(tasks.get(id).await.unwrap().completed_at, completed_at);
}

#[tokio::test]
async fn test_racing_duplicate_runs_execute_once() {
    let dir = ten_line_project();
    let provider = StubProvider::new();
    let calls = provider.calls.clone();
    let (tasks, pipeline) = pipeline_with(provider);
    let pipeline = Arc::new(pipeline);

    let id = tasks
        .create(dir.path().to_path_buf(), ConfigOverrides::default())
        .await;

    // Two simultaneous invocations; the claim lets exactly one through
    let (p1, p2) = (pipeline.clone(), pipeline.clone());
    tokio::join!(p1.run(id), p2.run(id));
    let duplicate_total = calls.load(Ordering::SeqCst);

    assert_eq!(tasks.get(id).await.unwrap().status, TaskStatus::Completed);

    // A fresh task consumes the same number of backend calls as the pair
    // of racing invocations did together
    let other = ten_line_project();
    let id2 = tasks
        .create(other.path().to_path_buf(), ConfigOverrides::default())
        .await;
    pipeline.run(id2).await;
    assert_eq!(calls.load(Ordering::SeqCst) - duplicate_total, duplicate_total);
}

#[tokio::test]
async fn test_single_stage_failure_is_tolerated() {
    let dir = ten_line_project();
    let (tasks, pipeline) = pipeline_with(StubProvider::failing([DocKind::Readme]));

    let id = tasks
        .create(dir.path().to_path_buf(), ConfigOverrides::default())
        .await;
    pipeline.run(id).await;

    let task = tasks.get(id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    // The readme carries a failure marker; the overview produced before
    // the failure still feeds the summary stage
    let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains("Generation failed"));
    let summary = fs::read_to_string(dir.path().join("SUMMARY.md")).unwrap();
    assert!(summary.contains("Summary built from: # overview of"));
}

#[tokio::test]
async fn test_model_override_reaches_provider() {
    struct ModelCheckProvider {
        expected: String,
    }

    #[async_trait]
    impl LlmProvider for ModelCheckProvider {
        async fn connect(&self, config: &DocsmithConfig) -> Result<Arc<dyn TextGenerator>> {
            assert_eq!(config.ollama_model, self.expected);
            Ok(Arc::new(StubGenerator {
                fail_kinds: HashSet::new(),
                calls: Arc::new(AtomicUsize::new(0)),
            }))
        }
    }

    let dir = ten_line_project();
    let tasks = Arc::new(TaskManager::new());
    let pipeline = DocumentationPipeline::new(
        Arc::new(RwLock::new(test_config())),
        tasks.clone(),
        Arc::new(ModelCheckProvider { expected: "override-model".to_string() }),
    );

    let id = tasks
        .create(
            dir.path().to_path_buf(),
            ConfigOverrides { model: Some("override-model".to_string()), ..Default::default() },
        )
        .await;
    pipeline.run(id).await;

    assert_eq!(tasks.get(id).await.unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_state_helper_wires_pipeline_and_registry() {
    let dir = ten_line_project();
    let app_state = create_app_state(test_config(), Arc::new(StubProvider::new()));

    let id = app_state
        .tasks
        .create(dir.path().to_path_buf(), ConfigOverrides::default())
        .await;
    app_state.pipeline.run(id).await;

    assert_eq!(app_state.tasks.get(id).await.unwrap().status, TaskStatus::Completed);
}
